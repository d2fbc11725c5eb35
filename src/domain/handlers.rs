//! Classification → ordered handler list
//!
//! The list order is both priority and display order. Directory and text
//! classes carry several entries and are resolved by the user; image, pdf
//! and other carry exactly one.

use super::{Classification, HandlerOption, LaunchSpec};
use crate::config::{AppEntry, UserConfig};
use std::collections::HashMap;

/// Identifier of the change-directory handler
pub const CD_HANDLER: &str = "cd";

#[derive(Debug, Clone)]
pub struct HandlerTable {
    entries: HashMap<Classification, Vec<HandlerOption>>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Replaces the handler list for a classification
    pub fn set(&mut self, class: Classification, options: Vec<HandlerOption>) -> &mut Self {
        self.entries.insert(class, options);
        self
    }

    pub fn from_config(config: &UserConfig) -> Self {
        let mut directory = vec![HandlerOption::new(
            CD_HANDLER,
            "Open in terminal",
            LaunchSpec::change_directory(),
        )];
        directory.extend(config.file_managers.iter().map(directory_handler));
        directory.extend(config.text_editors.iter().map(directory_handler));

        let text = config.text_editors.iter().map(file_handler).collect();

        let mut table = Self::new();
        table
            .set(Classification::Directory, directory)
            .set(Classification::TextLike, text)
            .set(
                Classification::Image,
                vec![single_viewer(&config.image_viewer, "Image viewer", true)],
            )
            .set(
                Classification::Pdf,
                vec![single_viewer(&config.pdf_viewer, "PDF viewer", true)],
            )
            .set(
                Classification::Other,
                vec![single_viewer(&config.opener, "Default application", false)],
            );
        table
    }

    /// Handlers for a classification, in priority order
    pub fn options(&self, class: Classification) -> &[HandlerOption] {
        self.entries.get(&class).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The generic handler used when nothing more specific applies
    pub fn fallback(&self) -> Option<&HandlerOption> {
        self.options(Classification::Other).first()
    }
}

impl Default for HandlerTable {
    fn default() -> Self {
        Self::from_config(&UserConfig::default())
    }
}

fn launch_for(app: &AppEntry, args: Vec<String>) -> LaunchSpec {
    if app.terminal {
        LaunchSpec::foreground(app.command.clone(), args)
    } else {
        LaunchSpec::detached(app.command.clone(), args)
    }
}

/// Files are passed after `--` so names starting with `-` are not options
fn file_handler(app: &AppEntry) -> HandlerOption {
    let mut args = app.args.clone();
    args.push("--".to_string());
    HandlerOption::new(app.command.clone(), app.label.clone(), launch_for(app, args))
}

fn directory_handler(app: &AppEntry) -> HandlerOption {
    HandlerOption::new(
        app.command.clone(),
        app.label.clone(),
        launch_for(app, app.args.clone()),
    )
}

fn single_viewer(command_line: &str, label: &str, end_of_options: bool) -> HandlerOption {
    let mut parts = command_line.split_whitespace();
    let command = parts.next().unwrap_or_default().to_string();
    let mut args: Vec<String> = parts.map(str::to_string).collect();
    if end_of_options {
        args.push("--".to_string());
    }
    HandlerOption::new(command.clone(), label, LaunchSpec::detached(command, args))
}
