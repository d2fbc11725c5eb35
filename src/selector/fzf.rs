//! fzf-backed selection
//!
//! Candidates are streamed to fzf NUL-delimited while it is already running,
//! so a large tree is searchable before enumeration finishes. The hidden-file
//! bindings reload the list by running this binary in `--list` mode.

use super::Selector;
use crate::domain::enumerator::{path_from_bytes, write_nul_delimited};
use crate::domain::{Enumerator, HandlerOption, HiddenMode};
use crate::error::{FopenError, Result};
use crate::shell::quote;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

pub const FZF: &str = "fzf";

/// fzf exit status when nothing matched
const NO_MATCH: i32 = 1;
/// fzf exit status when interrupted with ctrl-c or esc
const INTERRUPTED: i32 = 130;

/// Key that turns hidden files on, reloading the list
pub const KEY_HIDDEN_ON: &str = "alt-h";
/// Key that turns hidden files off, reloading the list
pub const KEY_HIDDEN_OFF: &str = "alt-H";

pub fn is_installed() -> bool {
    which::which(FZF).is_ok()
}

#[derive(Debug, Clone)]
pub struct FzfOptions {
    pub height: String,
    pub preview: bool,
    /// Program run by the reload and preview bindings
    pub exe: PathBuf,
}

impl Default for FzfOptions {
    fn default() -> Self {
        Self {
            height: "90%".to_string(),
            preview: true,
            exe: PathBuf::from(env!("CARGO_PKG_NAME")),
        }
    }
}

/// Header shown above the list for a hidden-mode state
pub fn header(on: bool) -> String {
    format!(
        "{}   ({} on / {} off)",
        HiddenMode::label_for(on),
        KEY_HIDDEN_ON,
        KEY_HIDDEN_OFF
    )
}

pub struct FzfSelector {
    program: PathBuf,
    options: FzfOptions,
}

impl FzfSelector {
    /// Finds fzf in PATH; its absence is fatal for this selector
    pub fn locate(options: FzfOptions) -> Result<Self> {
        let program = which::which(FZF).map_err(|_| FopenError::MissingRequiredTool {
            tool: FZF.to_string(),
        })?;
        Ok(Self { program, options })
    }

    /// fzf command line for a session starting in `hidden` mode
    pub fn build_args(&self, hidden: bool) -> Vec<String> {
        let exe = quote(&self.options.exe.to_string_lossy());

        let mut args = vec![
            "--read0".to_string(),
            "--print0".to_string(),
            format!("--height={}", self.options.height),
            "--border".to_string(),
            format!("--header={}", header(hidden)),
        ];

        if self.options.preview {
            args.push(format!("--preview={} --preview {{}}", exe));
        }

        args.push("--bind".to_string());
        args.push(format!(
            "{}:reload({} --list --hidden)+change-header[{}]",
            KEY_HIDDEN_ON,
            exe,
            header(true)
        ));
        args.push("--bind".to_string());
        args.push(format!(
            "{}:reload({} --list)+change-header[{}]",
            KEY_HIDDEN_OFF,
            exe,
            header(false)
        ));
        args
    }
}

impl Selector for FzfSelector {
    fn select(
        &mut self,
        enumerator: &Enumerator,
        hidden: &mut HiddenMode,
    ) -> Result<Option<PathBuf>> {
        let args = self.build_args(hidden.is_on());
        debug!("running {} {:?}", self.program.display(), args);

        let mut child = Command::new(&self.program)
            .args(&args)
            .current_dir(enumerator.root())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| FopenError::from_spawn(FZF, e))?;

        if let Some(stdin) = child.stdin.take() {
            let mut writer = BufWriter::new(stdin);
            let paths = enumerator.enumerate(hidden.is_on()).map(|c| c.path);
            if let Err(e) = write_nul_delimited(&mut writer, paths) {
                // fzf closes its input once the user accepts or aborts
                if e.kind() != io::ErrorKind::BrokenPipe {
                    debug!("stopped feeding fzf: {}", e);
                }
            }
        }

        let output = child.wait_with_output()?;
        match output.status.code() {
            Some(0) => Ok(parse_selection(output.stdout)),
            Some(NO_MATCH) | Some(INTERRUPTED) => Ok(None),
            Some(code) => Err(FopenError::Selector(format!("fzf exited with status {}", code))),
            None => Err(FopenError::Selector("fzf was terminated by a signal".to_string())),
        }
    }
}

/// First NUL-terminated entry of fzf's output
fn parse_selection(mut stdout: Vec<u8>) -> Option<PathBuf> {
    if let Some(end) = stdout.iter().position(|&b| b == 0) {
        stdout.truncate(end);
    }
    if stdout.is_empty() {
        None
    } else {
        Some(path_from_bytes(stdout))
    }
}

/// Shows `options` in a compact fzf menu and returns the chosen index
pub fn choose_option(options: &[HandlerOption]) -> Result<Option<usize>> {
    let mut child = Command::new(FZF)
        .args(["--prompt=Open with: ", "--height=40%", "--reverse"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .map_err(|e| FopenError::from_spawn(FZF, e))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(menu_lines(options).as_bytes())?;
    }

    let output = child.wait_with_output()?;
    match output.status.code() {
        Some(0) => Ok(parse_menu_choice(
            &String::from_utf8_lossy(&output.stdout),
            options.len(),
        )),
        Some(NO_MATCH) | Some(INTERRUPTED) => Ok(None),
        _ => Err(FopenError::Selector(format!(
            "fzf handler menu failed: {}",
            output.status
        ))),
    }
}

fn menu_lines(options: &[HandlerOption]) -> String {
    options
        .iter()
        .enumerate()
        .map(|(i, option)| format!("{}) {}\n", i + 1, option.label))
        .collect()
}

fn parse_menu_choice(line: &str, len: usize) -> Option<usize> {
    let (number, _) = line.trim().split_once(')')?;
    match number.parse::<usize>() {
        Ok(n) if (1..=len).contains(&n) => Some(n - 1),
        _ => None,
    }
}
