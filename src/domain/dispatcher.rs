//! Turns a classified selection into exactly one launch (or none)

use super::{Classification, DispatchResult, HandlerOption, HandlerTable, LaunchMode, LaunchSpec};
use crate::error::{FopenError, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use tracing::debug;

/// Starts handler processes
pub trait Launcher {
    /// Whether `command` can be found
    fn is_available(&self, command: &str) -> bool;

    /// Runs the handler and waits for it, returning its exit code
    fn run_foreground(&self, spec: &LaunchSpec, path: &Path) -> Result<i32>;

    /// Starts the handler in its own session and returns once it is spawned
    fn spawn_detached(&self, spec: &LaunchSpec, path: &Path) -> Result<()>;
}

/// Launches real processes with `std::process::Command`
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessLauncher;

impl Launcher for ProcessLauncher {
    fn is_available(&self, command: &str) -> bool {
        which::which(command).is_ok()
    }

    fn run_foreground(&self, spec: &LaunchSpec, path: &Path) -> Result<i32> {
        let status = Command::new(&spec.command)
            .args(spec.argv(path))
            .status()
            .map_err(|e| FopenError::from_spawn(&spec.command, e))?;
        Ok(exit_code(status))
    }

    fn spawn_detached(&self, spec: &LaunchSpec, path: &Path) -> Result<()> {
        let mut command = Command::new(&spec.command);
        command
            .args(spec.argv(path))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        new_session(&mut command);

        // Not waited on: the handler outlives this process.
        command
            .spawn()
            .map_err(|e| FopenError::from_spawn(&spec.command, e))?;
        Ok(())
    }
}

#[cfg(unix)]
fn new_session(command: &mut Command) {
    use std::os::unix::process::CommandExt;

    // SAFETY: setsid is async-signal-safe and touches no parent state.
    unsafe {
        command.pre_exec(|| {
            nix::unistd::setsid()
                .map(|_| ())
                .map_err(std::io::Error::from)
        });
    }
}

#[cfg(not(unix))]
fn new_session(_command: &mut Command) {}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

/// Keeps a relative path starting with `-` from being read as an option
pub fn safe_target(path: &Path) -> PathBuf {
    if path.is_relative() && path.to_string_lossy().starts_with('-') {
        Path::new(".").join(path)
    } else {
        path.to_path_buf()
    }
}

pub struct Dispatcher<L: Launcher = ProcessLauncher> {
    table: HandlerTable,
    launcher: L,
}

impl<L: Launcher> Dispatcher<L> {
    pub fn new(table: HandlerTable, launcher: L) -> Self {
        Self { table, launcher }
    }

    pub fn table(&self) -> &HandlerTable {
        &self.table
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Handlers for `class` whose program is installed; `cd` always is
    pub fn available_options(&self, class: Classification) -> Vec<HandlerOption> {
        self.table
            .options(class)
            .iter()
            .filter(|option| {
                option.launch.mode == LaunchMode::ChangeDirectory
                    || self.launcher.is_available(&option.launch.command)
            })
            .cloned()
            .collect()
    }

    /// Picks the handler for `class` and runs it on `path`.
    ///
    /// `resolve` is consulted only for classes with several handlers; a
    /// `None` from it cancels the interaction without launching anything.
    pub fn dispatch<F>(&self, path: &Path, class: Classification, resolve: F) -> Result<DispatchResult>
    where
        F: FnOnce(&[HandlerOption]) -> Option<HandlerOption>,
    {
        let handler = if class.has_choices() {
            let options = self.available_options(class);
            if options.is_empty() {
                debug!("no {} handler installed, using the default opener", class);
                self.fallback(class)?
            } else {
                match resolve(&options) {
                    Some(handler) => handler,
                    None => {
                        debug!("handler choice cancelled");
                        return Ok(DispatchResult::Cancelled);
                    }
                }
            }
        } else {
            match self.table.options(class).first() {
                Some(handler)
                    if class == Classification::Other
                        || self.launcher.is_available(&handler.launch.command) =>
                {
                    handler.clone()
                }
                Some(handler) => {
                    debug!(
                        "{} not installed, using the default opener",
                        handler.launch.command
                    );
                    self.fallback(class)?
                }
                None => self.fallback(class)?,
            }
        };

        self.execute(&handler, path)
    }

    /// Runs one handler according to its launch mode
    pub fn execute(&self, handler: &HandlerOption, path: &Path) -> Result<DispatchResult> {
        let spec = &handler.launch;
        debug!(
            "launching {} {:?} on {} ({:?})",
            spec.command,
            spec.args,
            path.display(),
            spec.mode
        );

        match spec.mode {
            // A bare `-` would be read by `cd` as the previous directory
            LaunchMode::ChangeDirectory => Ok(DispatchResult::ChangeDirectory(safe_target(path))),
            LaunchMode::Foreground => {
                let code = self.launcher.run_foreground(spec, &safe_target(path))?;
                Ok(DispatchResult::Completed {
                    handler: handler.id.clone(),
                    code,
                })
            }
            LaunchMode::BackgroundDetached => {
                self.launcher.spawn_detached(spec, &safe_target(path))?;
                Ok(DispatchResult::Detached {
                    handler: handler.id.clone(),
                })
            }
        }
    }

    fn fallback(&self, class: Classification) -> Result<HandlerOption> {
        self.table
            .fallback()
            .cloned()
            .ok_or_else(|| FopenError::MissingOptionalTool {
                tool: format!("{} handler", class),
            })
    }
}
