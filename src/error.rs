//! Error types shared across the crate

use std::io;
use thiserror::Error;

/// Failures that end a run with a non-zero exit.
///
/// Cancellation is not represented here: selectors and prompts return
/// `None`, and the dispatcher reports `DispatchResult::Cancelled`.
#[derive(Debug, Error)]
pub enum FopenError {
    /// fzf or the `file` sniffer was required but is not on PATH
    #[error("{tool} is required but not found in PATH")]
    MissingRequiredTool { tool: String },

    /// A handler binary is not installed
    #[error("{tool}: command not found")]
    MissingOptionalTool { tool: String },

    #[error("failed to launch {command}: {source}")]
    Launch {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("selector error: {0}")]
    Selector(String),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl FopenError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            FopenError::MissingRequiredTool { .. } => 2,
            FopenError::MissingOptionalTool { .. } => 127,
            FopenError::Selector(_) => 2,
            FopenError::Launch { .. } | FopenError::ConfigError(_) | FopenError::Io(_) => 1,
        }
    }

    /// Maps a spawn error, turning `NotFound` into a missing-tool report
    pub fn from_spawn(command: &str, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            FopenError::MissingOptionalTool {
                tool: command.to_string(),
            }
        } else {
            FopenError::Launch {
                command: command.to_string(),
                source,
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, FopenError>;
