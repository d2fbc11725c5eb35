//! Data model for picking a path and deciding how to open it.

pub mod classifier;
pub mod dispatcher;
pub mod enumerator;
pub mod handlers;

pub use classifier::{classify, BuiltinSniffer, FileCommandSniffer, MimeSniffer};
pub use dispatcher::{Dispatcher, Launcher, ProcessLauncher};
pub use enumerator::{Backend, Enumerator, VCS_DIRS};
pub use handlers::HandlerTable;

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

/// MIME types outside `text/*` that are still opened in an editor
pub const TEXT_MIME_TYPES: &[&str] = &[
    "application/json",
    "application/xml",
    "application/javascript",
    "application/x-yaml",
    "application/x-shellscript",
    "inode/x-empty",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    File,
    Directory,
}

/// A filesystem entry offered for selection, relative to the working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub kind: CandidateKind,
}

impl Candidate {
    pub fn new(path: impl Into<PathBuf>, kind: CandidateKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == CandidateKind::Directory
    }
}

/// Semantic category of a selected path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Directory,
    TextLike,
    Image,
    Pdf,
    Other,
}

impl Classification {
    /// Maps a sniffed MIME type onto a file classification
    pub fn from_mime(mime: &str) -> Self {
        let mime = mime.trim().to_ascii_lowercase();

        if mime.starts_with("text/") || TEXT_MIME_TYPES.contains(&mime.as_str()) {
            Classification::TextLike
        } else if mime.starts_with("image/") {
            Classification::Image
        } else if mime == "application/pdf" {
            Classification::Pdf
        } else {
            Classification::Other
        }
    }

    /// Whether the user picks among several handlers for this class
    pub fn has_choices(self) -> bool {
        matches!(self, Classification::Directory | Classification::TextLike)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Classification::Directory => "directory",
            Classification::TextLike => "text",
            Classification::Image => "image",
            Classification::Pdf => "pdf",
            Classification::Other => "other",
        };
        write!(f, "{}", s)
    }
}

/// How a handler process relates to this one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Wait for the handler and propagate its exit status
    Foreground,
    /// Start in a new session and return immediately
    BackgroundDetached,
    /// Spawn nothing; hand the directory to the parent shell
    ChangeDirectory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub command: String,
    pub args: Vec<String>,
    pub mode: LaunchMode,
}

impl LaunchSpec {
    pub fn foreground(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            mode: LaunchMode::Foreground,
        }
    }

    pub fn detached(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            mode: LaunchMode::BackgroundDetached,
        }
    }

    pub fn change_directory() -> Self {
        Self {
            command: "cd".to_string(),
            args: Vec::new(),
            mode: LaunchMode::ChangeDirectory,
        }
    }

    /// Arguments passed to the command, with the target path last
    pub fn argv(&self, path: &Path) -> Vec<OsString> {
        let mut argv: Vec<OsString> = self.args.iter().map(OsString::from).collect();
        argv.push(path.as_os_str().to_os_string());
        argv
    }
}

/// One entry of a classification's handler list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerOption {
    pub id: String,
    pub label: String,
    pub launch: LaunchSpec,
}

impl HandlerOption {
    pub fn new(id: impl Into<String>, label: impl Into<String>, launch: LaunchSpec) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            launch,
        }
    }
}

/// What a completed interaction did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchResult {
    /// A foreground handler ran to completion
    Completed { handler: String, code: i32 },
    /// A detached handler was started
    Detached { handler: String },
    /// The parent shell should change into this directory
    ChangeDirectory(PathBuf),
    Cancelled,
}

impl DispatchResult {
    pub fn exit_code(&self) -> i32 {
        match self {
            DispatchResult::Completed { code, .. } => *code,
            _ => 0,
        }
    }
}

/// Session-scoped hidden-files setting, reset from the startup flag on every run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HiddenMode {
    startup: bool,
    current: bool,
}

impl HiddenMode {
    pub fn new(startup: bool) -> Self {
        Self {
            startup,
            current: startup,
        }
    }

    pub fn is_on(&self) -> bool {
        self.current
    }

    pub fn startup(&self) -> bool {
        self.startup
    }

    pub fn set(&mut self, on: bool) {
        self.current = on;
    }

    pub fn toggle(&mut self) {
        self.current = !self.current;
    }

    /// State label shown by the selector for the given mode
    pub fn label_for(on: bool) -> &'static str {
        if on {
            "Hidden: ON"
        } else {
            "Hidden: OFF"
        }
    }

    pub fn label(&self) -> &'static str {
        Self::label_for(self.current)
    }
}

/// Where a single interaction currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Selecting,
    Classified,
    Resolving,
    Launched,
    Cancelled,
}
