//! Content-type classification of a selected path.
//!
//! Classification is a pure function of what is on disk: directories are
//! `Directory`, everything else is sniffed from its leading bytes and mapped
//! through [`Classification::from_mime`]. Sniff failures become `Other`.

use super::Classification;
use crate::error::{FopenError, Result};
use infer::Infer;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Bytes inspected when sniffing content
const SNIFF_LEN: u64 = 8192;

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Determines a MIME type from a file's content
pub trait MimeSniffer {
    fn sniff(&self, path: &Path) -> io::Result<String>;
}

/// In-process sniffer: magic numbers via `infer`, then a text heuristic
pub struct BuiltinSniffer {
    infer: Infer,
}

impl Default for BuiltinSniffer {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinSniffer {
    pub fn new() -> Self {
        Self {
            infer: Infer::new(),
        }
    }

    /// MIME type for an in-memory head of file content
    pub fn sniff_bytes(&self, head: &[u8]) -> String {
        if head.is_empty() {
            return "inode/x-empty".to_string();
        }
        if let Some(kind) = self.infer.get(head) {
            return kind.mime_type().to_string();
        }
        if looks_like_text(head) {
            "text/plain".to_string()
        } else {
            OCTET_STREAM.to_string()
        }
    }
}

impl MimeSniffer for BuiltinSniffer {
    fn sniff(&self, path: &Path) -> io::Result<String> {
        let mut head = Vec::new();
        File::open(path)?.take(SNIFF_LEN).read_to_end(&mut head)?;
        Ok(self.sniff_bytes(&head))
    }
}

/// Sniffer backed by `file --brief --mime-type`
#[derive(Debug, Clone)]
pub struct FileCommandSniffer {
    program: String,
}

impl FileCommandSniffer {
    /// Fails when the `file` utility is not installed
    pub fn locate() -> Result<Self> {
        which::which("file").map_err(|_| FopenError::MissingRequiredTool {
            tool: "file".to_string(),
        })?;
        Ok(Self {
            program: "file".to_string(),
        })
    }
}

impl MimeSniffer for FileCommandSniffer {
    fn sniff(&self, path: &Path) -> io::Result<String> {
        let output = Command::new(&self.program)
            .args(["--brief", "--mime-type", "--"])
            .arg(path)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()?;

        if !output.status.success() {
            return Err(io::Error::other(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Valid UTF-8 (allowing a code point cut at the end) with no NUL bytes
fn looks_like_text(head: &[u8]) -> bool {
    if head.contains(&0) {
        return false;
    }
    match std::str::from_utf8(head) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none() && head.len() as u64 >= SNIFF_LEN,
    }
}

/// Classifies a path. Never fails: unreadable or unsniffable files are `Other`.
pub fn classify(path: &Path, sniffer: &dyn MimeSniffer) -> Classification {
    if path.is_dir() {
        return Classification::Directory;
    }

    match sniffer.sniff(path) {
        Ok(mime) => {
            let class = Classification::from_mime(&mime);
            debug!("classified {} as {} ({})", path.display(), class, mime);
            class
        }
        Err(e) => {
            debug!("could not sniff {}: {}", path.display(), e);
            Classification::Other
        }
    }
}
