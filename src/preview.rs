// Preview pane content for the selector, produced by `fopen --preview <path>`

use crate::domain::{classify, Classification, MimeSniffer};
use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

pub const MAX_PREVIEW_LINES: usize = 50;
pub const MAX_DIR_ENTRIES: usize = 50;

/// Highlighters tried for text files, in order
const BAT_COMMANDS: &[&str] = &["bat", "batcat"];

/// Reads the first N lines of a text file, replacing invalid UTF-8
pub fn read_file_lines(path: &Path, max_lines: usize) -> io::Result<Vec<String>> {
    let mut reader = BufReader::new(fs::File::open(path)?);
    let mut lines = Vec::new();
    let mut buf = Vec::new();

    while lines.len() < max_lines {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        while matches!(buf.last(), Some(b'\n') | Some(b'\r')) {
            buf.pop();
        }
        lines.push(String::from_utf8_lossy(&buf).into_owned());
    }

    Ok(lines)
}

/// Sorted entry names of a directory, directories marked with a trailing `/`
pub fn list_directory(path: &Path, max_entries: usize) -> io::Result<Vec<String>> {
    let mut entries: Vec<String> = fs::read_dir(path)?
        .filter_map(|entry| entry.ok())
        .map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                format!("{}/", name)
            } else {
                name
            }
        })
        .collect();

    entries.sort();
    let total = entries.len();
    entries.truncate(max_entries);
    if total > max_entries {
        entries.push(format!("... {} more", total - max_entries));
    }
    Ok(entries)
}

/// One-line summary for files that are not shown as text
pub fn describe(path: &Path, class: Classification, mime: &str) -> Vec<String> {
    let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    vec![
        format!("{}", path.display()),
        format!("Type: {} ({})", class, mime),
        format!("Size: {} bytes", size),
    ]
}

/// Generates the plain-text preview for any path
pub fn generate_preview(path: &Path, sniffer: &dyn MimeSniffer) -> io::Result<Vec<String>> {
    match classify(path, sniffer) {
        Classification::Directory => list_directory(path, MAX_DIR_ENTRIES),
        Classification::TextLike => read_file_lines(path, MAX_PREVIEW_LINES),
        class => {
            let mime = sniffer.sniff(path).unwrap_or_else(|_| "unknown".to_string());
            Ok(describe(path, class, &mime))
        }
    }
}

/// Writes the preview of `path` to `out`.
///
/// Text files go through `bat` when `highlight` is set and it is installed;
/// its output is written to the inherited stdout, not `out`.
pub fn render<W: Write>(
    out: &mut W,
    path: &Path,
    sniffer: &dyn MimeSniffer,
    highlight: bool,
) -> io::Result<()> {
    if highlight && !path.is_dir() && classify(path, sniffer) == Classification::TextLike {
        if let Some(bat) = BAT_COMMANDS.iter().find(|c| which::which(c).is_ok()) {
            out.flush()?;
            match run_bat(bat, path) {
                Ok(true) => return Ok(()),
                Ok(false) => debug!("{} failed on {}", bat, path.display()),
                Err(e) => debug!("could not run {}: {}", bat, e),
            }
        }
    }

    for line in generate_preview(path, sniffer)? {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

fn run_bat(bat: &str, path: &Path) -> io::Result<bool> {
    let status = Command::new(bat)
        .args(["--style=numbers", "--color=always", "--paging=never"])
        .arg(format!("--line-range=:{}", MAX_PREVIEW_LINES))
        .arg("--")
        .arg(path)
        .stdin(Stdio::null())
        .status()?;
    Ok(status.success())
}
