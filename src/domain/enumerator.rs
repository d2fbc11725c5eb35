//! Candidate enumeration under the working directory

use super::{Candidate, CandidateKind};
use std::collections::HashSet;
use std::ffi::OsStr;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use tracing::debug;
use walkdir::WalkDir;

/// Version-control metadata that is pruned even when hidden files are shown
pub const VCS_DIRS: &[&str] = &[".git", ".hg", ".svn"];

/// Traversal implementation behind [`Enumerator::enumerate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// In-process `walkdir` traversal
    Walk,
    /// Stream from an external `fd` process
    Fd,
}

#[derive(Debug, Clone)]
pub struct Enumerator {
    root: PathBuf,
    excluded: HashSet<String>,
    follow_links: bool,
    backend: Backend,
}

impl Enumerator {
    pub fn new<I, S>(root: impl Into<PathBuf>, excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            root: root.into(),
            excluded: excluded.into_iter().map(Into::into).collect(),
            follow_links: false,
            backend: Backend::Walk,
        }
    }

    pub fn with_follow_links(mut self, follow_links: bool) -> Self {
        self.follow_links = follow_links;
        self
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Uses `fd` when requested and installed, the built-in walk otherwise
    pub fn prefer_fd(self, use_fd: bool) -> Self {
        if use_fd && which::which("fd").is_ok() {
            self.with_backend(Backend::Fd)
        } else {
            if use_fd {
                debug!("fd not found in PATH, using built-in traversal");
            }
            self.with_backend(Backend::Walk)
        }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Turns a candidate path back into one usable from the working directory
    pub fn resolve(&self, candidate: &Path) -> PathBuf {
        if self.root == Path::new(".") || candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.root.join(candidate)
        }
    }

    /// Produces a fresh, lazy sequence of candidates reflecting current disk state.
    ///
    /// Entries named in the exclusion set are pruned with their whole subtree.
    /// Without `hidden`, dot-entries are pruned too; with it, only
    /// version-control metadata is. Unreadable subtrees are skipped.
    pub fn enumerate(&self, hidden: bool) -> Box<dyn Iterator<Item = Candidate>> {
        if self.backend == Backend::Fd {
            match FdCandidates::spawn(&self.root, &self.fd_args(hidden)) {
                Ok(candidates) => return Box::new(candidates),
                Err(e) => debug!("fd failed to start ({}), using built-in traversal", e),
            }
        }
        Box::new(self.walk(hidden))
    }

    fn walk(&self, hidden: bool) -> impl Iterator<Item = Candidate> {
        let root = self.root.clone();
        let excluded = self.excluded.clone();

        WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(self.follow_links)
            .into_iter()
            .filter_entry(move |entry| {
                entry.depth() == 0 || !is_pruned(&excluded, entry.file_name(), hidden)
            })
            .filter_map(Result::ok)
            .filter_map(move |entry| {
                let relative = entry.path().strip_prefix(&root).ok()?.to_path_buf();
                let kind = if entry.file_type().is_dir() {
                    CandidateKind::Directory
                } else {
                    CandidateKind::File
                };
                Some(Candidate::new(relative, kind))
            })
    }

    /// Command-line arguments for the `fd` backend
    pub fn fd_args(&self, hidden: bool) -> Vec<String> {
        let mut args: Vec<String> = [
            "-t",
            "f",
            "-t",
            "d",
            "--strip-cwd-prefix",
            "--color=never",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        if hidden {
            args.push("--hidden".to_string());
            if self.follow_links {
                args.push("--follow".to_string());
            }
        }

        let mut excludes: Vec<&str> = self.excluded.iter().map(String::as_str).collect();
        if hidden {
            excludes.extend(VCS_DIRS.iter().filter(|d| !self.excluded.contains(**d)));
        }
        excludes.sort_unstable();
        for dir in excludes {
            args.push("--exclude".to_string());
            args.push(dir.to_string());
        }

        args.push("-0".to_string());
        args
    }
}

fn is_pruned(excluded: &HashSet<String>, name: &OsStr, hidden: bool) -> bool {
    let name = name.to_string_lossy();

    if excluded.contains(name.as_ref()) {
        return true;
    }
    if hidden {
        VCS_DIRS.contains(&name.as_ref())
    } else {
        name.starts_with('.')
    }
}

/// NUL-delimited paths read from a running `fd`, reaped on drop
struct FdCandidates {
    child: Child,
    reader: BufReader<ChildStdout>,
    root: PathBuf,
}

impl FdCandidates {
    fn spawn(root: &Path, args: &[String]) -> std::io::Result<Self> {
        let mut child = Command::new("fd")
            .args(args)
            .current_dir(root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("fd stdout not captured"))?;

        Ok(Self {
            child,
            reader: BufReader::new(stdout),
            root: root.to_path_buf(),
        })
    }
}

impl Iterator for FdCandidates {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        loop {
            let mut buf = Vec::new();
            match self.reader.read_until(0, &mut buf) {
                Ok(0) | Err(_) => return None,
                Ok(_) => {
                    if buf.last() == Some(&0) {
                        buf.pop();
                    }
                    if buf.is_empty() {
                        continue;
                    }
                    let path = path_from_bytes(buf);
                    let kind = if self.root.join(&path).is_dir() {
                        CandidateKind::Directory
                    } else {
                        CandidateKind::File
                    };
                    return Some(Candidate::new(path, kind));
                }
            }
        }
    }
}

impl Drop for FdCandidates {
    fn drop(&mut self) {
        self.child.kill().ok();
        self.child.wait().ok();
    }
}

#[cfg(unix)]
pub(crate) fn path_from_bytes(bytes: Vec<u8>) -> PathBuf {
    use std::os::unix::ffi::OsStringExt;
    PathBuf::from(std::ffi::OsString::from_vec(bytes))
}

#[cfg(not(unix))]
pub(crate) fn path_from_bytes(bytes: Vec<u8>) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(&bytes).into_owned())
}

/// Writes each path followed by a NUL byte
pub fn write_nul_delimited<W, I>(writer: &mut W, paths: I) -> io::Result<()>
where
    W: Write,
    I: Iterator<Item = PathBuf>,
{
    for path in paths {
        writer.write_all(path_bytes(&path).as_ref())?;
        writer.write_all(b"\0")?;
    }
    writer.flush()
}

#[cfg(unix)]
pub(crate) fn path_bytes(path: &Path) -> std::borrow::Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    std::borrow::Cow::Borrowed(path.as_os_str().as_bytes())
}

#[cfg(not(unix))]
pub(crate) fn path_bytes(path: &Path) -> std::borrow::Cow<'_, [u8]> {
    match path.to_string_lossy() {
        std::borrow::Cow::Borrowed(s) => std::borrow::Cow::Borrowed(s.as_bytes()),
        std::borrow::Cow::Owned(s) => std::borrow::Cow::Owned(s.into_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_write_nul_delimited() {
        let mut out = Vec::new();
        let paths = vec![PathBuf::from("src"), PathBuf::from("src/a b.rs")];
        write_nul_delimited(&mut out, paths.into_iter()).unwrap();
        assert_eq!(out, b"src\0src/a b.rs\0");
    }

    fn paths(enumerator: &Enumerator, hidden: bool) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = enumerator.enumerate(hidden).map(|c| c.path).collect();
        paths.sort();
        paths
    }

    fn sample_tree() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/app.py"), b"print('hi')").unwrap();
        fs::create_dir_all(root.join("node_modules")).unwrap();
        fs::write(root.join("node_modules/x.js"), b"module.exports = 1").unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join(".git/HEAD"), b"ref: refs/heads/main").unwrap();

        temp_dir
    }

    mod walk_tests {
        use super::*;

        #[test]
        fn test_excludes_hidden_and_excluded_dirs() {
            let temp_dir = sample_tree();
            let enumerator = Enumerator::new(temp_dir.path(), ["node_modules"]);

            assert_eq!(
                paths(&enumerator, false),
                vec![PathBuf::from("src"), PathBuf::from("src/app.py")]
            );
        }

        #[test]
        fn test_kinds_are_reported() {
            let temp_dir = sample_tree();
            let enumerator = Enumerator::new(temp_dir.path(), ["node_modules"]);

            let candidates: Vec<Candidate> = enumerator.enumerate(false).collect();
            let src = candidates
                .iter()
                .find(|c| c.path == Path::new("src"))
                .unwrap();
            let app = candidates
                .iter()
                .find(|c| c.path == Path::new("src/app.py"))
                .unwrap();

            assert!(src.is_dir());
            assert_eq!(app.kind, CandidateKind::File);
        }

        #[test]
        fn test_hidden_includes_dot_entries_but_not_vcs() {
            let temp_dir = sample_tree();
            let root = temp_dir.path();
            fs::write(root.join(".env"), b"KEY=1").unwrap();
            fs::create_dir_all(root.join(".config")).unwrap();
            fs::write(root.join(".config/settings"), b"x").unwrap();

            let enumerator = Enumerator::new(root, ["node_modules"]);
            let found = paths(&enumerator, true);

            assert!(found.contains(&PathBuf::from(".env")));
            assert!(found.contains(&PathBuf::from(".config/settings")));
            assert!(!found.iter().any(|p| p.starts_with(".git")));
            assert!(!found.iter().any(|p| p.starts_with("node_modules")));
        }

        #[test]
        fn test_excluded_name_pruned_at_any_depth() {
            let temp_dir = TempDir::new().unwrap();
            let root = temp_dir.path();
            fs::create_dir_all(root.join("web/node_modules/pkg")).unwrap();
            fs::write(root.join("web/node_modules/pkg/index.js"), b"").unwrap();
            fs::write(root.join("web/index.html"), b"<html></html>").unwrap();

            let enumerator = Enumerator::new(root, ["node_modules"]);
            let found = paths(&enumerator, true);

            assert_eq!(
                found,
                vec![PathBuf::from("web"), PathBuf::from("web/index.html")]
            );
        }

        #[test]
        fn test_no_path_has_excluded_or_dot_segment() {
            let temp_dir = sample_tree();
            let root = temp_dir.path();
            fs::create_dir_all(root.join("a/.cache/b")).unwrap();
            fs::write(root.join("a/.cache/b/c.txt"), b"").unwrap();
            fs::create_dir_all(root.join("a/dist")).unwrap();
            fs::write(root.join("a/keep.txt"), b"").unwrap();

            let enumerator = Enumerator::new(root, ["node_modules", "dist"]);
            for path in paths(&enumerator, false) {
                for segment in path.iter() {
                    let segment = segment.to_string_lossy();
                    assert!(!segment.starts_with('.'), "dot segment in {:?}", path);
                    assert!(segment != "node_modules" && segment != "dist");
                }
            }
        }

        #[test]
        fn test_each_call_reflects_current_disk_state() {
            let temp_dir = TempDir::new().unwrap();
            let root = temp_dir.path();
            fs::write(root.join("one.txt"), b"1").unwrap();

            let enumerator = Enumerator::new(root, Vec::<String>::new());
            assert_eq!(paths(&enumerator, false), vec![PathBuf::from("one.txt")]);

            fs::write(root.join("two.txt"), b"2").unwrap();
            assert_eq!(
                paths(&enumerator, false),
                vec![PathBuf::from("one.txt"), PathBuf::from("two.txt")]
            );
        }

        #[test]
        fn test_empty_directory() {
            let temp_dir = TempDir::new().unwrap();
            let enumerator = Enumerator::new(temp_dir.path(), Vec::<String>::new());
            assert!(paths(&enumerator, false).is_empty());
        }

        #[test]
        fn test_missing_root_yields_nothing() {
            let enumerator = Enumerator::new("/nonexistent/fopen/root", Vec::<String>::new());
            assert_eq!(enumerator.enumerate(true).count(), 0);
        }

        #[cfg(unix)]
        #[test]
        fn test_unreadable_subtree_does_not_abort() {
            use std::os::unix::fs::PermissionsExt;

            let temp_dir = TempDir::new().unwrap();
            let root = temp_dir.path();
            fs::create_dir_all(root.join("locked")).unwrap();
            fs::write(root.join("locked/secret.txt"), b"").unwrap();
            fs::create_dir_all(root.join("open")).unwrap();
            fs::write(root.join("open/visible.txt"), b"").unwrap();
            fs::set_permissions(root.join("locked"), fs::Permissions::from_mode(0o000)).unwrap();

            let enumerator = Enumerator::new(root, Vec::<String>::new());
            let found = paths(&enumerator, false);

            fs::set_permissions(root.join("locked"), fs::Permissions::from_mode(0o755)).unwrap();

            assert!(found.contains(&PathBuf::from("open/visible.txt")));
            assert!(found.contains(&PathBuf::from("locked")));
        }
    }

    mod fd_tests {
        use super::*;

        #[test]
        fn test_fd_args_default() {
            let enumerator = Enumerator::new(".", ["node_modules", "dist"]);
            let args = enumerator.fd_args(false);

            assert_eq!(&args[..6], &["-t", "f", "-t", "d", "--strip-cwd-prefix", "--color=never"]);
            assert!(!args.contains(&"--hidden".to_string()));
            assert!(!args.contains(&".git".to_string()));
            assert_eq!(args.last().map(String::as_str), Some("-0"));

            let joined = args.join(" ");
            assert!(joined.contains("--exclude dist"));
            assert!(joined.contains("--exclude node_modules"));
        }

        #[test]
        fn test_fd_args_hidden_excludes_vcs() {
            let enumerator = Enumerator::new(".", ["node_modules"]).with_follow_links(true);
            let args = enumerator.fd_args(true);
            let joined = args.join(" ");

            assert!(args.contains(&"--hidden".to_string()));
            assert!(args.contains(&"--follow".to_string()));
            assert!(joined.contains("--exclude .git"));
            assert!(joined.contains("--exclude node_modules"));
        }

        #[test]
        fn test_fd_args_no_duplicate_vcs_exclude() {
            let enumerator = Enumerator::new(".", [".git"]);
            let args = enumerator.fd_args(true);
            assert_eq!(args.iter().filter(|a| *a == ".git").count(), 1);
        }

        #[test]
        fn test_resolve_against_root() {
            let here = Enumerator::new(".", Vec::<String>::new());
            assert_eq!(here.resolve(Path::new("src/a.rs")), PathBuf::from("src/a.rs"));

            let elsewhere = Enumerator::new("/work", Vec::<String>::new());
            assert_eq!(
                elsewhere.resolve(Path::new("src/a.rs")),
                PathBuf::from("/work/src/a.rs")
            );
        }

        #[test]
        fn test_prefer_fd_disabled_uses_walk() {
            let enumerator = Enumerator::new(".", Vec::<String>::new()).prefer_fd(false);
            assert_eq!(enumerator.backend(), Backend::Walk);
        }
    }
}
