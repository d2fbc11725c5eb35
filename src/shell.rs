//! POSIX shell quoting for text handed to `sh -c` or `eval`

use std::path::Path;

/// Wraps `s` in single quotes, escaping embedded quotes
pub fn quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('\'');
    for c in s.chars() {
        if c == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(c);
        }
    }
    quoted.push('\'');
    quoted
}

/// The line a shell wrapper evaluates to change into `dir`
pub fn cd_command(dir: &Path) -> String {
    format!("cd {}", quote(&dir.to_string_lossy()))
}
