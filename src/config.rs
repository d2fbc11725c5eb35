//! User configuration and preferences
//!
//! Values come from three layers, later ones winning: built-in defaults,
//! the JSON config file, and `FOPEN_*` environment variables. Everything is
//! read once at startup.

use crate::error::{FopenError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Overrides the config file location
pub const CONFIG_ENV: &str = "FOPEN_CONFIG";

/// An external program offered as a handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppEntry {
    pub command: String,
    pub label: String,
    /// Runs in the terminal and is waited on; otherwise launched detached
    #[serde(default)]
    pub terminal: bool,
    /// Extra arguments placed before the target path
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

impl AppEntry {
    pub fn new(command: &str, label: &str, terminal: bool) -> Self {
        Self {
            command: command.to_string(),
            label: label.to_string(),
            terminal,
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: &[&str]) -> Self {
        self.args = args.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Builds an entry from a command line such as `"code --wait"`
    pub fn from_command_line(line: &str, terminal: bool) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let command = parts.next()?;
        Some(Self {
            command: command.to_string(),
            label: line.trim().to_string(),
            terminal,
            args: parts.map(str::to_string).collect(),
        })
    }
}

/// Which interactive selector to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorKind {
    /// fzf when installed, numbered prompt otherwise
    #[default]
    Auto,
    /// fzf only; its absence is fatal
    Fzf,
    /// Numbered prompt only
    Prompt,
}

impl FromStr for SelectorKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(SelectorKind::Auto),
            "fzf" => Ok(SelectorKind::Fzf),
            "prompt" => Ok(SelectorKind::Prompt),
            other => Err(format!("unknown selector '{}'", other)),
        }
    }
}

/// How file content is sniffed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnifferKind {
    #[default]
    Builtin,
    /// The external `file` utility; its absence is fatal
    File,
}

impl FromStr for SnifferKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "builtin" => Ok(SnifferKind::Builtin),
            "file" => Ok(SnifferKind::File),
            other => Err(format!("unknown sniffer '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub text_editors: Vec<AppEntry>,
    pub file_managers: Vec<AppEntry>,
    pub image_viewer: String,
    pub pdf_viewer: String,
    /// Generic opener for anything without a dedicated handler
    pub opener: String,
    pub excluded_dirs: Vec<String>,
    /// Enumerate with `fd` when it is installed
    pub use_fd: bool,
    pub follow_symlinks: bool,
    pub fzf_height: String,
    /// Hidden-files mode at the start of every run
    pub show_hidden: bool,
    pub preview: bool,
    /// Pick handlers with fzf instead of the numbered prompt
    pub fzf_for_handlers: bool,
    pub selector: SelectorKind,
    pub sniffer: SnifferKind,
    pub log_level: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            text_editors: vec![
                AppEntry::new("nvim", "NeoVim", true),
                AppEntry::new("vim", "Vim", true),
                AppEntry::new("code", "Visual Studio Code", false).with_args(&["--reuse-window"]),
                AppEntry::new("gedit", "Text Editor (GTK)", false),
                AppEntry::new("kate", "Kate Editor", false),
            ],
            file_managers: vec![
                AppEntry::new("nautilus", "Files (GNOME)", false),
                AppEntry::new("dolphin", "Dolphin (KDE)", false),
                AppEntry::new("thunar", "Thunar (XFCE)", false),
            ],
            image_viewer: "loupe".to_string(),
            pdf_viewer: "okular".to_string(),
            opener: default_opener().to_string(),
            excluded_dirs: [
                ".git",
                "node_modules",
                ".vscode",
                ".idea",
                "dist",
                "build",
                "target",
                ".cache",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            use_fd: true,
            follow_symlinks: true,
            fzf_height: "90%".to_string(),
            show_hidden: false,
            preview: true,
            fzf_for_handlers: true,
            selector: SelectorKind::Auto,
            sniffer: SnifferKind::Builtin,
            log_level: "warn".to_string(),
        }
    }
}

#[cfg(target_os = "macos")]
fn default_opener() -> &'static str {
    "open"
}

#[cfg(not(target_os = "macos"))]
fn default_opener() -> &'static str {
    "xdg-open"
}

/// Accepts the usual spellings of a boolean environment value
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl UserConfig {
    /// Get the config file path (`$FOPEN_CONFIG` or ~/.config/fopen/config.json)
    pub fn config_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("fopen").join("config.json"))
    }

    /// Loads the config file, then applies the process environment
    pub fn load() -> Result<Self> {
        let path = Self::config_path().ok_or_else(|| {
            FopenError::ConfigError("Could not determine config directory".to_string())
        })?;

        let mut config = Self::load_from(&path)?;
        config.apply_process_env();
        Ok(config)
    }

    /// Reads a config file; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            FopenError::ConfigError(format!("Failed to read config file: {}", e))
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            FopenError::ConfigError(format!("Failed to parse config file: {}", e))
        })
    }

    pub fn apply_process_env(&mut self) {
        self.apply_env(|key| std::env::var(key).ok());
    }

    /// Applies `FOPEN_*` overrides looked up through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(entry) = get("FOPEN_TEXT_EDITOR").and_then(|v| AppEntry::from_command_line(&v, true))
        {
            self.text_editors.insert(0, entry);
        }
        if let Some(entry) =
            get("FOPEN_FILE_MANAGER").and_then(|v| AppEntry::from_command_line(&v, false))
        {
            self.file_managers.insert(0, entry);
        }
        if let Some(v) = get("FOPEN_IMAGE_VIEWER") {
            self.image_viewer = v;
        }
        if let Some(v) = get("FOPEN_PDF_VIEWER") {
            self.pdf_viewer = v;
        }
        if let Some(v) = get("FOPEN_OPENER") {
            self.opener = v;
        }
        if let Some(v) = get("FOPEN_EXCLUDE_DIRS") {
            self.excluded_dirs = v
                .split(':')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(v) = get("FOPEN_USE_FD").and_then(|v| parse_bool(&v)) {
            self.use_fd = v;
        }
        if let Some(v) = get("FOPEN_FZF_HEIGHT") {
            self.fzf_height = v;
        }
        if let Some(v) = get("FOPEN_SHOW_HIDDEN").and_then(|v| parse_bool(&v)) {
            self.show_hidden = v;
        }
        if let Some(v) = get("FOPEN_SELECTOR").and_then(|v| v.parse().ok()) {
            self.selector = v;
        }
        if let Some(v) = get("FOPEN_SNIFFER").and_then(|v| v.parse().ok()) {
            self.sniffer = v;
        }
        if let Some(v) = get("FOPEN_LOG") {
            self.log_level = v;
        }
    }

    /// Save config to file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                FopenError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let contents = self.to_json()?;

        fs::write(path, contents).map_err(|e| {
            FopenError::ConfigError(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Writes the default configuration to the config path and returns it
    pub fn write_default() -> Result<PathBuf> {
        let path = Self::config_path().ok_or_else(|| {
            FopenError::ConfigError("Could not determine config directory".to_string())
        })?;
        Self::default().save_to(&path)?;
        Ok(path)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| FopenError::ConfigError(format!("Failed to serialize config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = UserConfig::default();
        assert_eq!(config.text_editors[0].command, "nvim");
        assert!(config.text_editors[0].terminal);
        assert_eq!(config.image_viewer, "loupe");
        assert_eq!(config.pdf_viewer, "okular");
        assert!(config.excluded_dirs.contains(&"node_modules".to_string()));
        assert!(config.use_fd);
        assert!(!config.show_hidden);
        assert_eq!(config.fzf_height, "90%");
        assert_eq!(config.selector, SelectorKind::Auto);
        assert_eq!(config.sniffer, SnifferKind::Builtin);
    }

    #[test]
    fn test_config_serialization() {
        let config = UserConfig {
            show_hidden: true,
            pdf_viewer: "zathura".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: UserConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, config);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "image_viewer": "feh", "selector": "prompt", "unknown_key": 1 }"#,
        )
        .unwrap();

        let config = UserConfig::load_from(&path).unwrap();
        assert_eq!(config.image_viewer, "feh");
        assert_eq!(config.selector, SelectorKind::Prompt);
        assert_eq!(config.pdf_viewer, "okular");
        assert_eq!(config.text_editors, UserConfig::default().text_editors);
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = UserConfig::load_from(Path::new("/nonexistent/fopen/config.json")).unwrap();
        assert_eq!(config, UserConfig::default());
    }

    #[test]
    fn test_invalid_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = UserConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.json");

        let config = UserConfig {
            fzf_height: "40%".to_string(),
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        assert_eq!(UserConfig::load_from(&path).unwrap(), config);
    }

    mod env_tests {
        use super::*;

        #[test]
        fn test_editor_override_is_prepended() {
            let mut config = UserConfig::default();
            config.apply_env(lookup_from(&[("FOPEN_TEXT_EDITOR", "hx")]));

            assert_eq!(config.text_editors[0].command, "hx");
            assert!(config.text_editors[0].terminal);
            assert_eq!(config.text_editors[1].command, "nvim");
        }

        #[test]
        fn test_file_manager_override_with_args() {
            let mut config = UserConfig::default();
            config.apply_env(lookup_from(&[("FOPEN_FILE_MANAGER", "pcmanfm --new-win")]));

            let first = &config.file_managers[0];
            assert_eq!(first.command, "pcmanfm");
            assert_eq!(first.args, vec!["--new-win".to_string()]);
            assert!(!first.terminal);
        }

        #[test]
        fn test_viewer_overrides() {
            let mut config = UserConfig::default();
            config.apply_env(lookup_from(&[
                ("FOPEN_IMAGE_VIEWER", "feh"),
                ("FOPEN_PDF_VIEWER", "zathura"),
                ("FOPEN_OPENER", "handlr"),
            ]));

            assert_eq!(config.image_viewer, "feh");
            assert_eq!(config.pdf_viewer, "zathura");
            assert_eq!(config.opener, "handlr");
        }

        #[test]
        fn test_exclude_dirs_colon_separated() {
            let mut config = UserConfig::default();
            config.apply_env(lookup_from(&[("FOPEN_EXCLUDE_DIRS", "vendor::tmp:")]));

            assert_eq!(
                config.excluded_dirs,
                vec!["vendor".to_string(), "tmp".to_string()]
            );
        }

        #[test]
        fn test_bool_and_enum_overrides() {
            let mut config = UserConfig::default();
            config.apply_env(lookup_from(&[
                ("FOPEN_USE_FD", "no"),
                ("FOPEN_SHOW_HIDDEN", "1"),
                ("FOPEN_SELECTOR", "FZF"),
                ("FOPEN_SNIFFER", "file"),
                ("FOPEN_FZF_HEIGHT", "50%"),
                ("FOPEN_LOG", "debug"),
            ]));

            assert!(!config.use_fd);
            assert!(config.show_hidden);
            assert_eq!(config.selector, SelectorKind::Fzf);
            assert_eq!(config.sniffer, SnifferKind::File);
            assert_eq!(config.fzf_height, "50%");
            assert_eq!(config.log_level, "debug");
        }

        #[test]
        fn test_invalid_values_are_ignored() {
            let mut config = UserConfig::default();
            config.apply_env(lookup_from(&[
                ("FOPEN_USE_FD", "maybe"),
                ("FOPEN_SELECTOR", "dmenu"),
                ("FOPEN_IMAGE_VIEWER", "   "),
            ]));

            assert_eq!(config, UserConfig::default());
        }
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" on "), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool(""), None);
    }
}
