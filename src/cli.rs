// CLI module for argument parsing and configuration

use crate::config::{SelectorKind, UserConfig};
use clap::{ArgAction, ArgGroup, Parser, ValueEnum};
use std::path::PathBuf;

/// fopen - fuzzy-find a file or directory and open it with the right program
///
/// Directories can be entered in the calling shell with a wrapper such as
/// `fo() { eval "$(fopen "$@")"; }`.
#[derive(Parser, Debug, Clone)]
#[command(name = "fopen")]
#[command(author, version, about, long_about = None)]
#[command(disable_help_flag = true)]
#[command(group(
    ArgGroup::new("mode").args(["list", "preview", "init_config", "print_config"])
))]
pub struct Args {
    /// Show hidden files (files starting with .) when the session starts
    #[arg(short = 'h', long = "hidden", action = ArgAction::SetTrue)]
    pub hidden: bool,

    /// How to pick the file
    #[arg(long = "selector", value_enum)]
    pub selector: Option<SelectorArg>,

    /// Print NUL-delimited candidates for the current directory and exit
    #[arg(long = "list", action = ArgAction::SetTrue, hide = true)]
    pub list: bool,

    /// Print a preview of PATH and exit
    #[arg(long = "preview", value_name = "PATH", hide = true)]
    pub preview: Option<PathBuf>,

    /// Write the default configuration file and print its path
    #[arg(long = "init-config", action = ArgAction::SetTrue)]
    pub init_config: bool,

    /// Print the effective configuration as JSON
    #[arg(long = "print-config", action = ArgAction::SetTrue)]
    pub print_config: bool,

    /// Print help
    #[arg(long = "help", action = ArgAction::Help)]
    pub help: Option<bool>,
}

/// Selector options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SelectorArg {
    /// fzf if installed, numbered prompt otherwise
    Auto,
    /// Always fzf
    Fzf,
    /// Numbered prompt on the terminal
    Prompt,
}

impl From<SelectorArg> for SelectorKind {
    fn from(arg: SelectorArg) -> Self {
        match arg {
            SelectorArg::Auto => SelectorKind::Auto,
            SelectorArg::Fzf => SelectorKind::Fzf,
            SelectorArg::Prompt => SelectorKind::Prompt,
        }
    }
}

/// What this invocation does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Select, classify and open one path
    Run,
    List,
    Preview(PathBuf),
    InitConfig,
    PrintConfig,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Args::parse()
    }

    pub fn mode(&self) -> Mode {
        if self.list {
            Mode::List
        } else if let Some(path) = &self.preview {
            Mode::Preview(path.clone())
        } else if self.init_config {
            Mode::InitConfig
        } else if self.print_config {
            Mode::PrintConfig
        } else {
            Mode::Run
        }
    }

    /// Validate the arguments and return any errors
    pub fn validate(&self) -> Result<(), String> {
        if let Some(path) = &self.preview {
            if !path.exists() {
                return Err(format!("Path does not exist: {}", path.display()));
            }
        }
        Ok(())
    }
}

/// Configuration for one run: user configuration with CLI overrides applied
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub show_hidden: bool,
    pub selector: SelectorKind,
    pub user: UserConfig,
}

impl AppConfig {
    pub fn new(args: &Args, user: UserConfig) -> Self {
        AppConfig {
            show_hidden: args.hidden || user.show_hidden,
            selector: args.selector.map(Into::into).unwrap_or(user.selector),
            user,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let user = UserConfig::default();
        AppConfig {
            show_hidden: user.show_hidden,
            selector: user.selector,
            user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod args_tests {
        use super::*;

        #[test]
        fn test_short_h_is_hidden() {
            let args = Args::try_parse_from(["fopen", "-h"]).unwrap();
            assert!(args.hidden);
            assert_eq!(args.mode(), Mode::Run);

            let args = Args::try_parse_from(["fopen", "--hidden"]).unwrap();
            assert!(args.hidden);
        }

        #[test]
        fn test_defaults() {
            let args = Args::try_parse_from(["fopen"]).unwrap();
            assert!(!args.hidden);
            assert!(args.selector.is_none());
            assert_eq!(args.mode(), Mode::Run);
        }

        #[test]
        fn test_long_help_still_available() {
            let err = Args::try_parse_from(["fopen", "--help"]).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
        }

        #[test]
        fn test_list_mode_honors_hidden() {
            let args = Args::try_parse_from(["fopen", "--list", "--hidden"]).unwrap();
            assert_eq!(args.mode(), Mode::List);
            assert!(args.hidden);
        }

        #[test]
        fn test_preview_mode() {
            let args = Args::try_parse_from(["fopen", "--preview", "src/main.rs"]).unwrap();
            assert_eq!(args.mode(), Mode::Preview(PathBuf::from("src/main.rs")));
        }

        #[test]
        fn test_modes_are_exclusive() {
            assert!(Args::try_parse_from(["fopen", "--list", "--print-config"]).is_err());
            assert!(Args::try_parse_from(["fopen", "--init-config", "--preview", "x"]).is_err());
        }

        #[test]
        fn test_selector_values() {
            let args = Args::try_parse_from(["fopen", "--selector", "prompt"]).unwrap();
            assert_eq!(args.selector, Some(SelectorArg::Prompt));
            assert!(Args::try_parse_from(["fopen", "--selector", "dmenu"]).is_err());
        }

        #[test]
        fn test_validate_missing_preview_path() {
            let args =
                Args::try_parse_from(["fopen", "--preview", "/nonexistent/path/12345"]).unwrap();
            let result = args.validate();
            assert!(result.is_err());
            assert!(result.unwrap_err().contains("does not exist"));
        }

        #[test]
        fn test_validate_success() {
            let args = Args::try_parse_from(["fopen", "--preview", "."]).unwrap();
            assert!(args.validate().is_ok());
        }
    }

    mod config_tests {
        use super::*;

        #[test]
        fn test_hidden_from_flag_or_config() {
            let flag = Args::try_parse_from(["fopen", "-h"]).unwrap();
            let none = Args::try_parse_from(["fopen"]).unwrap();

            assert!(AppConfig::new(&flag, UserConfig::default()).show_hidden);
            assert!(!AppConfig::new(&none, UserConfig::default()).show_hidden);

            let user = UserConfig {
                show_hidden: true,
                ..Default::default()
            };
            assert!(AppConfig::new(&none, user).show_hidden);
        }

        #[test]
        fn test_selector_flag_overrides_config() {
            let user = UserConfig {
                selector: SelectorKind::Fzf,
                ..Default::default()
            };

            let none = Args::try_parse_from(["fopen"]).unwrap();
            assert_eq!(AppConfig::new(&none, user.clone()).selector, SelectorKind::Fzf);

            let prompt = Args::try_parse_from(["fopen", "--selector", "prompt"]).unwrap();
            assert_eq!(AppConfig::new(&prompt, user).selector, SelectorKind::Prompt);
        }

        #[test]
        fn test_app_config_default() {
            let config = AppConfig::default();
            assert!(!config.show_hidden);
            assert_eq!(config.selector, SelectorKind::Auto);
        }
    }
}
