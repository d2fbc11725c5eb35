//! fopen - fuzzy-find a path and open it with the right program
//!
//! This crate provides the selection-and-dispatch engine behind the `fopen`
//! binary: candidate enumeration, the selector capability and its fzf and
//! prompt implementations, content classification, and handler dispatch.

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod preview;
pub mod selector;
pub mod shell;

// Re-export primary types for convenience
pub use app::{App, Outcome};
pub use config::UserConfig;
pub use domain::{
    classify, Candidate, CandidateKind, Classification, DispatchResult, Dispatcher, Enumerator,
    HandlerOption, HandlerTable, HiddenMode, LaunchMode, LaunchSpec,
};
pub use error::{FopenError, Result};
pub use selector::Selector;
