//! Interactive selection: one path out of the candidate stream, one handler
//! out of a handler list.

pub mod fzf;
pub mod prompt;

pub use fzf::{FzfOptions, FzfSelector};
pub use prompt::{OptionPrompter, PromptSelector};

use crate::config::SelectorKind;
use crate::domain::{Enumerator, HandlerOption, HiddenMode};
use crate::error::{FopenError, Result};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Narrows the candidates of an [`Enumerator`] down to a single path
pub trait Selector {
    /// Returns the chosen candidate path, or `None` if the user cancelled.
    ///
    /// Selectors that toggle hidden files in-process (the numbered prompt)
    /// keep `hidden` in step with what is displayed. fzf flips it inside its
    /// own bindings and never reports back, so `hidden` keeps the startup
    /// state there.
    fn select(&mut self, enumerator: &Enumerator, hidden: &mut HiddenMode)
        -> Result<Option<PathBuf>>;
}

/// Builds the selector named by the configuration.
///
/// `Auto` prefers fzf and falls back to the numbered prompt; an explicit
/// `Fzf` without fzf installed is fatal.
pub fn from_kind(kind: SelectorKind, options: FzfOptions) -> Result<Box<dyn Selector>> {
    match kind {
        SelectorKind::Fzf => Ok(Box::new(FzfSelector::locate(options)?)),
        SelectorKind::Prompt => Ok(Box::new(PromptSelector::stdio())),
        SelectorKind::Auto => match FzfSelector::locate(options) {
            Ok(selector) => Ok(Box::new(selector)),
            Err(FopenError::MissingRequiredTool { .. }) => {
                warn!("fzf not found in PATH, using the numbered prompt");
                Ok(Box::new(PromptSelector::stdio()))
            }
            Err(e) => Err(e),
        },
    }
}

/// Asks the user which handler to run.
///
/// Uses a small fzf menu when allowed and available, otherwise a numbered
/// prompt on the terminal. Any failure of the fzf menu drops to the prompt.
pub fn resolve_handler(options: &[HandlerOption], use_fzf: bool) -> Option<HandlerOption> {
    if use_fzf && fzf::is_installed() {
        match fzf::choose_option(options) {
            Ok(choice) => return choice.map(|i| options[i].clone()),
            Err(e) => debug!("fzf handler menu failed ({}), using the prompt", e),
        }
    }
    OptionPrompter::stdio().choose(options)
}
