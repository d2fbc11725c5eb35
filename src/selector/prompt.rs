//! Numbered menus read from a line-oriented input

use super::Selector;
use crate::domain::{Enumerator, HandlerOption, HiddenMode};
use crate::error::Result;
use crossterm::style::Stylize;
use crossterm::tty::IsTty;
use std::io::{self, BufRead, Stderr, StdinLock, Write};
use std::path::PathBuf;

/// Input that flips hidden-file visibility in [`PromptSelector`]
pub const TOGGLE_HIDDEN: &str = "h";

/// Prints a 1-based menu and reads a single answer.
///
/// There is no retry: empty, malformed, out-of-range input or end of input
/// all mean "no choice".
pub struct OptionPrompter<R, W> {
    input: R,
    output: W,
    styled: bool,
}

impl OptionPrompter<StdinLock<'static>, Stderr> {
    /// Reads from stdin and draws on stderr so stdout stays free for the
    /// `cd` line
    pub fn stdio() -> Self {
        let output = io::stderr();
        let styled = output.is_tty();
        Self {
            input: io::stdin().lock(),
            output,
            styled,
        }
    }
}

impl<R: BufRead, W: Write> OptionPrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            styled: false,
        }
    }

    pub fn choose(&mut self, options: &[HandlerOption]) -> Option<HandlerOption> {
        let labels: Vec<String> = options.iter().map(|o| o.label.clone()).collect();
        self.render("Choose the best option:", &labels).ok()?;
        self.ask(&format!("Number [1-{}]: ", labels.len())).ok()?;

        let line = self.read_line()?;
        parse_choice(&line, options.len()).map(|i| options[i].clone())
    }

    fn render(&mut self, header: &str, labels: &[String]) -> io::Result<()> {
        if self.styled {
            writeln!(self.output, "{}", header.bold())?;
        } else {
            writeln!(self.output, "{}", header)?;
        }
        for (i, label) in labels.iter().enumerate() {
            let number = (i + 1).to_string();
            if self.styled {
                writeln!(self.output, "  {}) {}", number.cyan(), label)?;
            } else {
                writeln!(self.output, "  {}) {}", number, label)?;
            }
        }
        Ok(())
    }

    fn ask(&mut self, prompt: &str) -> io::Result<()> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()
    }

    /// `None` at end of input
    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }

    #[cfg(test)]
    fn into_output(self) -> W {
        self.output
    }
}

/// Parses a 1-based answer into a 0-based index
fn parse_choice(answer: &str, len: usize) -> Option<usize> {
    match answer.trim().parse::<usize>() {
        Ok(n) if (1..=len).contains(&n) => Some(n - 1),
        _ => None,
    }
}

/// Path picker used when fzf is unavailable.
///
/// Lists every candidate, sorted, with the hidden-mode label as header.
/// Answering [`TOGGLE_HIDDEN`] flips the mode and lists again.
pub struct PromptSelector<R, W> {
    prompter: OptionPrompter<R, W>,
}

impl PromptSelector<StdinLock<'static>, Stderr> {
    pub fn stdio() -> Self {
        Self {
            prompter: OptionPrompter::stdio(),
        }
    }
}

impl<R: BufRead, W: Write> PromptSelector<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            prompter: OptionPrompter::new(input, output),
        }
    }
}

impl<R: BufRead, W: Write> Selector for PromptSelector<R, W> {
    fn select(
        &mut self,
        enumerator: &Enumerator,
        hidden: &mut HiddenMode,
    ) -> Result<Option<PathBuf>> {
        loop {
            let mut candidates: Vec<_> = enumerator.enumerate(hidden.is_on()).collect();
            candidates.sort_by(|a, b| a.path.cmp(&b.path));

            let labels: Vec<String> = candidates
                .iter()
                .map(|c| {
                    if c.is_dir() {
                        format!("{}/", c.path.display())
                    } else {
                        c.path.display().to_string()
                    }
                })
                .collect();

            let header = format!("{}  ({} to toggle)", hidden.label(), TOGGLE_HIDDEN);
            self.prompter.render(&header, &labels)?;
            self.prompter
                .ask(&format!("Number [1-{}]: ", candidates.len()))?;

            let Some(answer) = self.prompter.read_line() else {
                return Ok(None);
            };
            if answer == TOGGLE_HIDDEN {
                hidden.toggle();
                continue;
            }

            return Ok(parse_choice(&answer, candidates.len())
                .map(|i| candidates.swap_remove(i).path));
        }
    }
}
