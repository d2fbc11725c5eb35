//! One interaction: select a path, classify it, open it.

use crate::cli::AppConfig;
use crate::config::{SnifferKind, UserConfig};
use crate::domain::{
    classify, BuiltinSniffer, Classification, DispatchResult, Dispatcher, Enumerator,
    FileCommandSniffer, HandlerOption, HandlerTable, HiddenMode, Launcher, MimeSniffer,
    ProcessLauncher, Stage,
};
use crate::error::Result;
use crate::selector::{self, FzfOptions, Selector};
use crate::shell::cd_command;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

/// Picks one handler out of several; `None` cancels
pub type Resolver = Box<dyn FnMut(&[HandlerOption]) -> Option<HandlerOption>>;

/// How a run ended and the stages it went through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub result: DispatchResult,
    pub stages: Vec<Stage>,
    /// Hidden mode as last known to the selector (fzf toggles are not reported)
    pub hidden: HiddenMode,
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        self.result.exit_code()
    }
}

struct Session {
    stages: Vec<Stage>,
    hidden: HiddenMode,
}

impl Session {
    fn new(show_hidden: bool) -> Self {
        Self {
            stages: vec![Stage::Idle],
            hidden: HiddenMode::new(show_hidden),
        }
    }

    fn advance(&mut self, next: Stage) {
        debug!("stage {:?} -> {:?}", self.stages.last(), next);
        self.stages.push(next);
    }

    fn finish(mut self, result: DispatchResult) -> Outcome {
        let last = match result {
            DispatchResult::Cancelled => Stage::Cancelled,
            _ => Stage::Launched,
        };
        self.advance(last);
        Outcome {
            result,
            stages: self.stages,
            hidden: self.hidden,
        }
    }
}

pub struct App<L: Launcher = ProcessLauncher> {
    enumerator: Enumerator,
    selector: Box<dyn Selector>,
    sniffer: Box<dyn MimeSniffer>,
    dispatcher: Dispatcher<L>,
    resolver: Resolver,
    show_hidden: bool,
}

impl App<ProcessLauncher> {
    /// Wires the real collaborators for the current directory.
    ///
    /// Fails early if a tool the configuration insists on is missing.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let user = &config.user;

        let enumerator = enumerator_for(user);

        let fzf = FzfOptions {
            height: user.fzf_height.clone(),
            preview: user.preview,
            exe: std::env::current_exe().unwrap_or_else(|_| PathBuf::from("fopen")),
        };
        let selector = selector::from_kind(config.selector, fzf)?;
        let sniffer = sniffer_for(user.sniffer)?;
        let dispatcher = Dispatcher::new(HandlerTable::from_config(user), ProcessLauncher);

        let use_fzf = user.fzf_for_handlers;
        Ok(App::new(enumerator, selector, sniffer, dispatcher)
            .with_hidden(config.show_hidden)
            .with_resolver(Box::new(move |options: &[HandlerOption]| {
                selector::resolve_handler(options, use_fzf)
            })))
    }
}

/// Enumerator over the current directory with the configured policy
pub fn enumerator_for(user: &UserConfig) -> Enumerator {
    let enumerator = Enumerator::new(".", user.excluded_dirs.iter().cloned())
        .with_follow_links(user.follow_symlinks)
        .prefer_fd(user.use_fd);
    debug!("enumerating with {:?}", enumerator.backend());
    enumerator
}

/// The content sniffer named by the configuration
pub fn sniffer_for(kind: SnifferKind) -> Result<Box<dyn MimeSniffer>> {
    Ok(match kind {
        SnifferKind::Builtin => Box::new(BuiltinSniffer::new()),
        SnifferKind::File => Box::new(FileCommandSniffer::locate()?),
    })
}

impl<L: Launcher> App<L> {
    pub fn new(
        enumerator: Enumerator,
        selector: Box<dyn Selector>,
        sniffer: Box<dyn MimeSniffer>,
        dispatcher: Dispatcher<L>,
    ) -> Self {
        Self {
            enumerator,
            selector,
            sniffer,
            dispatcher,
            resolver: Box::new(|options: &[HandlerOption]| {
                selector::resolve_handler(options, true)
            }),
            show_hidden: false,
        }
    }

    pub fn with_hidden(mut self, show_hidden: bool) -> Self {
        self.show_hidden = show_hidden;
        self
    }

    pub fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Runs the interaction. A `cd` result is written to `out` as a line the
    /// calling shell can evaluate.
    pub fn run<W: Write>(self, out: &mut W) -> Result<Outcome> {
        let App {
            enumerator,
            mut selector,
            sniffer,
            dispatcher,
            mut resolver,
            show_hidden,
        } = self;

        let mut session = Session::new(show_hidden);

        session.advance(Stage::Selecting);
        let selected = selector.select(&enumerator, &mut session.hidden)?;
        // The prompt selector holds stdin; the handler prompt needs it next.
        drop(selector);

        let Some(candidate) = selected else {
            debug!("selection cancelled");
            return Ok(session.finish(DispatchResult::Cancelled));
        };

        let path = enumerator.resolve(&candidate);
        let class: Classification = classify(&path, sniffer.as_ref());
        session.advance(Stage::Classified);

        let result = dispatcher.dispatch(&path, class, |options| {
            session.advance(Stage::Resolving);
            resolver(options)
        })?;

        if let DispatchResult::ChangeDirectory(dir) = &result {
            writeln!(out, "{}", cd_command(dir))?;
            out.flush()?;
        }

        Ok(session.finish(result))
    }
}
