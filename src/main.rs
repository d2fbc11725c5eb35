use fopen::app::{enumerator_for, sniffer_for, App};
use fopen::cli::{AppConfig, Args, Mode};
use fopen::config::UserConfig;
use fopen::domain::enumerator::write_nul_delimited;
use fopen::error::Result;
use fopen::{logging, preview};

use std::io::{self, BufWriter};
use std::path::Path;
use tracing::warn;

fn main() {
    // Parse command line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let (user, load_error) = match UserConfig::load() {
        Ok(user) => (user, None),
        Err(e) => {
            let mut user = UserConfig::default();
            user.apply_process_env();
            (user, Some(e))
        }
    };

    logging::init(&user.log_level);
    if let Some(e) = load_error {
        warn!("Failed to load user config, using defaults: {}", e);
    }

    let config = AppConfig::new(&args, user);

    match run(&args, &config) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

/// Runs one invocation and returns the process exit code
fn run(args: &Args, config: &AppConfig) -> Result<i32> {
    match args.mode() {
        Mode::Run => {
            let app = App::from_config(config)?;
            let outcome = app.run(&mut io::stdout().lock())?;
            Ok(outcome.exit_code())
        }
        Mode::List => {
            // The fzf bindings pass --hidden explicitly, so the configured
            // default must not leak into the "off" reload.
            list(&config.user, args.hidden)?;
            Ok(0)
        }
        Mode::Preview(path) => {
            show_preview(&path, config)?;
            Ok(0)
        }
        Mode::InitConfig => {
            let path = UserConfig::write_default()?;
            println!("{}", path.display());
            Ok(0)
        }
        Mode::PrintConfig => {
            println!("{}", config.user.to_json()?);
            Ok(0)
        }
    }
}

/// Streams NUL-delimited candidates for the fzf reload binding
fn list(user: &UserConfig, hidden: bool) -> Result<()> {
    let enumerator = enumerator_for(user);

    let mut out = BufWriter::new(io::stdout().lock());
    let paths = enumerator.enumerate(hidden).map(|c| c.path);

    match write_nul_delimited(&mut out, paths) {
        // fzf discards the old list when the binding fires again
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => Ok(other?),
    }
}

fn show_preview(path: &Path, config: &AppConfig) -> Result<()> {
    let sniffer = sniffer_for(config.user.sniffer)?;
    let mut out = io::stdout().lock();
    match preview::render(&mut out, path, sniffer.as_ref(), true) {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => Ok(other?),
    }
}
