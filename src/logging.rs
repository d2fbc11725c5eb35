//! Diagnostic logging on stderr.
//!
//! Quiet by default (`warn`). The level comes from, in order of precedence:
//! `RUST_LOG`, then `FOPEN_LOG` / the `log_level` config key.
//!
//! ```bash
//! RUST_LOG=debug fopen
//! RUST_LOG=fopen::domain=trace fopen --hidden
//! ```
//!
//! Logs never go to stdout, which is reserved for `cd` lines and `--list`
//! output.

use std::sync::Once;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub const DEFAULT_LEVEL: &str = "warn";

static INIT: Once = Once::new();

/// Compact time format: HH:MM:SS.mmm
struct CompactTime;

impl FormatTime for CompactTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Builds the filter for a configured level, letting `RUST_LOG` win
fn filter_for(level: &str) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
}

/// Initialize logging at `level`.
///
/// Only the first call takes effect.
pub fn init(level: &str) {
    INIT.call_once(|| {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_timer(CompactTime)
            .with_level(true)
            .with_filter(filter_for(level));

        tracing_subscriber::registry().with(fmt_layer).init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init("debug");
        init("error");
        tracing::debug!("logging initialized twice without panicking");
    }

    #[test]
    fn test_invalid_level_falls_back() {
        let filter = filter_for("fopen=verbose");
        if std::env::var("RUST_LOG").is_err() {
            assert_eq!(filter.to_string(), DEFAULT_LEVEL);
        }
    }
}
