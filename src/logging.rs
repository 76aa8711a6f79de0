//! Logging setup for the driver.
//!
//! Installs a `tracing-subscriber` writing to stderr or a file.
//!
//! ## Configuration priority
//!
//! 1. `log_level` / `log_file` connection properties
//! 2. `RUST_LOG` environment variable
//! 3. Default: `warn`
//!
//! ```bash
//! RUST_LOG=bigtable_sql=debug ./my_app
//! ```

use std::sync::OnceLock;
use tracing_subscriber::{
    fmt::{self, time::SystemTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

static LOGGING_INITIALIZED: OnceLock<()> = OnceLock::new();

const TARGET: &str = "bigtable_sql";

/// Logging options taken from connection properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogConfig {
    /// "off", "error", "warn", "info", "debug" or "trace"
    pub level: Option<String>,
    /// Log file path; stderr when unset
    pub file: Option<String>,
}

impl LogConfig {
    fn is_off(&self) -> bool {
        self.level
            .as_deref()
            .is_some_and(|level| level.eq_ignore_ascii_case("off"))
    }

    fn filter(&self) -> EnvFilter {
        match &self.level {
            Some(level) => EnvFilter::new(format!("{}={}", TARGET, level.to_lowercase())),
            None => EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("{}=warn", TARGET))),
        }
    }
}

/// Install the tracing subscriber.
///
/// Runs at most once per process; the first connection decides. Does nothing
/// when the level is `off` or another global subscriber is already set.
pub fn init_logging(config: &LogConfig) {
    LOGGING_INITIALIZED.get_or_init(|| {
        if config.is_off() {
            return;
        }
        let filter = config.filter();

        match &config.file {
            Some(path) => {
                let file = match std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                {
                    Ok(f) => f,
                    Err(e) => {
                        eprintln!("bigtable-sql: failed to open log file {}: {}", path, e);
                        return;
                    }
                };

                tracing_subscriber::registry()
                    .with(filter)
                    .with(
                        fmt::layer()
                            .with_writer(file)
                            .with_ansi(false)
                            .with_timer(SystemTime),
                    )
                    .try_init()
                    .ok();
            }
            None => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(
                        fmt::layer()
                            .with_writer(std::io::stderr)
                            .with_timer(SystemTime),
                    )
                    .try_init()
                    .ok();
            }
        }
    });
}
