//! Tracing setup.
//!
//! The TUI owns the terminal, so events are appended to a log file in the data
//! directory instead of being printed.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::Result;

/// Environment variable overriding the configured log filter.
pub const LOG_ENV: &str = "TM_LOG";

/// Install the global subscriber writing to `log_path`.
///
/// `TM_LOG` wins over `default_level`. Calling this twice is harmless; the
/// second subscriber is dropped.
pub fn init_logging(log_path: &Path, default_level: &str) -> Result<()> {
    if let Some(dir) = log_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(log_path)?;

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(format!("{}={default_level}", env!("CARGO_CRATE_NAME"))));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_creates_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("tm.log");
        init_logging(&path, "debug").unwrap();
        init_logging(&path, "debug").unwrap();
        assert!(path.exists());
    }
}
