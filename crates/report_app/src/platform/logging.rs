//! Process logging for report_app.
//!
//! Logs go to a file so they never interleave with the terminal screen. The
//! path comes from `CSE_REPORTS_LOG`, falling back to `./report_app.log`.

use std::path::PathBuf;

use log::LevelFilter;
use report_logging::LogDestination;

pub const ENV_LOG_PATH: &str = "CSE_REPORTS_LOG";
const DEFAULT_LOG_PATH: &str = "./report_app.log";

pub fn initialize() {
    let path = log_path(std::env::var(ENV_LOG_PATH).ok());
    if !report_logging::initialize(LogDestination::File(path.clone()), LevelFilter::Info) {
        eprintln!("Warning: logging disabled, could not open {}", path.display());
    }
}

fn log_path(configured: Option<String>) -> PathBuf {
    configured
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_PATH))
}
