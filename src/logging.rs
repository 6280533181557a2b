//! Logging configuration for m4a2mp3
//!
//! Diagnostics go to stderr so stdout carries only the per-file
//! `Converted ...` lines. With file logging enabled, output is also appended to
//! `<data_local_dir>/m4a2mp3/logs/m4a2mp3.log`.

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

const LOG_FILE_NAME: &str = "m4a2mp3.log";

/// Rotate the log once it grows past this many bytes
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Get the log directory path
pub fn get_log_directory() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("m4a2mp3").join("logs"))
}

fn log_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_thread_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .build()
}

fn terminal_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Move an oversized log aside as `<name>.old`
fn rotate_if_large(log_path: &Path) {
    if let Ok(metadata) = fs::metadata(log_path) {
        if metadata.len() > MAX_LOG_SIZE {
            let _ = fs::rename(log_path, log_path.with_extension("log.old"));
        }
    }
}

/// Initialize the logging system
///
/// Returns the path of the log file when file logging is active.
pub fn init_logging(verbose: bool, log_to_file: bool) -> Option<PathBuf> {
    if !log_to_file {
        init_terminal_only(verbose);
        return None;
    }

    let Some(log_dir) = get_log_directory() else {
        init_terminal_only(verbose);
        log::warn!("Could not determine log directory, logging to terminal only");
        return None;
    };

    if let Err(e) = fs::create_dir_all(&log_dir) {
        init_terminal_only(verbose);
        log::warn!("Could not create log directory: {}", e);
        return None;
    }

    let log_path = log_dir.join(LOG_FILE_NAME);
    rotate_if_large(&log_path);

    let log_file = match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(f) => f,
        Err(e) => {
            init_terminal_only(verbose);
            log::warn!("Could not open log file: {}", e);
            return None;
        }
    };

    let config = log_config();
    let loggers: Vec<Box<dyn SharedLogger>> = vec![
        TermLogger::new(
            terminal_level(verbose),
            config.clone(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Debug, config, log_file),
    ];

    if CombinedLogger::init(loggers).is_err() {
        eprintln!("Warning: Logger already initialized");
    }

    log::debug!("=== m4a2mp3 session started ===");
    log::debug!("Log file: {}", log_path.display());

    Some(log_path)
}

/// Initialize terminal-only logging
fn init_terminal_only(verbose: bool) {
    let term_logger = TermLogger::new(
        terminal_level(verbose),
        log_config(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
    let _ = CombinedLogger::init(vec![term_logger]);
}
