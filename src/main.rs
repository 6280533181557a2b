//! m4a2mp3 - batch M4A to MP3 converter
//!
//! Converts every `.m4a` file in a directory into an MP3 in another
//! directory, copying title, artist, album, genre, track, year and comment
//! into ID3v2.3 frames.

mod audio;
mod conversion;
mod core;
mod error;
mod logging;
#[cfg(test)]
mod test_fixtures;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Local;
use clap::Parser;

use crate::conversion::{run_batch, BatchReport, FileOutcome, Mp3Converter, SUPPORTED_BITRATES};
use crate::core::{resolve_directory, AppSettings};

/// Command-line arguments for m4a2mp3
#[derive(Parser, Debug)]
#[command(name = "m4a2mp3")]
#[command(about = "Convert M4A files to MP3 with ID3v2.3 tags")]
#[command(version)]
struct Args {
    /// Directory containing M4A files ("." for the current directory)
    #[arg(short = 'd', long = "directory")]
    directory: PathBuf,

    /// Output directory, created if missing ("." for the current directory)
    #[arg(short = 'o', long = "output-dir")]
    output_dir: PathBuf,

    /// Keep converting after a file fails instead of stopping
    #[arg(long)]
    keep_going: bool,

    /// Constant MP3 bitrate in kbps (encoder default when omitted)
    #[arg(long, value_parser = parse_bitrate)]
    bitrate: Option<u32>,

    /// Write a JSON summary of the run to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Show debug output on stderr
    #[arg(short, long)]
    verbose: bool,

    /// Also append log output to the log file
    #[arg(long)]
    log_file: bool,

    /// Store --keep-going, --bitrate and --log-file as defaults for later runs
    #[arg(long)]
    save_settings: bool,
}

fn parse_bitrate(value: &str) -> Result<u32, String> {
    let kbps: u32 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if SUPPORTED_BITRATES.contains(&kbps) {
        Ok(kbps)
    } else {
        Err(format!(
            "unsupported bitrate {} (expected one of {:?})",
            kbps, SUPPORTED_BITRATES
        ))
    }
}

/// Merge command-line flags over persisted settings
fn effective_settings(args: &Args, stored: AppSettings) -> AppSettings {
    AppSettings {
        bitrate: args.bitrate.or(stored.bitrate),
        keep_going: args.keep_going || stored.keep_going,
        log_to_file: args.log_file || stored.log_to_file,
    }
}

fn write_report(path: &Path, report: &BatchReport) {
    match report.save(path) {
        Ok(()) => log::info!("Report written to {}", path.display()),
        Err(e) => log::error!("{}", e),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Settings are read before logging exists, so load quietly first
    let settings = effective_settings(&args, AppSettings::load());
    if let Some(log_path) = logging::init_logging(args.verbose, settings.log_to_file) {
        log::info!("Logging to {}", log_path.display());
    }

    if args.save_settings {
        match settings.save() {
            Ok(path) => log::info!("Saved settings to {}", path.display()),
            Err(e) => log::warn!("Could not save settings: {}", e),
        }
    }

    let (input_dir, output_dir) = match (
        resolve_directory(&args.directory),
        resolve_directory(&args.output_dir),
    ) {
        (Ok(input), Ok(output)) => (input, output),
        (Err(e), _) | (_, Err(e)) => {
            log::error!("Could not determine the current directory: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let started_at = Local::now();
    let converter = Mp3Converter::with_settings(settings.encoder_settings());
    let mut stdout = std::io::stdout().lock();

    let outcomes = match run_batch(
        &converter,
        &input_dir,
        &output_dir,
        settings.failure_policy(),
        &mut stdout,
    ) {
        Ok(outcomes) => outcomes,
        Err(e) => {
            log::error!("{}", e);
            if let Some(path) = &args.report {
                write_report(path, &BatchReport::new(started_at, &input_dir, &output_dir, &[]));
            }
            return ExitCode::FAILURE;
        }
    };

    if let Some(path) = &args.report {
        write_report(
            path,
            &BatchReport::new(started_at, &input_dir, &output_dir, &outcomes),
        );
    }

    if outcomes.iter().all(FileOutcome::is_success) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
