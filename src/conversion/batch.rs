//! Directory-to-directory batch conversion
//!
//! Files are converted one at a time in directory-listing order. The output
//! directory is created once, before the first job.

use std::io::Write;
use std::path::Path;

use crate::audio::{MetadataReader, TagWriter};
use crate::core::scan_sources;
use crate::error::ConvertError;

use super::converter::ConversionJob;
use super::{AudioTranscoder, Converter};

/// What to do after a file fails to convert
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop the batch at the first failure
    #[default]
    FailFast,
    /// Record the failure and move on to the next file
    KeepGoing,
}

/// Result of converting one file
#[derive(Debug)]
pub struct FileOutcome {
    /// Source file name (no directory)
    pub source: String,
    /// Destination file name (no directory)
    pub destination: String,
    pub result: Result<(), ConvertError>,
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Status line printed for each converted file
pub fn status_line(source: &str, destination: &str) -> String {
    format!("Converted {} to {}", source, destination)
}

/// Convert every M4A file in `input_dir` into `output_dir`
///
/// Writes one status line per converted file to `status`. Returns an error
/// only for directory-level problems; per-file failures are recorded in the
/// outcomes (under [`FailurePolicy::FailFast`] the failed file is the last one).
pub fn run_batch<R, T, W>(
    converter: &Converter<R, T, W>,
    input_dir: &Path,
    output_dir: &Path,
    policy: FailurePolicy,
    status: &mut impl Write,
) -> Result<Vec<FileOutcome>, ConvertError>
where
    R: MetadataReader,
    T: AudioTranscoder,
    W: TagWriter,
{
    std::fs::create_dir_all(output_dir).map_err(|source| ConvertError::OutputAccess {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let sources = scan_sources(input_dir)?;
    log::info!(
        "Converting {} file(s) from {} to {}",
        sources.len(),
        input_dir.display(),
        output_dir.display()
    );

    let mut outcomes = Vec::with_capacity(sources.len());

    for name in sources {
        let Some(job) = ConversionJob::for_source(input_dir, output_dir, &name) else {
            continue;
        };
        let destination = job
            .output_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let result = converter.convert_job(&job);

        match &result {
            Ok(()) => {
                writeln!(status, "{}", status_line(&name, &destination)).map_err(|source| {
                    ConvertError::OutputAccess {
                        path: job.output_path.clone(),
                        source,
                    }
                })?;
            }
            Err(e) => log::error!("Failed to convert {}: {}", name, e),
        }

        let failed = result.is_err();
        outcomes.push(FileOutcome {
            source: name,
            destination,
            result,
        });

        if failed && policy == FailurePolicy::FailFast {
            log::warn!("Stopping batch after first failure");
            break;
        }
    }

    let converted = outcomes.iter().filter(|o| o.is_success()).count();
    log::info!(
        "Batch finished: {} converted, {} failed",
        converted,
        outcomes.len() - converted
    );

    Ok(outcomes)
}
