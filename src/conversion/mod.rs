//! Audio conversion module
//!
//! Handles transcoding M4A files to tagged MP3s, one file or a whole
//! directory at a time.

mod batch;
mod converter;
mod report;
mod transcoder;

pub use batch::{run_batch, FailurePolicy, FileOutcome};
pub use converter::{Converter, Mp3Converter};
pub use report::BatchReport;
pub use transcoder::{AudioTranscoder, EncoderSettings, SUPPORTED_BITRATES};
