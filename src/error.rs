//! Error types for the converter
//!
//! Every variant names the file it concerns so a failed batch can be
//! reported per file without extra bookkeeping.

use std::path::PathBuf;

use thiserror::Error;

/// Failure converting a file or preparing a batch
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Source directory or file could not be read
    #[error("cannot read {}: {source}", path.display())]
    InputAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Container or codec is malformed or unsupported
    #[error("cannot decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    /// The MP3 encoder rejected its parameters or input
    #[error("cannot encode {}: {message}", path.display())]
    Encode { path: PathBuf, message: String },

    /// ID3 frames could not be written to the output
    #[error("cannot write tags to {}: {message}", path.display())]
    TagWrite { path: PathBuf, message: String },

    /// Destination directory or file could not be created
    #[error("cannot write {}: {source}", path.display())]
    OutputAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConvertError {
    pub fn decode(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn encode(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Encode {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Short machine-friendly label used in reports
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InputAccess { .. } => "input_access",
            Self::Decode { .. } => "decode",
            Self::Encode { .. } => "encode",
            Self::TagWrite { .. } => "tag_write",
            Self::OutputAccess { .. } => "output_access",
        }
    }
}
