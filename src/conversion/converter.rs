//! Single-file conversion
//!
//! Pipeline per file: read source metadata -> transcode to MP3 -> stage the
//! audio in a temp file next to the destination -> tag it -> rename into
//! place. The destination only ever appears fully encoded and tagged.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::audio::{
    output_file_name, Id3TagWriter, MetadataReader, Mp4MetadataReader, TagWriter,
};
use crate::error::ConvertError;

use super::transcoder::{AudioTranscoder, EncoderSettings, LameTranscoder};

/// One source file and where its MP3 goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
}

impl ConversionJob {
    /// Build a job for an M4A file name found in `input_dir`
    ///
    /// Returns `None` when the name is not an M4A source.
    pub fn for_source(input_dir: &Path, output_dir: &Path, file_name: &str) -> Option<Self> {
        let output_name = output_file_name(file_name)?;
        Some(Self {
            input_path: input_dir.join(file_name),
            output_path: output_dir.join(output_name),
        })
    }
}

/// Converts files using pluggable metadata, audio and tag backends
#[derive(Debug, Clone, Default)]
pub struct Converter<R, T, W> {
    reader: R,
    transcoder: T,
    writer: W,
}

/// The production converter: lofty + Symphonia/LAME + id3
pub type Mp3Converter = Converter<Mp4MetadataReader, LameTranscoder, Id3TagWriter>;

impl Mp3Converter {
    pub fn with_settings(settings: EncoderSettings) -> Self {
        Converter::new(
            Mp4MetadataReader,
            LameTranscoder::new(settings),
            Id3TagWriter,
        )
    }
}

impl<R, T, W> Converter<R, T, W>
where
    R: MetadataReader,
    T: AudioTranscoder,
    W: TagWriter,
{
    pub fn new(reader: R, transcoder: T, writer: W) -> Self {
        Self {
            reader,
            transcoder,
            writer,
        }
    }

    /// Convert one M4A file into a tagged MP3 at `output_path`
    ///
    /// The parent directory of `output_path` must already exist. An existing
    /// file at `output_path` is replaced.
    pub fn convert_one(&self, input_path: &Path, output_path: &Path) -> Result<(), ConvertError> {
        log::info!(
            "Converting: {} -> {}",
            input_path.display(),
            output_path.display()
        );

        let metadata = self.reader.read_metadata(input_path)?;
        let mp3 = self.transcoder.transcode(input_path)?;

        let parent = match output_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut staged = tempfile::Builder::new()
            .prefix(".m4a2mp3-")
            .suffix(".mp3")
            .tempfile_in(parent)
            .map_err(|source| ConvertError::OutputAccess {
                path: parent.to_path_buf(),
                source,
            })?;

        staged
            .write_all(&mp3)
            .and_then(|()| staged.flush())
            .map_err(|source| ConvertError::OutputAccess {
                path: staged.path().to_path_buf(),
                source,
            })?;

        self.writer.write_tags(staged.path(), &metadata)?;

        staged
            .persist(output_path)
            .map_err(|e| ConvertError::OutputAccess {
                path: output_path.to_path_buf(),
                source: e.error,
            })?;

        // Temp files are created owner-only; give the result normal permissions
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) =
                std::fs::set_permissions(output_path, std::fs::Permissions::from_mode(0o644))
            {
                log::warn!(
                    "Could not set permissions on {}: {}",
                    output_path.display(),
                    e
                );
            }
        }

        log::debug!("Finished {}", output_path.display());
        Ok(())
    }

    /// Convert a prepared job
    pub fn convert_job(&self, job: &ConversionJob) -> Result<(), ConvertError> {
        self.convert_one(&job.input_path, &job.output_path)
    }
}
