//! Source metadata extraction
//!
//! Reads the iTunes-style atoms of an M4A file into a [`SourceMetadata`].
//! Atoms map onto lofty's generic keys:
//! - `©nam` title, `©ART` artist, `©alb` album, `©gen` genre
//! - `trkn` track number (numerator of the number/total pair)
//! - `©day` year, `©cmt` comment
//!
//! Any missing atom becomes an empty string (or 0 for the track).

use std::borrow::Cow;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use lofty::{Accessor, FileType, ItemKey, Probe, Tag, TagType, TaggedFileExt};

use crate::error::ConvertError;

/// Metadata copied from the source container into the output tags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub genre: String,
    pub track: u32,
    pub year: String,
    pub comment: String,
}

impl SourceMetadata {
    /// Build metadata from a parsed tag, defaulting absent fields
    pub fn from_tag(tag: &Tag) -> Self {
        Self {
            title: owned(tag.title()),
            artist: owned(tag.artist()),
            album: owned(tag.album()),
            genre: owned(tag.genre()),
            track: tag.track().unwrap_or(0),
            year: tag
                .get_string(&ItemKey::RecordingDate)
                .unwrap_or_default()
                .to_string(),
            comment: owned(tag.comment()),
        }
    }
}

fn owned(value: Option<Cow<'_, str>>) -> String {
    value.map(Cow::into_owned).unwrap_or_default()
}

/// Reads [`SourceMetadata`] from a source file
pub trait MetadataReader {
    fn read_metadata(&self, path: &Path) -> Result<SourceMetadata, ConvertError>;
}

/// Reads the `ilst` atoms of an MP4-family file with lofty
#[derive(Debug, Clone, Copy, Default)]
pub struct Mp4MetadataReader;

impl MetadataReader for Mp4MetadataReader {
    fn read_metadata(&self, path: &Path) -> Result<SourceMetadata, ConvertError> {
        let file = File::open(path).map_err(|source| ConvertError::InputAccess {
            path: path.to_path_buf(),
            source,
        })?;

        // The extension already selected this file, so skip content sniffing
        let tagged_file = Probe::new(BufReader::new(file))
            .set_file_type(FileType::Mp4)
            .read()
            .map_err(|e| ConvertError::decode(path, format!("failed to read MP4 atoms: {e}")))?;

        let metadata = match tagged_file.tag(TagType::Mp4Ilst) {
            Some(tag) => SourceMetadata::from_tag(tag),
            None => {
                log::debug!("No ilst atoms in {}, using empty metadata", path.display());
                SourceMetadata::default()
            }
        };

        log::debug!("Read metadata from {}: {:?}", path.display(), metadata);
        Ok(metadata)
    }
}
