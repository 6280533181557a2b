//! ID3v2.3 tag writing for converted files
//!
//! Every field of [`SourceMetadata`] is written, even when empty, so the
//! output always carries the same seven frames.

use std::path::Path;

use id3::frame::Comment;
use id3::{Tag, TagLike, Version};

use super::SourceMetadata;
use crate::error::ConvertError;

/// Language marker on the COMM frame
pub const COMMENT_LANG: &str = "eng";

/// Writes metadata onto an already encoded MP3 file
pub trait TagWriter {
    fn write_tags(&self, path: &Path, metadata: &SourceMetadata) -> Result<(), ConvertError>;
}

/// Writes ID3v2.3 frames with the `id3` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct Id3TagWriter;

/// Build the tag for `metadata`, replacing frames of the same ids in `tag`
pub fn apply_metadata(tag: &mut Tag, metadata: &SourceMetadata) {
    tag.set_text("TIT2", metadata.title.clone());
    tag.set_text("TPE1", metadata.artist.clone());
    tag.set_text("TALB", metadata.album.clone());
    tag.set_text("TCON", metadata.genre.clone());
    tag.set_text("TRCK", metadata.track.to_string());
    tag.set_text("TYER", metadata.year.clone());

    // COMM: replace with a single "eng" comment
    let _ = tag.remove("COMM");
    let _ = tag.add_frame(Comment {
        lang: COMMENT_LANG.to_string(),
        description: String::new(),
        text: metadata.comment.clone(),
    });
}

impl TagWriter for Id3TagWriter {
    fn write_tags(&self, path: &Path, metadata: &SourceMetadata) -> Result<(), ConvertError> {
        // Start from whatever the encoder left behind; a missing tag is normal
        let mut tag = match Tag::read_from_path(path) {
            Ok(tag) => tag,
            Err(e) if matches!(e.kind, id3::ErrorKind::NoTag) => Tag::new(),
            Err(e) => {
                log::debug!("Discarding unreadable tag on {}: {}", path.display(), e);
                Tag::new()
            }
        };

        apply_metadata(&mut tag, metadata);

        tag.write_to_path(path, Version::Id3v23)
            .map_err(|e| ConvertError::TagWrite {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        log::debug!("Wrote ID3v2.3 tags to {}", path.display());
        Ok(())
    }
}
