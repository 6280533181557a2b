// Audio module - contains source detection, metadata reading and tag writing

pub mod detection;
pub mod metadata;
pub mod metadata_writer;

pub use detection::{is_m4a_name, output_file_name};
pub use metadata::{MetadataReader, Mp4MetadataReader, SourceMetadata};
pub use metadata_writer::{Id3TagWriter, TagWriter};
