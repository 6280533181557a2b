//! Test fixtures for conversion tests
//!
//! Two kinds of input: fakes (a metadata reader that returns canned values and
//! a transcoder that returns a fixed MP3 payload) for converter and batch
//! logic, and generated ALAC `.m4a` files for the real lofty/Symphonia/LAME
//! path.

#![cfg(test)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::audio::{Id3TagWriter, MetadataReader, SourceMetadata};
use crate::conversion::{AudioTranscoder, Converter};
use crate::error::ConvertError;

/// A single MPEG-1 layer III frame header followed by silence
pub const FAKE_MP3_BYTES: &[u8] = &[
    0xFF, 0xFB, 0x90, 0x64, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00,
];

/// Placeholder contents that [`FakeTranscoder`] refuses to decode
pub const CORRUPT_SOURCE: &[u8] = b"corrupt";

/// Metadata the fake reader returns for files without an override
pub fn default_metadata() -> SourceMetadata {
    SourceMetadata {
        title: "Test".to_string(),
        artist: "Artist".to_string(),
        track: 3,
        ..SourceMetadata::default()
    }
}

/// Returns canned metadata keyed by file name
#[derive(Debug, Clone, Default)]
pub struct FakeMetadataReader {
    overrides: HashMap<String, SourceMetadata>,
}

impl FakeMetadataReader {
    pub fn with(mut self, file_name: &str, metadata: SourceMetadata) -> Self {
        self.overrides.insert(file_name.to_string(), metadata);
        self
    }
}

impl MetadataReader for FakeMetadataReader {
    fn read_metadata(&self, path: &Path) -> Result<SourceMetadata, ConvertError> {
        if !path.exists() {
            return Err(ConvertError::InputAccess {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            });
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(self
            .overrides
            .get(&name)
            .cloned()
            .unwrap_or_else(default_metadata))
    }
}

/// Returns [`FAKE_MP3_BYTES`] unless the source holds [`CORRUPT_SOURCE`]
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeTranscoder;

impl AudioTranscoder for FakeTranscoder {
    fn transcode(&self, input: &Path) -> Result<Vec<u8>, ConvertError> {
        let bytes = std::fs::read(input).map_err(|source| ConvertError::InputAccess {
            path: input.to_path_buf(),
            source,
        })?;

        if bytes.starts_with(CORRUPT_SOURCE) {
            return Err(ConvertError::decode(input, "fake corrupt stream"));
        }
        Ok(FAKE_MP3_BYTES.to_vec())
    }
}

/// Always fails with a decode error
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingTranscoder;

impl AudioTranscoder for FailingTranscoder {
    fn transcode(&self, input: &Path) -> Result<Vec<u8>, ConvertError> {
        Err(ConvertError::decode(input, "always fails"))
    }
}

/// Converter with fake reader/transcoder and the real ID3 writer
pub fn fake_converter() -> Converter<FakeMetadataReader, FakeTranscoder, Id3TagWriter> {
    Converter::new(FakeMetadataReader::default(), FakeTranscoder, Id3TagWriter)
}

/// Write a placeholder source file that the fakes accept
pub fn write_placeholder_source(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"m4a placeholder").expect("Failed to write placeholder source");
    path
}

/// Write a placeholder source file that the fake transcoder rejects
pub fn write_corrupt_source(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, CORRUPT_SOURCE).expect("Failed to write corrupt source");
    path
}

// Real M4A sources: mono 16-bit ALAC with every frame stored uncompressed.
// Small enough to build in memory, and Symphonia and lofty read it like any
// iTunes file.

/// Sample rate of generated M4A sources
pub const ALAC_SAMPLE_RATE: u32 = 44_100;

/// Samples per ALAC frame (one MP4 sample per frame)
const ALAC_FRAME_LENGTH: u32 = 4096;

const ALAC_FRAME_COUNT: usize = 4;

/// Write a playable ALAC `.m4a` carrying the non-empty fields of `metadata`
///
/// `SourceMetadata::default()` produces a file with an empty `ilst`.
pub fn write_alac_source(dir: &Path, name: &str, metadata: &SourceMetadata) -> PathBuf {
    write_m4a(dir, name, &build_m4a(metadata, false))
}

/// Like [`write_alac_source`], with a chapter `text` track ahead of the audio track
pub fn write_alac_source_with_text_track(
    dir: &Path,
    name: &str,
    metadata: &SourceMetadata,
) -> PathBuf {
    write_m4a(dir, name, &build_m4a(metadata, true))
}

fn write_m4a(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("Failed to write M4A source");
    path
}

/// MSB-first bit packer for ALAC frames
#[derive(Default)]
struct BitWriter {
    bytes: Vec<u8>,
    used: u32,
}

impl BitWriter {
    fn push(&mut self, value: u32, bits: u32) {
        for i in (0..bits).rev() {
            if self.used == 0 {
                self.bytes.push(0);
            }
            let bit = ((value >> i) & 1) as u8;
            if let Some(last) = self.bytes.last_mut() {
                *last |= bit << (7 - self.used);
            }
            self.used = (self.used + 1) % 8;
        }
    }
}

/// One mono frame: SCE element with the escape flag set, raw samples, END tag
fn alac_frame(samples: &[i16]) -> Vec<u8> {
    let mut bits = BitWriter::default();
    bits.push(0, 3); // ID_SCE
    bits.push(0, 4); // element instance
    bits.push(0, 12); // unused
    bits.push(0, 1); // full frame
    bits.push(0, 2); // no shifted bytes
    bits.push(1, 1); // uncompressed
    for &sample in samples {
        bits.push(sample as u16 as u32, 16);
    }
    bits.push(7, 3); // ID_END
    bits.bytes
}

fn tone_frames() -> Vec<Vec<u8>> {
    let total = ALAC_FRAME_LENGTH as usize * ALAC_FRAME_COUNT;
    let samples: Vec<i16> = (0..total)
        .map(|i| {
            let t = i as f32 / ALAC_SAMPLE_RATE as f32;
            ((t * 440.0 * 2.0 * std::f32::consts::PI).sin() * 8000.0) as i16
        })
        .collect();
    samples
        .chunks(ALAC_FRAME_LENGTH as usize)
        .map(alac_frame)
        .collect()
}

fn atom(kind: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 8);
    out.extend_from_slice(&(body.len() as u32 + 8).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(body);
    out
}

/// Atom with a version/flags word (version 0)
fn full_atom(kind: &[u8; 4], flags: u32, body: &[u8]) -> Vec<u8> {
    atom(kind, &[&flags.to_be_bytes()[..], body].concat())
}

fn be32(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_be_bytes()).collect()
}

const IDENTITY_MATRIX: [u32; 9] = [0x0001_0000, 0, 0, 0, 0x0001_0000, 0, 0, 0, 0x4000_0000];

/// Sample table layout of one `trak`
struct TrackLayout {
    id: u32,
    handler: [u8; 4],
    media_header: Vec<u8>,
    sample_entry: Vec<u8>,
    sample_delta: u32,
    sample_sizes: Vec<u32>,
    chunk_offset: u32,
}

impl TrackLayout {
    fn duration(&self) -> u32 {
        self.sample_delta * self.sample_sizes.len() as u32
    }

    fn to_atom(&self) -> Vec<u8> {
        let count = self.sample_sizes.len() as u32;

        let tkhd = full_atom(
            b"tkhd",
            7,
            &[
                be32(&[0, 0, self.id, 0, self.duration(), 0, 0]),
                vec![0, 0, 0, 0, 0x01, 0x00, 0, 0],
                be32(&IDENTITY_MATRIX),
                be32(&[0, 0]),
            ]
            .concat(),
        );
        let mdhd = full_atom(
            b"mdhd",
            0,
            &[
                be32(&[0, 0, ALAC_SAMPLE_RATE, self.duration()]),
                vec![0x55, 0xC4, 0, 0],
            ]
            .concat(),
        );
        let hdlr = full_atom(
            b"hdlr",
            0,
            &[&be32(&[0])[..], &self.handler, &[0; 12], b"Handler\0"].concat(),
        );

        let stsd = full_atom(b"stsd", 0, &[be32(&[1]), self.sample_entry.clone()].concat());
        let stts = full_atom(b"stts", 0, &be32(&[1, count, self.sample_delta]));
        let stsc = full_atom(b"stsc", 0, &be32(&[1, 1, count, 1]));
        let stsz = full_atom(
            b"stsz",
            0,
            &[be32(&[0, count]), be32(&self.sample_sizes)].concat(),
        );
        let stco = full_atom(b"stco", 0, &be32(&[1, self.chunk_offset]));
        let stbl = atom(b"stbl", &[stsd, stts, stsc, stsz, stco].concat());

        let dref = full_atom(b"dref", 0, &[be32(&[1]), full_atom(b"url ", 1, &[])].concat());
        let dinf = atom(b"dinf", &dref);
        let minf = atom(b"minf", &[self.media_header.clone(), dinf, stbl].concat());
        let mdia = atom(b"mdia", &[mdhd, hdlr, minf].concat());

        atom(b"trak", &[tkhd, mdia].concat())
    }
}

fn alac_sample_entry(max_frame_bytes: u32) -> Vec<u8> {
    let cookie = [
        be32(&[ALAC_FRAME_LENGTH]),
        vec![0, 16, 40, 10, 14, 1, 0, 255], // version, depth, pb, mb, kb, channels, max run
        be32(&[max_frame_bytes, 0, ALAC_SAMPLE_RATE]),
    ]
    .concat();

    atom(
        b"alac",
        &[
            vec![0; 6],
            vec![0, 1], // data reference index
            vec![0; 8], // version, revision, vendor
            vec![0, 1, 0, 16, 0, 0, 0, 0], // channels, sample size, compression, packet size
            be32(&[ALAC_SAMPLE_RATE << 16]),
            full_atom(b"alac", 0, &cookie),
        ]
        .concat(),
    )
}

fn text_sample_entry() -> Vec<u8> {
    atom(b"text", &[vec![0; 6], vec![0, 1]].concat())
}

fn ilst_text(kind: &[u8; 4], value: &str) -> Vec<u8> {
    atom(kind, &atom(b"data", &[be32(&[1, 0]), value.as_bytes().to_vec()].concat()))
}

fn ilst(metadata: &SourceMetadata) -> Vec<u8> {
    let mut items = Vec::new();
    for (kind, value) in [
        (b"\xA9nam", &metadata.title),
        (b"\xA9ART", &metadata.artist),
        (b"\xA9alb", &metadata.album),
        (b"\xA9gen", &metadata.genre),
        (b"\xA9day", &metadata.year),
        (b"\xA9cmt", &metadata.comment),
    ] {
        if !value.is_empty() {
            items.extend(ilst_text(kind, value));
        }
    }
    if metadata.track != 0 {
        // reserved, number, total, reserved
        let mut pair = vec![0u8; 8];
        pair[2..4].copy_from_slice(&(metadata.track as u16).to_be_bytes());
        items.extend(atom(b"trkn", &atom(b"data", &[be32(&[0, 0]), pair].concat())));
    }
    atom(b"ilst", &items)
}

fn build_m4a(metadata: &SourceMetadata, with_text_track: bool) -> Vec<u8> {
    let frames = tone_frames();
    let audio_bytes: Vec<u8> = frames.concat();
    let text_sample = vec![0u8, 0];
    let ftyp = atom(b"ftyp", &[&b"M4A "[..], &[0; 4], b"M4A mp42isom"].concat());

    let moov = |mdat_start: u32| {
        let audio = TrackLayout {
            id: 1,
            handler: *b"soun",
            media_header: full_atom(b"smhd", 0, &[0; 4]),
            sample_entry: alac_sample_entry(
                frames.iter().map(|f| f.len() as u32).max().unwrap_or(0),
            ),
            sample_delta: ALAC_FRAME_LENGTH,
            sample_sizes: frames.iter().map(|f| f.len() as u32).collect(),
            chunk_offset: mdat_start,
        };
        let text = TrackLayout {
            id: 2,
            handler: *b"text",
            media_header: full_atom(b"nmhd", 0, &[]),
            sample_entry: text_sample_entry(),
            sample_delta: audio.duration(),
            sample_sizes: vec![text_sample.len() as u32],
            chunk_offset: mdat_start + audio_bytes.len() as u32,
        };

        let mvhd = full_atom(
            b"mvhd",
            0,
            &[
                be32(&[0, 0, ALAC_SAMPLE_RATE, audio.duration(), 0x0001_0000]),
                vec![0x01, 0x00],
                vec![0; 10],
                be32(&IDENTITY_MATRIX),
                vec![0; 24],
                be32(&[3]),
            ]
            .concat(),
        );
        let meta_hdlr = full_atom(
            b"hdlr",
            0,
            &[&be32(&[0])[..], b"mdirappl", &[0; 8], &[0]].concat(),
        );
        let udta = atom(
            b"udta",
            &full_atom(b"meta", 0, &[meta_hdlr, ilst(metadata)].concat()),
        );

        let traks = if with_text_track {
            [text.to_atom(), audio.to_atom()].concat()
        } else {
            audio.to_atom()
        };
        atom(b"moov", &[mvhd, traks, udta].concat())
    };

    // Offsets are fixed-width, so the moov size does not depend on them
    let mdat_start = (ftyp.len() + moov(0).len() + 8) as u32;
    let mut mdat_body = audio_bytes.clone();
    if with_text_track {
        mdat_body.extend_from_slice(&text_sample);
    }

    [ftyp, moov(mdat_start), atom(b"mdat", &mdat_body)].concat()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alac_frame_is_byte_aligned() {
        let frame = alac_frame(&[0x1234, -1]);
        // 23 header bits + 2 * 16 sample bits + 3 end bits
        assert_eq!(frame.len(), (23 + 32 + 3 + 7) / 8);
        assert_eq!(frame[2], 0x02, "escape flag is the last header bit");
    }

    #[test]
    fn test_generated_m4a_layout() {
        let bytes = build_m4a(&default_metadata(), false);
        assert_eq!(&bytes[4..8], b"ftyp");

        let ftyp_len = u32::from_be_bytes(bytes[0..4].try_into().unwrap()) as usize;
        assert_eq!(&bytes[ftyp_len + 4..ftyp_len + 8], b"moov");
    }

    #[test]
    fn test_fake_reader_uses_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_placeholder_source(dir.path(), "custom.m4a");
        let custom = SourceMetadata {
            title: "Custom".to_string(),
            ..SourceMetadata::default()
        };

        let reader = FakeMetadataReader::default().with("custom.m4a", custom.clone());
        assert_eq!(reader.read_metadata(&path).unwrap(), custom);
    }

    #[test]
    fn test_fake_transcoder_rejects_corrupt_source() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_placeholder_source(dir.path(), "good.m4a");
        let bad = write_corrupt_source(dir.path(), "bad.m4a");

        assert_eq!(FakeTranscoder.transcode(&good).unwrap(), FAKE_MP3_BYTES);
        assert!(FakeTranscoder.transcode(&bad).is_err());
    }
}
