//! M4A to MP3 transcoding
//!
//! Decodes the default track with Symphonia and feeds the PCM straight into
//! LAME, so no intermediate WAV ever touches the disk.

use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use mp3lame_encoder::{Bitrate, Builder, DualPcm, Encoder, FlushNoGap, MonoPcm};
use symphonia::core::audio::{SampleBuffer, SignalSpec};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::ConvertError;

/// CBR bitrates (kbps) LAME accepts for MPEG-1/2 layer III
pub const SUPPORTED_BITRATES: [u32; 16] = [
    8, 16, 24, 32, 40, 48, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320,
];

/// Upper bound LAME needs for a flush
const FLUSH_BUFFER_SIZE: usize = 7200;

/// Decodes a source file and returns the complete MP3 stream
pub trait AudioTranscoder {
    fn transcode(&self, input: &Path) -> Result<Vec<u8>, ConvertError>;
}

/// Encoder knobs; `None` keeps the LAME default
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncoderSettings {
    pub bitrate: Option<u32>,
}

/// Map a kbps value to LAME's bitrate table
pub fn lame_bitrate(kbps: u32) -> Option<Bitrate> {
    let bitrate = match kbps {
        8 => Bitrate::Kbps8,
        16 => Bitrate::Kbps16,
        24 => Bitrate::Kbps24,
        32 => Bitrate::Kbps32,
        40 => Bitrate::Kbps40,
        48 => Bitrate::Kbps48,
        64 => Bitrate::Kbps64,
        80 => Bitrate::Kbps80,
        96 => Bitrate::Kbps96,
        112 => Bitrate::Kbps112,
        128 => Bitrate::Kbps128,
        160 => Bitrate::Kbps160,
        192 => Bitrate::Kbps192,
        224 => Bitrate::Kbps224,
        256 => Bitrate::Kbps256,
        320 => Bitrate::Kbps320,
        _ => return None,
    };
    Some(bitrate)
}

/// Symphonia decoder + LAME encoder
#[derive(Debug, Clone, Copy, Default)]
pub struct LameTranscoder {
    settings: EncoderSettings,
}

impl LameTranscoder {
    pub fn new(settings: EncoderSettings) -> Self {
        Self { settings }
    }
}

impl AudioTranscoder for LameTranscoder {
    fn transcode(&self, input: &Path) -> Result<Vec<u8>, ConvertError> {
        let file = File::open(input).map_err(|source| ConvertError::InputAccess {
            path: input.to_path_buf(),
            source,
        })?;
        let mss = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

        let mut hint = Hint::new();
        hint.with_extension("m4a");

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| ConvertError::decode(input, format!("format probe failed: {e}")))?;

        let mut format = probed.format;

        // iTunes files may carry chapter text tracks; take the first decodable one
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| ConvertError::decode(input, "no supported audio track"))?;
        let track_id = track.id;

        // Clone so `format` can be borrowed mutably for packets
        let codec_params = track.codec_params.clone();

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| ConvertError::decode(input, format!("decoder init failed: {e}")))?;

        let mut sink = Mp3Sink::new(self.settings);

        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
                Err(SymphoniaError::IoError(source)) => {
                    return Err(ConvertError::InputAccess {
                        path: input.to_path_buf(),
                        source,
                    });
                }
                Err(SymphoniaError::ResetRequired) => {
                    decoder.reset();
                    continue;
                }
                Err(e) => return Err(ConvertError::decode(input, format!("read error: {e}"))),
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(SymphoniaError::DecodeError(e)) => {
                    log::warn!("Skipping corrupt packet in {}: {}", input.display(), e);
                    continue;
                }
                Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
                Err(SymphoniaError::ResetRequired) => {
                    decoder.reset();
                    continue;
                }
                Err(e) => return Err(ConvertError::decode(input, format!("decode error: {e}"))),
            };

            let frames = decoded.frames();
            if frames == 0 {
                continue;
            }

            let spec = SignalSpec::new(decoded.spec().rate, decoded.spec().channels.clone());
            let (channels, rate) = (spec.channels.count(), spec.rate);
            let mut samples = SampleBuffer::<i16>::new(frames as u64, spec);
            samples.copy_interleaved_ref(decoded);

            sink.push_interleaved(samples.samples(), channels, rate)
                .map_err(|msg| ConvertError::encode(input, msg))?;
        }

        let mp3 = sink
            .finish()
            .map_err(|msg| ConvertError::encode(input, msg))?
            .ok_or_else(|| ConvertError::decode(input, "stream contained no audio"))?;

        log::debug!(
            "Transcoded {} into {} bytes of MP3",
            input.display(),
            mp3.len()
        );
        Ok(mp3)
    }
}

/// Accumulates MP3 output from interleaved PCM chunks
///
/// The LAME encoder is created from the first chunk's format.
pub(crate) struct Mp3Sink {
    settings: EncoderSettings,
    encoder: Option<Encoder>,
    format: Option<(usize, u32)>,
    left: Vec<i16>,
    right: Vec<i16>,
    out: Vec<u8>,
}

impl Mp3Sink {
    pub(crate) fn new(settings: EncoderSettings) -> Self {
        Self {
            settings,
            encoder: None,
            format: None,
            left: Vec::new(),
            right: Vec::new(),
            out: Vec::new(),
        }
    }

    /// Encode one chunk of interleaved samples
    ///
    /// Mono stays mono; anything wider is reduced to its first two channels.
    pub(crate) fn push_interleaved(
        &mut self,
        samples: &[i16],
        channels: usize,
        sample_rate: u32,
    ) -> Result<(), String> {
        if channels == 0 {
            return Err("decoded audio has no channels".to_string());
        }

        let encoder_channels = channels.min(2);
        match self.format {
            None => {
                self.encoder = Some(build_encoder(
                    encoder_channels as u8,
                    sample_rate,
                    self.settings,
                )?);
                self.format = Some((encoder_channels, sample_rate));
            }
            Some(format) if format != (encoder_channels, sample_rate) => {
                return Err(format!(
                    "audio format changed mid-stream: {} ch @ {} Hz -> {} ch @ {} Hz",
                    format.0, format.1, encoder_channels, sample_rate
                ));
            }
            Some(_) => {}
        }

        let Some(encoder) = self.encoder.as_mut() else {
            return Err("encoder not initialized".to_string());
        };

        self.left.clear();
        self.right.clear();
        for frame in samples.chunks_exact(channels) {
            self.left.push(frame[0]);
            if encoder_channels == 2 {
                self.right.push(frame[1]);
            }
        }

        self.out
            .reserve(mp3lame_encoder::max_required_buffer_size(self.left.len()));

        let result = if encoder_channels == 1 {
            encoder.encode_to_vec(MonoPcm(self.left.as_slice()), &mut self.out)
        } else {
            encoder.encode_to_vec(
                DualPcm {
                    left: self.left.as_slice(),
                    right: self.right.as_slice(),
                },
                &mut self.out,
            )
        };

        result.map_err(|e| format!("LAME encode failed: {e:?}"))?;
        Ok(())
    }

    /// Flush the encoder; `None` when no audio was ever pushed
    pub(crate) fn finish(mut self) -> Result<Option<Vec<u8>>, String> {
        let Some(encoder) = self.encoder.as_mut() else {
            return Ok(None);
        };

        self.out.reserve(FLUSH_BUFFER_SIZE);
        encoder
            .flush_to_vec::<FlushNoGap>(&mut self.out)
            .map_err(|e| format!("LAME flush failed: {e:?}"))?;

        Ok(Some(self.out))
    }
}

fn build_encoder(
    channels: u8,
    sample_rate: u32,
    settings: EncoderSettings,
) -> Result<Encoder, String> {
    let mut builder =
        Builder::new().ok_or_else(|| "failed to allocate LAME encoder".to_string())?;

    builder
        .set_num_channels(channels)
        .map_err(|e| format!("unsupported channel count {channels}: {e:?}"))?;
    builder
        .set_sample_rate(sample_rate)
        .map_err(|e| format!("unsupported sample rate {sample_rate}: {e:?}"))?;

    if let Some(kbps) = settings.bitrate {
        let bitrate =
            lame_bitrate(kbps).ok_or_else(|| format!("unsupported bitrate {kbps} kbps"))?;
        builder
            .set_brate(bitrate)
            .map_err(|e| format!("unsupported bitrate {kbps} kbps: {e:?}"))?;
    }

    builder
        .build()
        .map_err(|e| format!("LAME init failed: {e:?}"))
}
