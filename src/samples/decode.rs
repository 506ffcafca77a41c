// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::fmt;
use std::io::{Cursor, ErrorKind};
use std::sync::Arc;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};
use tracing::{debug, warn};

use super::error::DecodeError;

/// Decoded audio held entirely in memory.
/// The sample data is stored in an Arc so every playback of a pad shares one copy.
#[derive(Clone)]
pub struct PcmBuffer {
    /// Interleaved f32 samples.
    data: Arc<Vec<f32>>,
    channel_count: u16,
    sample_rate: u32,
}

impl PcmBuffer {
    /// Creates a buffer from interleaved samples.
    pub fn new(data: Vec<f32>, channel_count: u16, sample_rate: u32) -> PcmBuffer {
        PcmBuffer {
            data: Arc::new(data),
            channel_count: channel_count.max(1),
            sample_rate: sample_rate.max(1),
        }
    }

    pub fn data(&self) -> &Arc<Vec<f32>> {
        &self.data
    }

    pub fn channel_count(&self) -> u16 {
        self.channel_count
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.data.len() / self.channel_count as usize
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Returns the memory size in bytes.
    pub fn memory_size(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }
}

impl fmt::Debug for PcmBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PcmBuffer")
            .field("channels", &self.channel_count)
            .field("sample_rate", &self.sample_rate)
            .field("frames", &self.frames())
            .finish()
    }
}

/// Decodes a complete audio file held in memory (WAV, MP3, FLAC, OGG and anything else
/// symphonia's default registry knows). `extension` is only a hint for the prober.
pub fn decode(bytes: Vec<u8>, extension: Option<&str>) -> Result<PcmBuffer, DecodeError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = extension {
        hint.with_extension(extension);
    }

    let probed = get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format_reader = probed.format;

    let track = format_reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(DecodeError::NoTrack)?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut channel_count = track
        .codec_params
        .channels
        .map(|channels| channels.count() as u16)
        .unwrap_or(0);

    let mut decoder = get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut samples: Vec<f32> = Vec::new();
    loop {
        let packet = match format_reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                // A corrupt packet loses a few milliseconds; the rest is still usable.
                warn!(error = e, "Skipping undecodable packet");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        sample_rate = spec.rate;
        channel_count = spec.channels.count() as u16;

        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buffer.samples());
    }

    if samples.is_empty() || channel_count == 0 || sample_rate == 0 {
        return Err(DecodeError::Empty);
    }

    let buffer = PcmBuffer::new(samples, channel_count, sample_rate);
    debug!(
        channels = buffer.channel_count(),
        sample_rate = buffer.sample_rate(),
        duration_ms = (buffer.duration() * 1000.0) as u64,
        memory_kb = buffer.memory_size() / 1024,
        "Decoded sample"
    );
    Ok(buffer)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testutil::wav_bytes;

    #[test]
    fn test_decode_wav() -> Result<(), Box<dyn std::error::Error>> {
        let bytes = wav_bytes(2, 22050, 11025)?;
        let buffer = decode(bytes, Some("wav"))?;
        assert_eq!(2, buffer.channel_count());
        assert_eq!(22050, buffer.sample_rate());
        assert_eq!(11025, buffer.frames());
        assert!((buffer.duration() - 0.5).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_decode_without_hint() -> Result<(), Box<dyn std::error::Error>> {
        let bytes = wav_bytes(1, 44100, 441)?;
        let buffer = decode(bytes, None)?;
        assert_eq!(1, buffer.channel_count());
        assert_eq!(441, buffer.frames());
        Ok(())
    }

    #[test]
    fn test_decode_garbage() {
        let result = decode(b"definitely not audio".to_vec(), Some("wav"));
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_empty_wav() -> Result<(), Box<dyn std::error::Error>> {
        let bytes = wav_bytes(1, 44100, 0)?;
        assert!(decode(bytes, Some("wav")).is_err());
        Ok(())
    }
}
