//! Audio analysis for voice-message framing.
//!
//! This module provides:
//! - Container sniffing (WAV and Ogg)
//! - Waveform extraction with a fixed bucket count
//! - Duration estimation from container metadata
//! - Placeholder synthesis for attachments without retrievable audio

pub mod duration;
mod ogg_scan;
pub mod placeholder;
pub mod waveform;

use bytes::Bytes;
use std::path::PathBuf;
use thiserror::Error;

pub use duration::{MIN_DURATION_SECS, coerce_duration, estimate_duration};
pub use placeholder::PlaceholderSynth;
pub use waveform::{WAVEFORM_BUCKETS, Waveform, extract_from_samples, extract_waveform};

/// Where the bytes of an attachment live. Never written to.
#[derive(Debug, Clone)]
pub enum AudioSource {
    Memory(Bytes),
    Path(PathBuf),
}

impl From<Vec<u8>> for AudioSource {
    fn from(data: Vec<u8>) -> Self {
        AudioSource::Memory(Bytes::from(data))
    }
}

impl From<PathBuf> for AudioSource {
    fn from(path: PathBuf) -> Self {
        AudioSource::Path(path)
    }
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("unsupported audio container")]
    UnsupportedContainer,
    #[error("WAV decode error: {0}")]
    Wav(#[from] hound::Error),
    #[error("Ogg read error: {0}")]
    Ogg(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("audio is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },
}

/// Containers the analysis understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    Wav,
    Ogg,
    Unknown,
}

impl ContainerFormat {
    pub fn sniff(data: &[u8]) -> Self {
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WAVE" {
            ContainerFormat::Wav
        } else if data.len() >= 4 && &data[0..4] == b"OggS" {
            ContainerFormat::Ogg
        } else {
            ContainerFormat::Unknown
        }
    }
}

/// Decodes channel 0 of a WAV file into samples normalized to `[-1, 1]`.
pub(crate) fn decode_wav_channel0(data: &[u8]) -> Result<Vec<f32>, AudioError> {
    let reader = hound::WavReader::new(std::io::Cursor::new(data))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .step_by(channels)
            .collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .into_samples::<i32>()
                .step_by(channels)
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<Vec<_>, _>>()?
        }
    };
    Ok(samples)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::Cursor;

    /// Mono 16-bit WAV at `sample_rate` holding `samples`.
    pub fn wav_i16(samples: &[i16], sample_rate: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut out = Vec::new();
        {
            let mut writer = hound::WavWriter::new(Cursor::new(&mut out), spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        out
    }

    /// Minimal Ogg/Opus stream: OpusHead, OpusTags, then one 20ms packet per
    /// entry of `packet_sizes`.
    pub fn ogg_opus(packet_sizes: &[usize], pre_skip: u16) -> Vec<u8> {
        use ogg::writing::{PacketWriteEndInfo, PacketWriter};

        let mut out = Vec::new();
        {
            let mut writer = PacketWriter::new(Cursor::new(&mut out));
            let serial = 7;

            let mut head = Vec::from(&b"OpusHead"[..]);
            head.push(1);
            head.push(1);
            head.extend_from_slice(&pre_skip.to_le_bytes());
            head.extend_from_slice(&48000u32.to_le_bytes());
            head.extend_from_slice(&0u16.to_le_bytes());
            head.push(0);
            writer
                .write_packet(head, serial, PacketWriteEndInfo::EndPage, 0)
                .unwrap();

            let mut tags = Vec::from(&b"OpusTags"[..]);
            tags.extend_from_slice(&0u32.to_le_bytes());
            tags.extend_from_slice(&0u32.to_le_bytes());
            writer
                .write_packet(tags, serial, PacketWriteEndInfo::EndPage, 0)
                .unwrap();

            let mut granule = 0u64;
            for (i, &size) in packet_sizes.iter().enumerate() {
                granule += 960;
                let end = if i + 1 == packet_sizes.len() {
                    PacketWriteEndInfo::EndStream
                } else {
                    PacketWriteEndInfo::NormalPacket
                };
                writer
                    .write_packet(vec![0xA5u8; size], serial, end, granule)
                    .unwrap();
            }
        }
        out
    }

    /// Minimal Ogg/Vorbis stream: the three header packets, then one packet
    /// of `samples_per_packet` samples per entry of `packet_sizes`.
    pub fn ogg_vorbis(
        packet_sizes: &[usize],
        sample_rate: u32,
        samples_per_packet: u64,
    ) -> Vec<u8> {
        use ogg::writing::{PacketWriteEndInfo, PacketWriter};

        let mut out = Vec::new();
        {
            let mut writer = PacketWriter::new(Cursor::new(&mut out));
            let serial = 11;

            let mut ident = vec![1u8];
            ident.extend_from_slice(b"vorbis");
            ident.extend_from_slice(&0u32.to_le_bytes());
            ident.push(2);
            ident.extend_from_slice(&sample_rate.to_le_bytes());
            ident.extend_from_slice(&[0u8; 12]);
            ident.push(0xB8);
            ident.push(1);
            writer
                .write_packet(ident, serial, PacketWriteEndInfo::EndPage, 0)
                .unwrap();

            let mut comment = vec![3u8];
            comment.extend_from_slice(b"vorbis");
            comment.extend_from_slice(&0u32.to_le_bytes());
            comment.extend_from_slice(&0u32.to_le_bytes());
            comment.push(1);
            writer
                .write_packet(comment, serial, PacketWriteEndInfo::NormalPacket, 0)
                .unwrap();

            let mut setup = vec![5u8];
            setup.extend_from_slice(b"vorbis");
            setup.extend_from_slice(&[0u8; 8]);
            writer
                .write_packet(setup, serial, PacketWriteEndInfo::EndPage, 0)
                .unwrap();

            let mut granule = 0u64;
            for (i, &size) in packet_sizes.iter().enumerate() {
                granule += samples_per_packet;
                let end = if i + 1 == packet_sizes.len() {
                    PacketWriteEndInfo::EndStream
                } else {
                    PacketWriteEndInfo::NormalPacket
                };
                writer
                    .write_packet(vec![0x5Au8; size], serial, end, granule)
                    .unwrap();
            }
        }
        out
    }
}
