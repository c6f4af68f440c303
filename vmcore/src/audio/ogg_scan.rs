//! Single pass over an Ogg stream collecting what the voice-message framing
//! needs: codec parameters, per-packet sizes and the final granule position.
//! Packets are never decoded.

use super::AudioError;
use log::debug;
use ogg::reading::PacketReader;
use std::io::Cursor;

/// Granule positions of Ogg Opus are always at 48kHz (RFC 7845).
pub(crate) const OPUS_GRANULE_RATE: u32 = 48000;

/// Page granule meaning "no packet finishes on this page".
const NO_GRANULE: u64 = u64::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OggCodec {
    Opus { pre_skip: u16 },
    Vorbis { sample_rate: u32 },
    Unknown,
}

#[derive(Debug)]
pub(crate) struct OggScan {
    pub codec: OggCodec,
    pub audio_packet_sizes: Vec<usize>,
    pub last_granule: Option<u64>,
}

impl OggScan {
    pub fn duration_secs(&self) -> Option<f64> {
        let granule = self.last_granule?;
        match self.codec {
            OggCodec::Opus { pre_skip } => {
                let samples = granule.saturating_sub(pre_skip as u64);
                Some(samples as f64 / OPUS_GRANULE_RATE as f64)
            }
            OggCodec::Vorbis { sample_rate } if sample_rate > 0 => {
                Some(granule as f64 / sample_rate as f64)
            }
            _ => None,
        }
    }
}

fn parse_header(data: &[u8]) -> Option<OggCodec> {
    if data.len() >= 12 && &data[0..8] == b"OpusHead" {
        let pre_skip = u16::from_le_bytes([data[10], data[11]]);
        return Some(OggCodec::Opus { pre_skip });
    }
    if data.len() >= 16 && data[0] == 1 && &data[1..7] == b"vorbis" {
        let sample_rate = u32::from_le_bytes([data[12], data[13], data[14], data[15]]);
        return Some(OggCodec::Vorbis { sample_rate });
    }
    None
}

fn is_header_packet(data: &[u8]) -> bool {
    if data.len() >= 8 && (&data[0..8] == b"OpusHead" || &data[0..8] == b"OpusTags") {
        return true;
    }
    data.len() >= 7 && data[0] & 1 == 1 && &data[1..7] == b"vorbis"
}

pub(crate) fn scan(data: &[u8]) -> Result<OggScan, AudioError> {
    let mut reader = PacketReader::new(Cursor::new(data));
    let mut codec = OggCodec::Unknown;
    let mut serial = None;
    let mut audio_packet_sizes = Vec::new();
    let mut last_granule = None;
    let mut packet_count = 0usize;

    while let Some(packet) = reader
        .read_packet()
        .map_err(|e| AudioError::Ogg(e.to_string()))?
    {
        packet_count += 1;

        // Multiplexed streams: only the first logical stream matters.
        let stream = packet.stream_serial();
        if *serial.get_or_insert(stream) != stream {
            continue;
        }

        if packet_count == 1 {
            if let Some(parsed) = parse_header(&packet.data) {
                codec = parsed;
            }
            continue;
        }
        if is_header_packet(&packet.data) {
            continue;
        }

        audio_packet_sizes.push(packet.data.len());
        let granule = packet.absgp_page();
        if granule != NO_GRANULE {
            last_granule = Some(granule);
        }
    }

    debug!(
        "Scanned {} Ogg packets ({:?}, {} audio)",
        packet_count,
        codec,
        audio_packet_sizes.len()
    );

    Ok(OggScan {
        codec,
        audio_packet_sizes,
        last_granule,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::test_support::{ogg_opus, ogg_vorbis};

    #[test]
    fn test_scan_opus_stream() {
        let data = ogg_opus(&[10, 20, 30, 40], 312);
        let scan = scan(&data).unwrap();
        assert_eq!(scan.codec, OggCodec::Opus { pre_skip: 312 });
        assert_eq!(scan.audio_packet_sizes, vec![10, 20, 30, 40]);
        assert_eq!(scan.last_granule, Some(4 * 960));
    }

    #[test]
    fn test_opus_duration_subtracts_pre_skip() {
        // 50 packets of 20ms = 1s of audio.
        let data = ogg_opus(&[8; 50], 312);
        let duration = scan(&data).unwrap().duration_secs().unwrap();
        assert!((duration - (48000.0 - 312.0) / 48000.0).abs() < 1e-9);
    }

    #[test]
    fn test_scan_vorbis_skips_all_headers() {
        let data = ogg_vorbis(&[12, 24, 36], 22050, 1024);
        let scan = scan(&data).unwrap();
        assert_eq!(scan.codec, OggCodec::Vorbis { sample_rate: 22050 });
        assert_eq!(scan.audio_packet_sizes, vec![12, 24, 36]);
        assert_eq!(scan.last_granule, Some(3 * 1024));
    }

    #[test]
    fn test_truncated_stream_is_an_error_or_partial() {
        let data = ogg_opus(&[100; 20], 0);
        let cut = &data[..data.len() / 2];
        // A truncated page either fails or yields fewer packets, never panics.
        if let Ok(scan) = scan(cut) {
            assert!(scan.audio_packet_sizes.len() < 20);
        }
    }
}
