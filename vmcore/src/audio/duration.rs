use super::{ContainerFormat, ogg_scan};
use log::debug;

/// Smallest duration ever attached to a voice message. Renderers divide by
/// the duration to place the scrubber.
pub const MIN_DURATION_SECS: f64 = 1.0;

/// Best-effort duration from container metadata.
///
/// Ogg uses the last granule position (Opus at 48kHz minus pre-skip, Vorbis at
/// the identification header's rate). WAV uses the frame count. Anything else,
/// or a malformed container, yields `None`.
pub fn estimate_duration(data: &[u8]) -> Option<f64> {
    let estimate = match ContainerFormat::sniff(data) {
        ContainerFormat::Wav => wav_duration(data),
        ContainerFormat::Ogg => match ogg_scan::scan(data) {
            Ok(scan) => scan.duration_secs(),
            Err(e) => {
                debug!("No Ogg duration: {}", e);
                None
            }
        },
        ContainerFormat::Unknown => None,
    };
    estimate.filter(|secs| secs.is_finite() && *secs > 0.0)
}

fn wav_duration(data: &[u8]) -> Option<f64> {
    let reader = hound::WavReader::new(std::io::Cursor::new(data)).ok()?;
    let sample_rate = reader.spec().sample_rate;
    if sample_rate == 0 {
        return None;
    }
    Some(reader.duration() as f64 / sample_rate as f64)
}

/// Raises a missing or too-short duration to [`MIN_DURATION_SECS`].
pub fn coerce_duration(secs: Option<f64>) -> f64 {
    match secs {
        Some(secs) if secs.is_finite() => secs.max(MIN_DURATION_SECS),
        _ => MIN_DURATION_SECS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::test_support::{ogg_opus, ogg_vorbis, wav_i16};

    #[test]
    fn test_wav_duration() {
        let wav = wav_i16(&vec![0i16; 24000], 8000);
        assert_eq!(estimate_duration(&wav), Some(3.0));
    }

    #[test]
    fn test_opus_duration() {
        let ogg = ogg_opus(&vec![12; 250], 0);
        assert_eq!(estimate_duration(&ogg), Some(5.0));
    }

    #[test]
    fn test_vorbis_duration() {
        // 200 packets of 10ms at 44.1kHz.
        let data = ogg_vorbis(&[16; 200], 44100, 441);
        let secs = estimate_duration(&data).unwrap();
        assert!((secs - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_unsupported_is_none() {
        assert_eq!(estimate_duration(b"fLaC\x00\x00\x00\x22"), None);
        assert_eq!(estimate_duration(&[]), None);
        assert_eq!(estimate_duration(b"OggS\x00garbage"), None);
    }

    #[test]
    fn test_empty_wav_is_none() {
        let wav = wav_i16(&[], 8000);
        assert_eq!(estimate_duration(&wav), None);
    }

    #[test]
    fn test_coerce() {
        assert_eq!(coerce_duration(None), 1.0);
        assert_eq!(coerce_duration(Some(0.0)), 1.0);
        assert_eq!(coerce_duration(Some(-3.0)), 1.0);
        assert_eq!(coerce_duration(Some(f64::NAN)), 1.0);
        assert_eq!(coerce_duration(Some(0.4)), 1.0);
        assert_eq!(coerce_duration(Some(12.5)), 12.5);
    }
}
