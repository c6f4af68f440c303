//! Waveform generation for voice-message previews.
//!
//! Policy: [`WAVEFORM_BUCKETS`] buckets, each holding the peak absolute
//! amplitude of its block mapped from full scale onto `0..=255`. Samples that
//! do not fill a whole block at the end of the input are dropped.

use super::{AudioError, ContainerFormat, decode_wav_channel0, ogg_scan};
use base64::Engine as _;
use base64::prelude::BASE64_STANDARD;
use log::debug;

pub const WAVEFORM_BUCKETS: usize = 64;
const MAX_AMPLITUDE: f32 = u8::MAX as f32;

/// Fixed-length amplitude summary of a clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Waveform(Vec<u8>);

impl Waveform {
    pub fn silent(bucket_count: usize) -> Self {
        Self(vec![0u8; bucket_count.max(1)])
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Wire form used by the renderer.
    pub fn to_base64(&self) -> String {
        BASE64_STANDARD.encode(&self.0)
    }
}

/// Peak-per-block waveform over samples normalized to `[-1, 1]`.
pub fn extract_from_samples(samples: &[f32], bucket_count: usize) -> Waveform {
    let bucket_count = bucket_count.max(1);
    if samples.is_empty() {
        return Waveform::silent(bucket_count);
    }

    let block_len = samples.len() / bucket_count;
    let mut buckets: Vec<u8> = if block_len == 0 {
        samples.iter().map(|s| to_level(s.abs())).collect()
    } else {
        samples
            .chunks_exact(block_len)
            .take(bucket_count)
            .map(|block| to_level(block.iter().fold(0.0f32, |peak, s| peak.max(s.abs()))))
            .collect()
    };
    buckets.resize(bucket_count, 0);
    Waveform(buckets)
}

fn to_level(peak: f32) -> u8 {
    if !peak.is_finite() {
        return 0;
    }
    (peak * MAX_AMPLITUDE).round().clamp(0.0, MAX_AMPLITUDE) as u8
}

/// Extracts a waveform from container bytes.
///
/// WAV is decoded. Ogg audio packets are not decoded; their sizes relative to
/// the largest packet stand in for amplitude, which tracks loudness closely
/// enough for a preview with VBR codecs.
pub fn extract_waveform(data: &[u8], bucket_count: usize) -> Result<Waveform, AudioError> {
    if data.is_empty() {
        return Ok(Waveform::silent(bucket_count));
    }

    match ContainerFormat::sniff(data) {
        ContainerFormat::Wav => {
            let samples = decode_wav_channel0(data)?;
            debug!("Decoded {} WAV samples for waveform", samples.len());
            Ok(extract_from_samples(&samples, bucket_count))
        }
        ContainerFormat::Ogg => {
            let scan = ogg_scan::scan(data)?;
            let largest = scan.audio_packet_sizes.iter().copied().max().unwrap_or(0);
            if largest == 0 {
                return Ok(Waveform::silent(bucket_count));
            }
            let envelope: Vec<f32> = scan
                .audio_packet_sizes
                .iter()
                .map(|&size| size as f32 / largest as f32)
                .collect();
            Ok(extract_from_samples(&envelope, bucket_count))
        }
        ContainerFormat::Unknown => Err(AudioError::UnsupportedContainer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::test_support::{ogg_opus, wav_i16};

    #[test]
    fn test_waveform_length() {
        let samples = vec![0.5f32; 1000];
        let waveform = extract_from_samples(&samples, WAVEFORM_BUCKETS);
        assert_eq!(waveform.len(), WAVEFORM_BUCKETS);
    }

    #[test]
    fn test_empty_samples() {
        let waveform = extract_from_samples(&[], WAVEFORM_BUCKETS);
        assert_eq!(waveform.len(), WAVEFORM_BUCKETS);
        assert!(waveform.as_bytes().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_silent_audio() {
        let waveform = extract_from_samples(&[0.0f32; 10000], 32);
        assert_eq!(waveform.len(), 32);
        assert!(waveform.as_bytes().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_fewer_samples_than_buckets() {
        let waveform = extract_from_samples(&[1.0, -0.5, 0.0], 8);
        assert_eq!(waveform.as_bytes(), &[255, 128, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_peak_not_mean() {
        // One spike per block must dominate the bucket.
        let mut samples = vec![0.0f32; 64];
        samples[3] = -1.0;
        samples[40] = 0.5;
        let waveform = extract_from_samples(&samples, 2);
        assert_eq!(waveform.as_bytes(), &[255, 128]);
    }

    #[test]
    fn test_excess_samples_truncated() {
        // 10 samples into 3 buckets: blocks of 3, the final loud sample is dropped.
        let mut samples = vec![0.1f32; 10];
        samples[9] = 1.0;
        let waveform = extract_from_samples(&samples, 3);
        assert_eq!(waveform.as_bytes(), &[26, 26, 26]);
    }

    #[test]
    fn test_zero_buckets_clamped() {
        assert_eq!(extract_from_samples(&[0.2; 10], 0).len(), 1);
    }

    #[test]
    fn test_non_finite_samples_are_silent() {
        let waveform = extract_from_samples(&[f32::NAN, f32::INFINITY], 2);
        assert_eq!(waveform.as_bytes(), &[0, 0]);
    }

    #[test]
    fn test_base64_wire_form() {
        let waveform = Waveform::from_bytes(vec![0, 255, 16]);
        assert_eq!(waveform.to_base64(), "AP8Q");
    }

    #[test]
    fn test_extract_from_wav() {
        let mut samples = vec![0i16; 6400];
        samples[0] = i16::MAX;
        let wav = wav_i16(&samples, 16000);
        let waveform = extract_waveform(&wav, WAVEFORM_BUCKETS).unwrap();
        assert_eq!(waveform.len(), WAVEFORM_BUCKETS);
        assert_eq!(waveform.as_bytes()[0], 255);
        assert!(waveform.as_bytes()[1..].iter().all(|&v| v == 0));
    }

    #[test]
    fn test_extract_from_ogg_packet_sizes() {
        let ogg = ogg_opus(&[3, 3, 120, 60], 0);
        let waveform = extract_waveform(&ogg, 4).unwrap();
        assert_eq!(waveform.as_bytes(), &[6, 6, 255, 128]);
    }

    #[test]
    fn test_empty_bytes_degrade_to_silence() {
        let waveform = extract_waveform(&[], 16).unwrap();
        assert_eq!(waveform, Waveform::silent(16));
    }

    #[test]
    fn test_unknown_container_fails() {
        assert!(matches!(
            extract_waveform(b"ID3\x04\x00\x00garbage", 64),
            Err(AudioError::UnsupportedContainer)
        ));
    }
}
