use super::waveform::{WAVEFORM_BUCKETS, Waveform};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Synthesizes a plausible waveform and duration for attachments whose audio
/// cannot be read (received messages, history loads).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholderSynth {
    pub bucket_count: usize,
    /// Bar heights are drawn from `[min_level, max_level)`.
    pub min_level: u8,
    pub max_level: u8,
    /// Whole seconds drawn from `[min_duration_secs, max_duration_secs)`.
    pub min_duration_secs: u32,
    pub max_duration_secs: u32,
}

impl Default for PlaceholderSynth {
    fn default() -> Self {
        Self {
            bucket_count: WAVEFORM_BUCKETS,
            min_level: 30,
            max_level: 230,
            min_duration_secs: 20,
            max_duration_secs: 30,
        }
    }
}

impl PlaceholderSynth {
    pub fn waveform<R: Rng>(&self, rng: &mut R) -> Waveform {
        let count = self.bucket_count.max(1);
        let levels = (0..count)
            .map(|_| draw(rng, self.min_level as u32, self.max_level as u32) as u8)
            .collect();
        Waveform::from_bytes(levels)
    }

    pub fn duration_secs<R: Rng>(&self, rng: &mut R) -> f64 {
        draw(rng, self.min_duration_secs, self.max_duration_secs).max(1) as f64
    }
}

// Half-open draw that tolerates an empty or inverted range.
fn draw<R: Rng>(rng: &mut R, low: u32, high: u32) -> u32 {
    if high <= low {
        low
    } else {
        rng.random_range(low..high)
    }
}
