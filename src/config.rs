use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use vmcore::AttachmentTransformer;
use vmcore::audio::{PlaceholderSynth, WAVEFORM_BUCKETS};

/// Tuning knobs that are not user settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    pub waveform_buckets: usize,
    pub placeholder: PlaceholderSynth,
    /// Upper bound on reading an upload's audio before giving up on framing.
    pub transform_timeout_secs: u64,
    pub max_audio_bytes: u64,
    /// Where the voice rows go in the long-press sheet's button list.
    pub sheet_insert_index: usize,
    /// Dispatcher store whose handlers receive message events.
    pub message_store: String,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            waveform_buckets: WAVEFORM_BUCKETS,
            placeholder: PlaceholderSynth::default(),
            transform_timeout_secs: 10,
            max_audio_bytes: 64 * 1024 * 1024,
            sheet_insert_index: 5,
            message_store: "MessageStore".to_string(),
        }
    }
}

impl PluginConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn transform_timeout(&self) -> Duration {
        Duration::from_secs(self.transform_timeout_secs)
    }

    pub fn transformer(&self) -> AttachmentTransformer {
        AttachmentTransformer::new(self.waveform_buckets, self.placeholder.clone())
    }
}
