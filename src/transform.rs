use crate::audio::load_audio;
use crate::config::PluginConfig;
use crate::error::TransformError;
use bytes::Bytes;
use log::debug;
use std::time::Duration;
use vmcore::audio::AudioError;
use vmcore::types::AttachmentDescriptor;
use vmcore::{AttachmentTransformer, TransformOutcome};

/// Attachment transform for paths that may need to read audio first.
#[derive(Debug, Clone)]
pub struct VoiceTransformer {
    core: AttachmentTransformer,
    timeout: Duration,
    max_audio_bytes: u64,
}

impl VoiceTransformer {
    pub fn from_config(config: &PluginConfig) -> Self {
        Self {
            core: config.transformer(),
            timeout: config.transform_timeout(),
            max_audio_bytes: config.max_audio_bytes,
        }
    }

    pub fn core(&self) -> &AttachmentTransformer {
        &self.core
    }

    /// Frames `desc` as a voice message. With a source the audio is read and
    /// analyzed; without one, or when the container cannot be analyzed, a
    /// placeholder is synthesized. On error `desc` is unchanged.
    pub async fn transform(
        &self,
        desc: &mut AttachmentDescriptor,
    ) -> Result<TransformOutcome, TransformError> {
        if let Some(outcome) = self.core.precheck(desc) {
            return Ok(outcome);
        }
        let Some(source) = desc.source.clone() else {
            return Ok(self.transform_placeholder(desc));
        };

        let data = self.bounded(load_audio(&source, self.max_audio_bytes)).await?;
        match self.core.transform_bytes(desc, &data) {
            Err(AudioError::UnsupportedContainer) => {
                debug!("No analysis for {}, using placeholder", desc.media_type);
                Ok(self.transform_placeholder(desc))
            }
            result => Ok(result?),
        }
    }

    async fn bounded<F>(&self, load: F) -> Result<Bytes, TransformError>
    where
        F: Future<Output = Result<Bytes, AudioError>>,
    {
        let data = tokio::time::timeout(self.timeout, load)
            .await
            .map_err(|_| TransformError::TimedOut(self.timeout))??;
        Ok(data)
    }

    fn transform_placeholder(&self, desc: &mut AttachmentDescriptor) -> TransformOutcome {
        self.core.transform_placeholder(desc, &mut rand::rng())
    }
}
