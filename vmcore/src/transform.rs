//! Turns generic audio attachments into voice messages.
//!
//! A transform is computed in full before the descriptor is touched, so a
//! failure leaves the descriptor exactly as it was.

use crate::audio::{
    AudioError, PlaceholderSynth, WAVEFORM_BUCKETS, coerce_duration, estimate_duration,
    extract_waveform,
};
use crate::types::attachment::{AttachmentDescriptor, MessageFlags, VOICE_MESSAGE_CONTENT_TYPE};
use crate::types::message::Message;
use log::debug;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformOutcome {
    Transformed,
    AlreadyVoice,
    NotAudio,
}

/// Everything a descriptor needs to become a voice message.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceAnalysis {
    /// Base64 wire form.
    pub waveform: String,
    pub duration_secs: f64,
}

impl VoiceAnalysis {
    /// Writes the analysis and the voice flag in one step.
    pub fn apply(self, desc: &mut AttachmentDescriptor) {
        desc.media_type = VOICE_MESSAGE_CONTENT_TYPE.to_string();
        desc.waveform = Some(self.waveform);
        desc.duration_secs = Some(coerce_duration(Some(self.duration_secs)));
        desc.flags.insert(MessageFlags::IS_VOICE_MESSAGE);
    }
}

#[derive(Debug, Clone)]
pub struct AttachmentTransformer {
    bucket_count: usize,
    placeholder: PlaceholderSynth,
}

impl Default for AttachmentTransformer {
    fn default() -> Self {
        Self::new(WAVEFORM_BUCKETS, PlaceholderSynth::default())
    }
}

impl AttachmentTransformer {
    pub fn new(bucket_count: usize, placeholder: PlaceholderSynth) -> Self {
        Self {
            bucket_count: bucket_count.max(1),
            placeholder: PlaceholderSynth {
                bucket_count: bucket_count.max(1),
                ..placeholder
            },
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    /// Short-circuit checks shared by every path. `None` means the descriptor
    /// is eligible.
    pub fn precheck(&self, desc: &AttachmentDescriptor) -> Option<TransformOutcome> {
        if desc.is_voice_message() {
            Some(TransformOutcome::AlreadyVoice)
        } else if !desc.is_audio() {
            Some(TransformOutcome::NotAudio)
        } else {
            None
        }
    }

    pub fn analyze(&self, data: &[u8]) -> Result<VoiceAnalysis, AudioError> {
        let waveform = extract_waveform(data, self.bucket_count)?;
        let duration_secs = coerce_duration(estimate_duration(data));
        debug!(
            "Analyzed {} bytes of audio: {:.2}s, {} buckets",
            data.len(),
            duration_secs,
            waveform.len()
        );
        Ok(VoiceAnalysis {
            waveform: waveform.to_base64(),
            duration_secs,
        })
    }

    /// Transforms `desc` using the raw bytes of its audio.
    pub fn transform_bytes(
        &self,
        desc: &mut AttachmentDescriptor,
        data: &[u8],
    ) -> Result<TransformOutcome, AudioError> {
        if let Some(outcome) = self.precheck(desc) {
            return Ok(outcome);
        }
        self.analyze(data)?.apply(desc);
        Ok(TransformOutcome::Transformed)
    }

    /// Synthetic analysis for a descriptor without audio. Keeps a waveform or
    /// duration the host already supplied.
    pub fn placeholder_analysis<R: Rng>(
        &self,
        desc: &AttachmentDescriptor,
        rng: &mut R,
    ) -> VoiceAnalysis {
        let waveform = match desc.waveform.as_deref() {
            Some(existing) if !existing.is_empty() => existing.to_string(),
            _ => self.placeholder.waveform(rng).to_base64(),
        };
        let duration_secs = match desc.duration_secs {
            Some(secs) if secs.is_finite() && secs > 0.0 => secs,
            _ => self.placeholder.duration_secs(rng),
        };
        VoiceAnalysis {
            waveform,
            duration_secs,
        }
    }

    pub fn transform_placeholder<R: Rng>(
        &self,
        desc: &mut AttachmentDescriptor,
        rng: &mut R,
    ) -> TransformOutcome {
        if let Some(outcome) = self.precheck(desc) {
            return outcome;
        }
        self.placeholder_analysis(desc, rng).apply(desc);
        TransformOutcome::Transformed
    }

    /// Placeholder-transforms every eligible attachment of a received message
    /// and flags the message when anything changed. Returns how many
    /// attachments were transformed.
    pub fn transform_message<R: Rng>(&self, message: &mut Message, rng: &mut R) -> usize {
        if message.is_voice_message() {
            return 0;
        }
        let mut transformed = 0;
        for attachment in &mut message.attachments {
            if self.transform_placeholder(attachment, rng) == TransformOutcome::Transformed {
                transformed += 1;
            }
        }
        if transformed > 0 {
            message.flags.insert(MessageFlags::IS_VOICE_MESSAGE);
        }
        transformed
    }
}
