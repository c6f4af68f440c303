use crate::audio::AudioSource;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Media type every transformed attachment is relabelled to.
pub const VOICE_MESSAGE_CONTENT_TYPE: &str = "audio/ogg";

/// Prefix shared by every media type eligible for the transform.
pub const AUDIO_MEDIA_PREFIX: &str = "audio";

/// Message/attachment flag bitmask as carried on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageFlags(pub u64);

impl MessageFlags {
    /// Marks a message (or upload) as a voice message. Renderers, the action
    /// sheet and every intercept point use this bit and nothing else.
    pub const IS_VOICE_MESSAGE: u64 = 1 << 13;

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn voice_message() -> Self {
        Self(Self::IS_VOICE_MESSAGE)
    }

    pub fn contains(self, bits: u64) -> bool {
        self.0 & bits == bits
    }

    pub fn insert(&mut self, bits: u64) {
        self.0 |= bits;
    }

    pub fn is_voice_message(self) -> bool {
        self.contains(Self::IS_VOICE_MESSAGE)
    }
}

impl fmt::Display for MessageFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A single attachment as seen by the upload and ingestion paths.
///
/// The serialized form matches the host renderer's attachment object. Upload
/// items use camelCase names for the same fields, which are accepted as
/// aliases when deserializing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttachmentDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "content_type", alias = "mimeType", default)]
    pub media_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waveform: Option<String>,
    #[serde(
        rename = "duration_secs",
        alias = "durationSecs",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub duration_secs: Option<f64>,
    #[serde(default)]
    pub flags: MessageFlags,
    /// Backing audio, when the host still has it (outgoing uploads only).
    #[serde(skip)]
    pub source: Option<AudioSource>,
}

impl AttachmentDescriptor {
    pub fn new(media_type: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
            ..Default::default()
        }
    }

    pub fn with_source(mut self, source: AudioSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn is_audio(&self) -> bool {
        self.media_type.starts_with(AUDIO_MEDIA_PREFIX)
    }

    pub fn is_voice_message(&self) -> bool {
        self.flags.is_voice_message()
    }

    /// Whether the action sheet should treat this as the message's voice clip.
    pub fn looks_like_voice_clip(&self) -> bool {
        self.is_audio()
            || self
                .filename
                .as_deref()
                .is_some_and(|name| name.ends_with(".ogg"))
    }

    /// A flagged descriptor must carry a non-empty waveform and a positive
    /// duration. Unflagged descriptors always satisfy this.
    pub fn is_consistent(&self) -> bool {
        if !self.is_voice_message() {
            return true;
        }
        let has_waveform = self.waveform.as_deref().is_some_and(|w| !w.is_empty());
        let has_duration = self.duration_secs.is_some_and(|d| d > 0.0);
        has_waveform && has_duration
    }
}
