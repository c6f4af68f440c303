use crate::host::{BeforeHook, CallArgs};
use crate::settings::{PluginSettings, SettingsStore};
use crate::transform::VoiceTransformer;
use async_trait::async_trait;
use log::{debug, warn};
use std::sync::Arc;
use vmcore::TransformOutcome;
use vmcore::types::UploadPayload;

/// Frames the user's own audio uploads as voice messages.
pub struct UploadGate {
    settings: Arc<dyn SettingsStore>,
    transformer: VoiceTransformer,
}

impl UploadGate {
    pub fn new(settings: Arc<dyn SettingsStore>, transformer: VoiceTransformer) -> Self {
        Self {
            settings,
            transformer,
        }
    }

    /// Applies the upload policy to `payload`. Returns whether it was
    /// converted.
    pub async fn process(&self, payload: &mut UploadPayload) -> bool {
        if !PluginSettings::load(self.settings.as_ref()).send_as_vm {
            return false;
        }
        if payload.is_voice_message() {
            debug!("Upload already flagged as a voice message");
            return false;
        }
        let Some(item) = payload.primary_item_mut() else {
            return false;
        };

        match self.transformer.transform(item).await {
            Ok(TransformOutcome::Transformed) => {
                payload.mark_voice_message();
                debug!("Upload converted to a voice message");
                true
            }
            Ok(TransformOutcome::AlreadyVoice) => {
                // Item framed by an earlier upload entry point; the container
                // must carry the flag too.
                payload.mark_voice_message();
                debug!("Upload item already a voice message, flagging container");
                false
            }
            Ok(outcome) => {
                debug!("Upload left as is: {:?}", outcome);
                false
            }
            Err(e) => {
                warn!("Failed to convert upload to a voice message: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl BeforeHook for UploadGate {
    async fn before(&self, args: &mut CallArgs) {
        if let CallArgs::Upload(payload) = args {
            self.process(payload).await;
        }
    }
}
