use crate::host::{BeforeHook, CallArgs};
use crate::settings::{PluginSettings, SettingsStore};
use async_trait::async_trait;
use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::{Arc, Mutex};
use vmcore::AttachmentTransformer;
use vmcore::types::IngestEvent;

/// Presents every received audio attachment as a voice message when the
/// user opted in. Received audio is never read; the waveform and duration
/// are synthesized.
pub struct ReceiveGate {
    settings: Arc<dyn SettingsStore>,
    transformer: AttachmentTransformer,
    rng: Mutex<StdRng>,
}

impl ReceiveGate {
    pub fn new(settings: Arc<dyn SettingsStore>, transformer: AttachmentTransformer) -> Self {
        Self {
            settings,
            transformer,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Makes placeholder output reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Applies the receive policy to every message in `event`. Returns the
    /// number of attachments transformed.
    pub fn process(&self, event: &mut IngestEvent) -> usize {
        if !PluginSettings::load(self.settings.as_ref()).all_as_vm {
            return 0;
        }
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        let mut transformed = 0;
        for message in event.payload.messages_mut() {
            transformed += self.transformer.transform_message(message, &mut *rng);
        }
        if transformed > 0 {
            debug!(
                "{}: framed {} received attachments as voice messages",
                event.action, transformed
            );
        }
        transformed
    }
}

#[async_trait]
impl BeforeHook for ReceiveGate {
    async fn before(&self, args: &mut CallArgs) {
        if let CallArgs::Dispatch(event) = args {
            self.process(event);
        }
    }
}
