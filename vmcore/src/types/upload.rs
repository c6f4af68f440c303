use crate::types::attachment::{AttachmentDescriptor, MessageFlags};
use serde::{Deserialize, Serialize};

/// Outer upload request wrapping one or more files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadContainer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub flags: MessageFlags,
    #[serde(default)]
    pub items: Vec<AttachmentDescriptor>,
}

/// First argument of an upload call. Some host entry points take a container,
/// others a bare item.
#[derive(Debug, Clone)]
pub enum UploadPayload {
    Container(UploadContainer),
    Item(AttachmentDescriptor),
}

impl UploadPayload {
    /// Flag carried by the outermost level of the payload.
    pub fn flags(&self) -> MessageFlags {
        match self {
            UploadPayload::Container(container) => container.flags,
            UploadPayload::Item(item) => item.flags,
        }
    }

    pub fn is_voice_message(&self) -> bool {
        self.flags().is_voice_message()
    }

    pub fn primary_item(&self) -> Option<&AttachmentDescriptor> {
        match self {
            UploadPayload::Container(container) => container.items.first(),
            UploadPayload::Item(item) => Some(item),
        }
    }

    pub fn primary_item_mut(&mut self) -> Option<&mut AttachmentDescriptor> {
        match self {
            UploadPayload::Container(container) => container.items.first_mut(),
            UploadPayload::Item(item) => Some(item),
        }
    }

    /// Sets the voice flag on the outer level. For a bare item the outer level
    /// is the item itself.
    pub fn mark_voice_message(&mut self) {
        match self {
            UploadPayload::Container(container) => {
                container.flags.insert(MessageFlags::IS_VOICE_MESSAGE)
            }
            UploadPayload::Item(item) => item.flags.insert(MessageFlags::IS_VOICE_MESSAGE),
        }
    }

    /// Outer flag and primary item flag agree.
    pub fn flags_agree(&self) -> bool {
        let item_flagged = self
            .primary_item()
            .is_some_and(AttachmentDescriptor::is_voice_message);
        self.is_voice_message() == item_flagged
    }
}
