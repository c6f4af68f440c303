use crate::types::attachment::{AttachmentDescriptor, MessageFlags};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub flags: MessageFlags,
    #[serde(default)]
    pub attachments: Vec<AttachmentDescriptor>,
}

impl Message {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_attachment(mut self, attachment: AttachmentDescriptor) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn is_voice_message(&self) -> bool {
        self.flags.is_voice_message()
    }

    /// First attachment the action sheet can offer for download.
    pub fn voice_attachment(&self) -> Option<&AttachmentDescriptor> {
        self.attachments.iter().find(|a| a.looks_like_voice_clip())
    }
}

/// Message-store actions the receive path listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    MessageCreate,
    MessageUpdate,
    LoadMessagesSuccess,
}

impl ActionType {
    pub const ALL: [ActionType; 3] = [
        ActionType::MessageCreate,
        ActionType::LoadMessagesSuccess,
        ActionType::MessageUpdate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::MessageCreate => "MESSAGE_CREATE",
            ActionType::MessageUpdate => "MESSAGE_UPDATE",
            ActionType::LoadMessagesSuccess => "LOAD_MESSAGES_SUCCESS",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Either one message (create/update) or a page of history (bulk load).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessagePayload {
    Batch { messages: Vec<Message> },
    Single { message: Message },
}

impl MessagePayload {
    pub fn messages(&self) -> &[Message] {
        match self {
            MessagePayload::Batch { messages } => messages,
            MessagePayload::Single { message } => std::slice::from_ref(message),
        }
    }

    pub fn messages_mut(&mut self) -> &mut [Message] {
        match self {
            MessagePayload::Batch { messages } => messages,
            MessagePayload::Single { message } => std::slice::from_mut(message),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestEvent {
    #[serde(rename = "type")]
    pub action: ActionType,
    #[serde(flatten)]
    pub payload: MessagePayload,
}

impl IngestEvent {
    pub fn single(action: ActionType, message: Message) -> Self {
        Self {
            action,
            payload: MessagePayload::Single { message },
        }
    }

    pub fn batch(action: ActionType, messages: Vec<Message>) -> Self {
        Self {
            action,
            payload: MessagePayload::Batch { messages },
        }
    }
}
