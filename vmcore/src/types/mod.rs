pub mod attachment;
pub mod message;
pub mod upload;

pub use attachment::{AttachmentDescriptor, MessageFlags};
pub use message::{ActionType, IngestEvent, Message, MessagePayload};
pub use upload::{UploadContainer, UploadPayload};
