pub mod audio;
pub mod transform;
pub mod types;

pub use transform::{AttachmentTransformer, TransformOutcome, VoiceAnalysis};
