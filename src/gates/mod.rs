//! Policy layer between the host's call paths and the transform.
//!
//! Each gate is a before-hook: it reads the relevant toggle on every call,
//! edits the payload in place, and never fails the host call.

pub mod receive;
pub mod upload;

pub use receive::ReceiveGate;
pub use upload::UploadGate;

/// Upload entry points that carry the user's outgoing attachments.
pub const UPLOAD_METHODS: [&str; 2] = ["uploadLocalFiles", "CloudUpload"];

/// Method name of a dispatcher action handler.
pub const ACTION_HANDLER_METHOD: &str = "actionHandler";
