//! Boundary with the host client.
//!
//! The host owns the object graph being patched. Everything here is the
//! surface this crate consumes: module lookup, the before/after intercept
//! primitive, and a few media actions used by the action sheet.

pub mod memory;
pub mod ui;

use crate::error::HostError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use vmcore::types::{ActionType, IngestEvent, UploadPayload};

pub use memory::MemoryHost;
pub use ui::{LazyComponent, MountedElement, RenderContext, SheetOpen, UiNode};

/// Reverses one installed intercept. Supplied by the host.
pub type Unpatch = Box<dyn FnOnce() -> Result<(), HostError> + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleId(pub u64);

/// Live reference to an object in the host's module graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRef {
    pub id: ModuleId,
    pub name: String,
}

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id.0)
    }
}

/// Argument list of an intercepted call, narrowed per call kind.
#[derive(Debug)]
pub enum CallArgs {
    Upload(UploadPayload),
    Dispatch(IngestEvent),
    OpenSheet(SheetOpen),
    Render(RenderContext),
}

/// Return value of an intercepted call, visible to after-hooks.
#[derive(Debug, Default)]
pub enum CallResult {
    #[default]
    None,
    Element(UiNode),
}

/// Runs before the original method and may mutate its arguments. The original
/// does not run until the returned future completes.
#[async_trait]
pub trait BeforeHook: Send + Sync {
    async fn before(&self, args: &mut CallArgs);
}

/// Runs after the original method and may replace or edit its result.
pub trait AfterHook: Send + Sync {
    fn after(&self, args: &mut CallArgs, result: &mut CallResult);
}

/// Media helpers the host exposes to action-sheet rows.
#[async_trait]
pub trait MediaActions: Send + Sync {
    async fn download_media_asset(&self, url: &str, kind: u32) -> Result<(), HostError>;
    fn set_clipboard(&self, text: &str);
    fn hide_action_sheet(&self);
}

pub trait PatchHost: Send + Sync {
    /// Resolves the object exposing every name in `props`, if one is loaded.
    fn find_by_props(&self, props: &[&str]) -> Option<ModuleRef>;

    /// Resolves `store`'s handler for `action` in the dispatcher.
    fn action_handler(&self, action: ActionType, store: &str) -> Option<ModuleRef>;

    fn has_method(&self, target: &ModuleRef, method: &str) -> bool;

    fn before(
        &self,
        target: &ModuleRef,
        method: &str,
        hook: Arc<dyn BeforeHook>,
    ) -> Result<Unpatch, HostError>;

    fn after(
        &self,
        target: &ModuleRef,
        method: &str,
        hook: Arc<dyn AfterHook>,
    ) -> Result<Unpatch, HostError>;

    fn media_actions(&self) -> Option<Arc<dyn MediaActions>>;
}
