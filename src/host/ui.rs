use super::ModuleRef;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use vmcore::types::Message;

pub type PressFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Callback fired when the user taps a row.
#[derive(Clone)]
pub struct PressHandler(Arc<dyn Fn() -> PressFuture + Send + Sync>);

impl PressHandler {
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self(Arc::new(move || Box::pin(handler())))
    }

    pub async fn press(&self) {
        (self.0)().await
    }
}

impl fmt::Debug for PressHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PressHandler")
    }
}

#[derive(Debug, Clone)]
pub struct ActionRow {
    pub key: String,
    pub label: String,
    pub icon: String,
    pub on_press: PressHandler,
}

/// Rendered component tree, reduced to what row splicing needs.
#[derive(Debug, Clone)]
pub enum UiNode {
    Element {
        kind: String,
        key: Option<String>,
        children: Vec<UiNode>,
    },
    Fragment(Vec<UiNode>),
    Row(ActionRow),
    Text(String),
}

impl UiNode {
    pub fn element(kind: impl Into<String>, children: Vec<UiNode>) -> Self {
        UiNode::Element {
            kind: kind.into(),
            key: None,
            children,
        }
    }

    pub fn kind(&self) -> Option<&str> {
        match self {
            UiNode::Element { kind, .. } => Some(kind),
            _ => None,
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            UiNode::Element { key, .. } => key.as_deref(),
            UiNode::Row(row) => Some(&row.key),
            _ => None,
        }
    }

    pub fn children(&self) -> &[UiNode] {
        match self {
            UiNode::Element { children, .. } | UiNode::Fragment(children) => children,
            _ => &[],
        }
    }

    /// Depth-first search for the first node matching `predicate`.
    pub fn find<F>(&self, predicate: &F) -> Option<&UiNode>
    where
        F: Fn(&UiNode) -> bool,
    {
        if predicate(self) {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(predicate))
    }

    pub fn find_mut<F>(&mut self, predicate: &F) -> Option<&mut UiNode>
    where
        F: Fn(&UiNode) -> bool,
    {
        if predicate(self) {
            return Some(self);
        }
        match self {
            UiNode::Element { children, .. } | UiNode::Fragment(children) => children
                .iter_mut()
                .find_map(|child| child.find_mut(predicate)),
            _ => None,
        }
    }
}

type Loaded = Box<dyn FnOnce(ModuleRef) + Send>;

enum LazyState {
    Pending(Vec<Loaded>),
    Ready(ModuleRef),
}

/// Component module that the host loads on demand.
#[derive(Clone)]
pub struct LazyComponent(Arc<Mutex<LazyState>>);

impl LazyComponent {
    pub fn pending() -> Self {
        Self(Arc::new(Mutex::new(LazyState::Pending(Vec::new()))))
    }

    pub fn ready(module: ModuleRef) -> Self {
        Self(Arc::new(Mutex::new(LazyState::Ready(module))))
    }

    /// Runs `on_loaded` once the module is available, immediately if it
    /// already is.
    pub fn then<F>(&self, on_loaded: F)
    where
        F: FnOnce(ModuleRef) + Send + 'static,
    {
        let ready = {
            let mut state = self.0.lock().unwrap_or_else(|e| e.into_inner());
            match &mut *state {
                LazyState::Ready(module) => module.clone(),
                LazyState::Pending(waiting) => {
                    waiting.push(Box::new(on_loaded));
                    return;
                }
            }
        };
        on_loaded(ready);
    }

    pub fn resolve(&self, module: ModuleRef) {
        let waiting = {
            let mut state = self.0.lock().unwrap_or_else(|e| e.into_inner());
            match std::mem::replace(&mut *state, LazyState::Ready(module.clone())) {
                LazyState::Pending(waiting) => waiting,
                LazyState::Ready(_) => Vec::new(),
            }
        };
        for on_loaded in waiting {
            on_loaded(module.clone());
        }
    }
}

impl fmt::Debug for LazyComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0.lock().unwrap_or_else(|e| e.into_inner());
        match &*state {
            LazyState::Pending(waiting) => f
                .debug_struct("LazyComponent")
                .field("waiting", &waiting.len())
                .finish(),
            LazyState::Ready(module) => f
                .debug_struct("LazyComponent")
                .field("module", module)
                .finish(),
        }
    }
}

/// Arguments of the action sheet's lazy open call.
#[derive(Debug)]
pub struct SheetOpen {
    pub component: LazyComponent,
    pub sheet_name: String,
    pub message: Option<Message>,
}

type Cleanup = Box<dyn FnOnce() + Send>;

/// Per-render context; cleanups registered here run when the element is torn
/// down.
#[derive(Default)]
pub struct RenderContext {
    cleanups: Vec<Cleanup>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_unmount<F>(&mut self, cleanup: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cleanups.push(Box::new(cleanup));
    }
}

impl fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("cleanups", &self.cleanups.len())
            .finish()
    }
}

/// A rendered element. Dropping it tears it down.
#[derive(Debug)]
pub struct MountedElement {
    pub tree: UiNode,
    context: RenderContext,
}

impl MountedElement {
    pub fn new(tree: UiNode, context: RenderContext) -> Self {
        Self { tree, context }
    }

    pub fn unmount(self) {}
}

impl Drop for MountedElement {
    fn drop(&mut self) {
        for cleanup in self.context.cleanups.drain(..) {
            cleanup();
        }
    }
}
