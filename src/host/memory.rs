//! In-process host with a mutable module graph and a working before/after
//! patcher. Used by the CLI's `simulate` command and by the tests.

use super::{
    AfterHook, BeforeHook, CallArgs, CallResult, MediaActions, ModuleId, ModuleRef, PatchHost,
    Unpatch,
};
use crate::error::HostError;
use crate::host::ui::{MountedElement, RenderContext, UiNode};
use async_trait::async_trait;
use log::debug;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use vmcore::types::ActionType;

enum PatchKind {
    Before(Arc<dyn BeforeHook>),
    After(Arc<dyn AfterHook>),
}

struct Patch {
    id: u64,
    method: String,
    kind: PatchKind,
}

struct ModuleEntry {
    name: String,
    props: HashSet<String>,
    template: Option<UiNode>,
    patches: Vec<Patch>,
}

#[derive(Default)]
struct HostState {
    next_id: u64,
    modules: BTreeMap<ModuleId, ModuleEntry>,
    handlers: HashMap<(ActionType, String), ModuleId>,
}

impl HostState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn entry(&self, target: &ModuleRef) -> Result<&ModuleEntry, HostError> {
        self.modules
            .get(&target.id)
            .ok_or_else(|| HostError::MissingTarget(target.to_string()))
    }
}

fn lock(state: &Mutex<HostState>) -> MutexGuard<'_, HostState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(Default)]
pub struct MemoryHost {
    state: Arc<Mutex<HostState>>,
    media: Option<Arc<dyn MediaActions>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_media_actions(mut self, media: Arc<dyn MediaActions>) -> Self {
        self.media = Some(media);
        self
    }

    pub fn add_module(&self, name: &str, props: &[&str]) -> ModuleRef {
        self.insert(name, props, None)
    }

    /// Registers a component whose `default` render returns `template`.
    pub fn add_component(&self, name: &str, template: UiNode) -> ModuleRef {
        self.insert(name, &["default"], Some(template))
    }

    /// Registers `store`'s dispatcher handler for `action`.
    pub fn add_action_handler(&self, action: ActionType, store: &str) -> ModuleRef {
        let module = self.insert(store, &["actionHandler"], None);
        lock(&self.state)
            .handlers
            .insert((action, store.to_string()), module.id);
        module
    }

    /// Unloads a module. Outstanding unpatch functions for it become no-ops.
    pub fn remove_module(&self, target: &ModuleRef) {
        let mut state = lock(&self.state);
        state.modules.remove(&target.id);
        state.handlers.retain(|_, id| *id != target.id);
    }

    pub fn patch_count(&self, target: &ModuleRef, method: &str) -> usize {
        lock(&self.state)
            .modules
            .get(&target.id)
            .map(|m| m.patches.iter().filter(|p| p.method == method).count())
            .unwrap_or(0)
    }

    /// Total patches installed across all modules.
    pub fn total_patches(&self) -> usize {
        lock(&self.state)
            .modules
            .values()
            .map(|m| m.patches.len())
            .sum()
    }

    /// Invokes `method` on `target` the way the host would: before-hooks run in
    /// installation order and are awaited, then the original, then
    /// after-hooks. Returns the arguments as the original received them.
    pub async fn call(
        &self,
        target: &ModuleRef,
        method: &str,
        mut args: CallArgs,
    ) -> Result<CallArgs, HostError> {
        let (befores, afters) = self.hooks(target, method)?;
        for hook in befores {
            hook.before(&mut args).await;
        }
        debug!("{}.{} proceeding", target, method);
        let mut result = CallResult::None;
        for hook in afters {
            hook.after(&mut args, &mut result);
        }
        Ok(args)
    }

    /// Renders a component registered with [`MemoryHost::add_component`].
    pub fn render(&self, component: &ModuleRef) -> Result<MountedElement, HostError> {
        let template = {
            let state = lock(&self.state);
            state
                .entry(component)?
                .template
                .clone()
                .ok_or_else(|| HostError::MissingMethod {
                    target: component.to_string(),
                    method: "default".to_string(),
                })?
        };
        let (_, afters) = self.hooks(component, "default")?;

        let mut args = CallArgs::Render(RenderContext::new());
        let mut result = CallResult::Element(template);
        for hook in afters {
            hook.after(&mut args, &mut result);
        }

        let context = match args {
            CallArgs::Render(context) => context,
            _ => RenderContext::new(),
        };
        let tree = match result {
            CallResult::Element(tree) => tree,
            CallResult::None => UiNode::Fragment(Vec::new()),
        };
        Ok(MountedElement::new(tree, context))
    }

    fn insert(&self, name: &str, props: &[&str], template: Option<UiNode>) -> ModuleRef {
        let mut state = lock(&self.state);
        let id = ModuleId(state.next_id());
        state.modules.insert(
            id,
            ModuleEntry {
                name: name.to_string(),
                props: props.iter().map(|p| p.to_string()).collect(),
                template,
                patches: Vec::new(),
            },
        );
        ModuleRef {
            id,
            name: name.to_string(),
        }
    }

    #[allow(clippy::type_complexity)]
    fn hooks(
        &self,
        target: &ModuleRef,
        method: &str,
    ) -> Result<(Vec<Arc<dyn BeforeHook>>, Vec<Arc<dyn AfterHook>>), HostError> {
        let state = lock(&self.state);
        let entry = state.entry(target)?;
        if !entry.props.contains(method) {
            return Err(HostError::MissingMethod {
                target: target.to_string(),
                method: method.to_string(),
            });
        }
        let mut befores = Vec::new();
        let mut afters = Vec::new();
        for patch in entry.patches.iter().filter(|p| p.method == method) {
            match &patch.kind {
                PatchKind::Before(hook) => befores.push(hook.clone()),
                PatchKind::After(hook) => afters.push(hook.clone()),
            }
        }
        Ok((befores, afters))
    }

    fn install(
        &self,
        target: &ModuleRef,
        method: &str,
        kind: PatchKind,
    ) -> Result<Unpatch, HostError> {
        let mut state = lock(&self.state);
        let patch_id = state.next_id();
        let entry = state
            .modules
            .get_mut(&target.id)
            .ok_or_else(|| HostError::MissingTarget(target.to_string()))?;
        if !entry.props.contains(method) {
            return Err(HostError::MissingMethod {
                target: entry.name.clone(),
                method: method.to_string(),
            });
        }
        entry.patches.push(Patch {
            id: patch_id,
            method: method.to_string(),
            kind,
        });

        let weak: Weak<Mutex<HostState>> = Arc::downgrade(&self.state);
        let module_id = target.id;
        Ok(Box::new(move || {
            if let Some(state) = weak.upgrade() {
                if let Some(entry) = lock(&state).modules.get_mut(&module_id) {
                    entry.patches.retain(|p| p.id != patch_id);
                }
            }
            Ok(())
        }))
    }
}

impl PatchHost for MemoryHost {
    fn find_by_props(&self, props: &[&str]) -> Option<ModuleRef> {
        let state = lock(&self.state);
        state
            .modules
            .iter()
            .find(|(_, entry)| props.iter().all(|p| entry.props.contains(*p)))
            .map(|(id, entry)| ModuleRef {
                id: *id,
                name: entry.name.clone(),
            })
    }

    fn action_handler(&self, action: ActionType, store: &str) -> Option<ModuleRef> {
        let state = lock(&self.state);
        let id = *state.handlers.get(&(action, store.to_string()))?;
        state.modules.get(&id).map(|entry| ModuleRef {
            id,
            name: entry.name.clone(),
        })
    }

    fn has_method(&self, target: &ModuleRef, method: &str) -> bool {
        lock(&self.state)
            .modules
            .get(&target.id)
            .is_some_and(|entry| entry.props.contains(method))
    }

    fn before(
        &self,
        target: &ModuleRef,
        method: &str,
        hook: Arc<dyn BeforeHook>,
    ) -> Result<Unpatch, HostError> {
        self.install(target, method, PatchKind::Before(hook))
    }

    fn after(
        &self,
        target: &ModuleRef,
        method: &str,
        hook: Arc<dyn AfterHook>,
    ) -> Result<Unpatch, HostError> {
        self.install(target, method, PatchKind::After(hook))
    }

    fn media_actions(&self) -> Option<Arc<dyn MediaActions>> {
        self.media.clone()
    }
}

/// Media actions that only record what was asked of them.
#[derive(Debug, Default)]
pub struct RecordedMediaActions {
    pub fail_downloads: bool,
    log: Mutex<Vec<String>>,
}

impl RecordedMediaActions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_downloads: true,
            ..Default::default()
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn record(&self, entry: String) {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).push(entry);
    }
}

#[async_trait]
impl MediaActions for RecordedMediaActions {
    async fn download_media_asset(&self, url: &str, kind: u32) -> Result<(), HostError> {
        if self.fail_downloads {
            self.record(format!("download-failed:{url}"));
            return Err(HostError::Operation(format!("download of {url} failed")));
        }
        self.record(format!("download:{url}:{kind}"));
        Ok(())
    }

    fn set_clipboard(&self, text: &str) {
        self.record(format!("clipboard:{text}"));
    }

    fn hide_action_sheet(&self) {
        self.record("hide".to_string());
    }
}
