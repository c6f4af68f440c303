//! Nested intercepts bound to the lifetime of a single UI element.
//!
//! These are installed from inside another interceptor, are not tracked by
//! the [`InterceptRegistry`](crate::registry::InterceptRegistry), and remove
//! themselves when the element they decorate is torn down.

use crate::host::{AfterHook, ModuleRef, PatchHost};
use crate::registry::InterceptHandle;
use log::{debug, info, warn};
use scopeguard::ScopeGuard;
use std::sync::{Arc, Mutex};

fn release_quietly(handle: InterceptHandle) {
    if let Err(e) = handle.release() {
        warn!("Failed to remove scoped intercept '{}': {}", handle.label(), e);
    }
}

/// Releases its handle when dropped.
pub struct ScopedIntercept(ScopeGuard<InterceptHandle, fn(InterceptHandle)>);

impl ScopedIntercept {
    pub fn new(handle: InterceptHandle) -> Self {
        Self(scopeguard::guard(
            handle,
            release_quietly as fn(InterceptHandle),
        ))
    }

    pub fn handle(&self) -> &InterceptHandle {
        &self.0
    }

    pub fn release(self) {}
}

/// Installs an after-hook whose builder receives the hook's own handle, so the
/// hook can arrange its removal. Returns `None` when the host refused.
pub fn install_self_removing_after<F>(
    host: &dyn PatchHost,
    target: &ModuleRef,
    method: &str,
    build: F,
) -> Option<InterceptHandle>
where
    F: FnOnce(InterceptHandle) -> Arc<dyn AfterHook>,
{
    let handle = InterceptHandle::inert(format!("{}.{} (scoped)", target.name, method));
    let hook = build(handle.clone());
    match host.after(target, method, hook) {
        Ok(unpatch) => {
            handle.arm(unpatch);
            debug!("Installed scoped intercept '{}'", handle.label());
            Some(handle)
        }
        Err(e) => {
            warn!("Failed to install scoped intercept on {}: {}", target, e);
            None
        }
    }
}

/// Nested intercepts a plugin instance still owns.
///
/// Most are released by their element's teardown. Closing the set releases
/// the rest, such as patches on a sheet that never rendered, and refuses any
/// later installation from a lazy load that resolves after unload.
#[derive(Clone)]
pub struct NestedIntercepts(Arc<Mutex<Option<Vec<InterceptHandle>>>>);

impl NestedIntercepts {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(Some(Vec::new()))))
    }

    pub fn is_open(&self) -> bool {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).is_some()
    }

    /// Intercepts installed through this set and not yet released.
    pub fn active(&self) -> usize {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map_or(0, |handles| handles.iter().filter(|h| h.is_active()).count())
    }

    /// [`install_self_removing_after`], tracked by this set. Returns `None`
    /// once the set is closed.
    pub fn install_after<F>(
        &self,
        host: &dyn PatchHost,
        target: &ModuleRef,
        method: &str,
        build: F,
    ) -> Option<InterceptHandle>
    where
        F: FnOnce(InterceptHandle) -> Arc<dyn AfterHook>,
    {
        let mut slot = self.0.lock().unwrap_or_else(|e| e.into_inner());
        let Some(handles) = slot.as_mut() else {
            debug!("Not patching {}.{}: plugin unloaded", target, method);
            return None;
        };
        handles.retain(InterceptHandle::is_active);
        let handle = install_self_removing_after(host, target, method, build)?;
        handles.push(handle.clone());
        Some(handle)
    }

    /// Releases everything outstanding and refuses further installs. Returns
    /// the number of reversals that failed; later calls do nothing.
    pub fn close(&self) -> usize {
        let handles = self.0.lock().unwrap_or_else(|e| e.into_inner()).take();
        let Some(handles) = handles else {
            return 0;
        };
        let outstanding: Vec<_> = handles.into_iter().filter(|h| h.is_active()).collect();
        let mut failures = 0;
        for handle in &outstanding {
            if let Err(e) = handle.release() {
                warn!("Failed to remove scoped intercept '{}': {}", handle.label(), e);
                failures += 1;
            }
        }
        if !outstanding.is_empty() {
            info!("Removed {} outstanding scoped intercepts", outstanding.len());
        }
        failures
    }
}

impl Default for NestedIntercepts {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{CallArgs, CallResult, MemoryHost, UiNode};

    struct TeardownHook {
        handle: InterceptHandle,
    }

    impl AfterHook for TeardownHook {
        fn after(&self, args: &mut CallArgs, result: &mut CallResult) {
            if let CallArgs::Render(ctx) = args {
                let scope = ScopedIntercept::new(self.handle.clone());
                ctx.on_unmount(move || scope.release());
            }
            if let CallResult::Element(UiNode::Fragment(items)) = result {
                items.push(UiNode::Text("decorated".into()));
            }
        }
    }

    #[test]
    fn test_scoped_intercept_removed_on_unmount() {
        let host = MemoryHost::new();
        let component = host.add_component("Sheet", UiNode::Fragment(vec![]));
        let handle = install_self_removing_after(&host, &component, "default", |handle| {
            Arc::new(TeardownHook { handle })
        })
        .expect("installed");
        assert!(handle.is_active());

        let element = host.render(&component).unwrap();
        assert_eq!(element.tree.children().len(), 1);
        assert_eq!(host.patch_count(&component, "default"), 1);

        element.unmount();
        assert!(!handle.is_active());
        assert_eq!(host.patch_count(&component, "default"), 0);

        let plain = host.render(&component).unwrap();
        assert!(plain.tree.children().is_empty());
    }

    #[test]
    fn test_dropping_scope_releases() {
        let host = MemoryHost::new();
        let component = host.add_component("Sheet", UiNode::Fragment(vec![]));
        let handle = install_self_removing_after(&host, &component, "default", |handle| {
            Arc::new(TeardownHook { handle })
        })
        .unwrap();
        drop(ScopedIntercept::new(handle.clone()));
        assert!(!handle.is_active());
        assert_eq!(host.total_patches(), 0);
    }

    #[test]
    fn test_close_releases_unrendered_and_refuses_new() {
        let host = MemoryHost::new();
        let component = host.add_component("Sheet", UiNode::Fragment(vec![]));
        let nested = NestedIntercepts::new();
        let build = |handle| -> Arc<dyn AfterHook> { Arc::new(TeardownHook { handle }) };

        let handle = nested
            .install_after(&host, &component, "default", build)
            .unwrap();
        assert_eq!(nested.active(), 1);

        assert_eq!(nested.close(), 0);
        assert!(!handle.is_active());
        assert!(!nested.is_open());
        assert_eq!(host.total_patches(), 0);

        assert!(
            nested
                .install_after(&host, &component, "default", build)
                .is_none()
        );
        assert_eq!(host.total_patches(), 0);
        assert_eq!(nested.close(), 0);
    }

    #[test]
    fn test_unmounted_intercepts_are_pruned() {
        let host = MemoryHost::new();
        let component = host.add_component("Sheet", UiNode::Fragment(vec![]));
        let nested = NestedIntercepts::new();
        nested
            .install_after(&host, &component, "default", |handle| {
                Arc::new(TeardownHook { handle })
            })
            .unwrap();
        host.render(&component).unwrap().unmount();
        assert_eq!(nested.active(), 0);
        assert_eq!(nested.close(), 0);
    }

    #[test]
    fn test_refused_install_returns_none() {
        let host = MemoryHost::new();
        let component = host.add_component("Sheet", UiNode::Fragment(vec![]));
        host.remove_module(&component);
        let handle = install_self_removing_after(&host, &component, "default", |handle| {
            Arc::new(TeardownHook { handle })
        });
        assert!(handle.is_none());
    }
}
