use crate::error::HostError;
use crate::host::{AfterHook, BeforeHook, ModuleRef, PatchHost, Unpatch};
use log::{debug, info, warn};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Reversal token for one installed intercept.
///
/// Clones share the same slot, so whichever clone releases first performs the
/// reversal and every later release is a no-op.
#[derive(Clone)]
pub struct InterceptHandle {
    label: Arc<str>,
    slot: Arc<Mutex<Option<Unpatch>>>,
}

impl InterceptHandle {
    /// A handle that reverses nothing.
    pub fn inert(label: impl Into<Arc<str>>) -> Self {
        Self {
            label: label.into(),
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Attaches the host's reversal to a handle created before installation.
    /// Needed when the interceptor has to hold its own handle.
    pub(crate) fn arm(&self, unpatch: Unpatch) {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(unpatch);
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_active(&self) -> bool {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).is_some()
    }

    /// Reverses the installation. Only the first call does anything.
    pub fn release(&self) -> Result<(), HostError> {
        let unpatch = self.slot.lock().unwrap_or_else(|e| e.into_inner()).take();
        match unpatch {
            Some(unpatch) => unpatch(),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for InterceptHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptHandle")
            .field("label", &self.label)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Owns every top-level intercept the plugin installed.
///
/// Registration never fails: a missing host surface is logged and yields an
/// inert handle so the remaining registrations still go through.
#[derive(Debug, Default)]
pub struct InterceptRegistry {
    handles: Vec<InterceptHandle>,
}

impl InterceptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_before(
        &mut self,
        host: &dyn PatchHost,
        target: Option<ModuleRef>,
        method: &str,
        hook: Arc<dyn BeforeHook>,
    ) -> InterceptHandle {
        self.register(host, target, method, |host, target| {
            host.before(target, method, hook)
        })
    }

    pub fn register_after(
        &mut self,
        host: &dyn PatchHost,
        target: Option<ModuleRef>,
        method: &str,
        hook: Arc<dyn AfterHook>,
    ) -> InterceptHandle {
        self.register(host, target, method, |host, target| {
            host.after(target, method, hook)
        })
    }

    fn register<F>(
        &mut self,
        host: &dyn PatchHost,
        target: Option<ModuleRef>,
        method: &str,
        install: F,
    ) -> InterceptHandle
    where
        F: FnOnce(&dyn PatchHost, &ModuleRef) -> Result<Unpatch, HostError>,
    {
        let Some(target) = target else {
            warn!("Skipping intercept '{}': host target not found", method);
            return InterceptHandle::inert(method);
        };
        let label = format!("{}.{}", target.name, method);
        if !host.has_method(&target, method) {
            warn!("Skipping intercept '{}': method not found", label);
            return InterceptHandle::inert(label);
        }

        match install(host, &target) {
            Ok(unpatch) => {
                let handle = InterceptHandle::inert(label);
                handle.arm(unpatch);
                debug!("Installed intercept '{}'", handle.label());
                self.handles.push(handle.clone());
                handle
            }
            Err(e) => {
                warn!("Failed to install intercept '{}': {}", label, e);
                InterceptHandle::inert(label)
            }
        }
    }

    /// Number of handles still waiting to be released.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.handles.iter().map(|h| h.label().to_string()).collect()
    }

    /// Releases every handle once, in registration order. A failing reversal
    /// is logged and does not stop the rest. Returns the number of failures.
    pub fn deactivate_all(&mut self) -> usize {
        if self.handles.is_empty() {
            return 0;
        }
        let total = self.handles.len();
        let mut failures = 0;
        for handle in self.handles.drain(..) {
            if let Err(e) = handle.release() {
                warn!("Error while removing intercept '{}': {}", handle.label(), e);
                failures += 1;
            }
        }
        info!(
            "Removed {} intercepts ({} failed)",
            total - failures,
            failures
        );
        failures
    }
}
