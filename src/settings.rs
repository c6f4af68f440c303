//! User-facing toggles, persisted by the host's settings store.

use crate::error::StoreError;
use log::{debug, warn};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

pub const SEND_AS_VM: &str = "sendAsVM";
pub const ALL_AS_VM: &str = "allAsVM";

/// Key/value store owned by the host. Values that are not booleans read as
/// absent.
pub trait SettingsStore: Send + Sync {
    fn get_bool(&self, key: &str) -> Option<bool>;
    fn set_bool(&self, key: &str, value: bool) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginSettings {
    /// Turn the user's own audio uploads into voice messages.
    pub send_as_vm: bool,
    /// Turn every received audio attachment into a voice message.
    pub all_as_vm: bool,
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            send_as_vm: true,
            all_as_vm: false,
        }
    }
}

impl PluginSettings {
    /// Current values, falling back to defaults for absent keys.
    pub fn load(store: &dyn SettingsStore) -> Self {
        let defaults = Self::default();
        Self {
            send_as_vm: store.get_bool(SEND_AS_VM).unwrap_or(defaults.send_as_vm),
            all_as_vm: store.get_bool(ALL_AS_VM).unwrap_or(defaults.all_as_vm),
        }
    }

    /// Writes defaults for keys that are absent or not booleans. Existing
    /// values are left alone.
    pub fn ensure_defaults(store: &dyn SettingsStore) {
        let defaults = Self::default();
        for (key, value) in [
            (SEND_AS_VM, defaults.send_as_vm),
            (ALL_AS_VM, defaults.all_as_vm),
        ] {
            if store.get_bool(key).is_none() {
                debug!("Initializing setting {} = {}", key, value);
                if let Err(e) = store.set_bool(key, value) {
                    warn!("Failed to initialize setting {}: {}", key, e);
                }
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct MemorySettings {
    values: RwLock<HashMap<String, bool>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, key: &str, value: bool) -> Self {
        self.values
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value);
        self
    }
}

impl SettingsStore for MemorySettings {
    fn get_bool(&self, key: &str) -> Option<bool> {
        self.values
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .copied()
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<(), StoreError> {
        self.values
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value);
        Ok(())
    }
}

/// Settings kept in a JSON object on disk. Unknown keys are preserved.
#[derive(Debug)]
pub struct JsonFileSettings {
    path: PathBuf,
    values: RwLock<Map<String, Value>>,
}

impl JsonFileSettings {
    /// Opens `path`, treating a missing file as empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let values = match std::fs::read(&path) {
            Ok(raw) => serde_json::from_slice(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileSettings {
    fn get_bool(&self, key: &str) -> Option<bool> {
        self.values
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .and_then(Value::as_bool)
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<(), StoreError> {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), Value::Bool(value));
        let raw = serde_json::to_vec_pretty(&*values)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}
