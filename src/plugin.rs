use crate::action_sheet::{ActionSheetHook, OPEN_LAZY_METHOD, SHEET_MODULE_PROPS};
use crate::config::PluginConfig;
use crate::gates::{ACTION_HANDLER_METHOD, ReceiveGate, UPLOAD_METHODS, UploadGate};
use crate::host::PatchHost;
use crate::registry::InterceptRegistry;
use crate::scoped::NestedIntercepts;
use crate::settings::{MemorySettings, PluginSettings, SettingsStore};
use crate::transform::VoiceTransformer;
use log::info;
use std::sync::Arc;
use vmcore::types::ActionType;

pub struct PluginBuilder {
    host: Arc<dyn PatchHost>,
    settings: Option<Arc<dyn SettingsStore>>,
    config: PluginConfig,
    placeholder_seed: Option<u64>,
}

impl PluginBuilder {
    fn new(host: Arc<dyn PatchHost>) -> Self {
        Self {
            host,
            settings: None,
            config: PluginConfig::default(),
            placeholder_seed: None,
        }
    }

    pub fn with_settings(mut self, settings: Arc<dyn SettingsStore>) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn with_config(mut self, config: PluginConfig) -> Self {
        self.config = config;
        self
    }

    /// Seeds the receive path's placeholder generator.
    pub fn with_placeholder_seed(mut self, seed: u64) -> Self {
        self.placeholder_seed = Some(seed);
        self
    }

    /// Installs every intercept the host supports. Surfaces the host lacks are
    /// skipped with a warning; activation itself never fails.
    pub fn activate(self) -> Plugin {
        let settings = self
            .settings
            .unwrap_or_else(|| Arc::new(MemorySettings::new()));
        PluginSettings::ensure_defaults(settings.as_ref());

        let host = self.host;
        let config = self.config;
        let mut registry = InterceptRegistry::new();

        let upload_gate = Arc::new(UploadGate::new(
            settings.clone(),
            VoiceTransformer::from_config(&config),
        ));
        for method in UPLOAD_METHODS {
            let target = host.find_by_props(&[method]);
            registry.register_before(host.as_ref(), target, method, upload_gate.clone());
        }

        let mut receive_gate = ReceiveGate::new(settings.clone(), config.transformer());
        if let Some(seed) = self.placeholder_seed {
            receive_gate = receive_gate.with_seed(seed);
        }
        let receive_gate = Arc::new(receive_gate);
        for action in ActionType::ALL {
            let target = host.action_handler(action, &config.message_store);
            registry.register_before(
                host.as_ref(),
                target,
                ACTION_HANDLER_METHOD,
                receive_gate.clone(),
            );
        }

        let nested = NestedIntercepts::new();
        let sheet_hook = Arc::new(ActionSheetHook::new(
            host.clone(),
            config.sheet_insert_index,
            nested.clone(),
        ));
        let target = host.find_by_props(&SHEET_MODULE_PROPS);
        registry.register_before(host.as_ref(), target, OPEN_LAZY_METHOD, sheet_hook);

        info!(
            "Voice message plugin active with {} intercepts: {:?}",
            registry.len(),
            registry.labels()
        );
        Plugin {
            registry,
            nested,
            settings,
        }
    }
}

/// An activated plugin. Dropping it removes every intercept it installed.
pub struct Plugin {
    registry: InterceptRegistry,
    nested: NestedIntercepts,
    settings: Arc<dyn SettingsStore>,
}

impl Plugin {
    pub fn builder(host: Arc<dyn PatchHost>) -> PluginBuilder {
        PluginBuilder::new(host)
    }

    /// Removes every installed intercept, including action-sheet patches
    /// still waiting for their sheet to unmount. Returns the number that
    /// failed to reverse; calling again does nothing.
    pub fn deactivate(&mut self) -> usize {
        self.registry.deactivate_all() + self.nested.close()
    }

    pub fn is_active(&self) -> bool {
        !self.registry.is_empty() || self.nested.is_open()
    }

    pub fn intercept_labels(&self) -> Vec<String> {
        self.registry.labels()
    }

    pub fn settings(&self) -> PluginSettings {
        PluginSettings::load(self.settings.as_ref())
    }
}

impl Drop for Plugin {
    fn drop(&mut self) {
        self.deactivate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use crate::settings::{ALL_AS_VM, SEND_AS_VM};

    fn full_host() -> Arc<MemoryHost> {
        let host = Arc::new(MemoryHost::new());
        host.add_module("Uploader", &["uploadLocalFiles"]);
        host.add_module("CloudUploader", &["CloudUpload"]);
        host.add_module("ActionSheet", &["openLazy", "hideActionSheet"]);
        for action in ActionType::ALL {
            host.add_action_handler(action, "MessageStore");
        }
        host
    }

    #[test]
    fn test_activate_installs_everything() {
        let host = full_host();
        let mut plugin = Plugin::builder(host.clone()).activate();
        assert_eq!(host.total_patches(), 6);
        assert!(plugin.is_active());
        assert!(
            plugin
                .intercept_labels()
                .contains(&"Uploader.uploadLocalFiles".to_string())
        );

        assert_eq!(plugin.deactivate(), 0);
        assert_eq!(host.total_patches(), 0);
        assert!(!plugin.is_active());
        assert_eq!(plugin.deactivate(), 0);
    }

    #[test]
    fn test_missing_surfaces_are_skipped() {
        let host = Arc::new(MemoryHost::new());
        host.add_module("Uploader", &["uploadLocalFiles"]);
        let plugin = Plugin::builder(host.clone()).activate();
        assert_eq!(plugin.intercept_labels(), vec!["Uploader.uploadLocalFiles"]);
        assert_eq!(host.total_patches(), 1);
    }

    #[test]
    fn test_defaults_written_on_activate() {
        let settings = Arc::new(MemorySettings::new().with(ALL_AS_VM, true));
        let plugin = Plugin::builder(full_host())
            .with_settings(settings.clone())
            .activate();
        assert_eq!(settings.get_bool(SEND_AS_VM), Some(true));
        assert!(plugin.settings().all_as_vm);
    }

    #[test]
    fn test_drop_removes_intercepts() {
        let host = full_host();
        {
            let _plugin = Plugin::builder(host.clone()).activate();
            assert_eq!(host.total_patches(), 6);
        }
        assert_eq!(host.total_patches(), 0);
    }
}
