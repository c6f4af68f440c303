use std::sync::Arc;
use vmhook::Plugin;
use vmhook::host::{MemoryHost, PatchHost};
use vmhook::types::ActionType;

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
fn test_double_deactivate_is_noop() {
    let host = full_host();
    let mut plugin = Plugin::builder(host.clone()).activate();
    assert_eq!(plugin.intercept_labels().len(), 6);

    assert_eq!(plugin.deactivate(), 0);
    assert_eq!(host.total_patches(), 0);
    assert_eq!(plugin.deactivate(), 0);
    assert!(!plugin.is_active());
}

#[test]
fn test_activation_survives_missing_targets() {
    let host = Arc::new(MemoryHost::new());
    host.add_module("CloudUploader", &["CloudUpload"]);
    host.add_action_handler(ActionType::MessageCreate, "MessageStore");

    let mut plugin = Plugin::builder(host.clone()).activate();
    let labels = plugin.intercept_labels();
    assert_eq!(labels.len(), 2);
    assert!(labels.contains(&"CloudUploader.CloudUpload".to_string()));
    assert!(labels.contains(&"MessageStore.actionHandler".to_string()));

    assert_eq!(plugin.deactivate(), 0);
    assert_eq!(host.total_patches(), 0);
}

#[test]
fn test_unloaded_module_does_not_break_deactivate() {
    let host = full_host();
    let mut plugin = Plugin::builder(host.clone()).activate();
    let uploader = host.find_by_props(&["uploadLocalFiles"]).unwrap();
    host.remove_module(&uploader);

    assert_eq!(plugin.deactivate(), 0);
    assert_eq!(host.total_patches(), 0);
}

#[test]
fn test_reactivation_after_deactivate() {
    let host = full_host();
    let mut first = Plugin::builder(host.clone()).activate();
    first.deactivate();
    let second = Plugin::builder(host.clone()).activate();
    assert_eq!(host.total_patches(), 6);
    drop(second);
    assert_eq!(host.total_patches(), 0);
}
