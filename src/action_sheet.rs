//! Download and copy-URL rows for voice messages in the long-press sheet.

use crate::host::ui::{ActionRow, PressHandler};
use crate::host::{
    AfterHook, BeforeHook, CallArgs, CallResult, MediaActions, ModuleRef, PatchHost, SheetOpen,
    UiNode,
};
use crate::registry::InterceptHandle;
use crate::scoped::{NestedIntercepts, ScopedIntercept};
use async_trait::async_trait;
use log::{debug, error};
use std::sync::Arc;
use vmcore::types::Message;

pub const MESSAGE_LONG_PRESS_SHEET: &str = "MessageLongPressActionSheet";
pub const BUTTON_ROW: &str = "ButtonRow";
pub const OPEN_LAZY_METHOD: &str = "openLazy";
pub const SHEET_MODULE_PROPS: [&str; 2] = ["openLazy", "hideActionSheet"];

pub const DOWNLOAD_ROW_KEY: &str = "vm-download";
pub const COPY_ROW_KEY: &str = "vm-copy";

/// Media kind the host's downloader uses for audio assets.
const AUDIO_ASSET_KIND: u32 = 0;

/// Hooks the lazy sheet opener. Each long-press on a message patches the
/// sheet component once it loads; that patch lives until the sheet unmounts
/// or `nested` is closed.
pub struct ActionSheetHook {
    host: Arc<dyn PatchHost>,
    insert_index: usize,
    nested: NestedIntercepts,
}

impl ActionSheetHook {
    pub fn new(host: Arc<dyn PatchHost>, insert_index: usize, nested: NestedIntercepts) -> Self {
        Self {
            host,
            insert_index,
            nested,
        }
    }

    fn on_open(&self, open: &SheetOpen) {
        if open.sheet_name != MESSAGE_LONG_PRESS_SHEET {
            return;
        }
        let Some(message) = open.message.clone() else {
            return;
        };
        let host = self.host.clone();
        let insert_index = self.insert_index;
        let nested = self.nested.clone();
        open.component.then(move |component: ModuleRef| {
            let media = host.media_actions();
            nested.install_after(host.as_ref(), &component, "default", |handle| {
                Arc::new(SheetRenderHook {
                    handle,
                    message,
                    media,
                    insert_index,
                })
            });
        });
    }
}

#[async_trait]
impl BeforeHook for ActionSheetHook {
    async fn before(&self, args: &mut CallArgs) {
        if let CallArgs::OpenSheet(open) = args {
            self.on_open(open);
        }
    }
}

struct SheetRenderHook {
    handle: InterceptHandle,
    message: Message,
    media: Option<Arc<dyn MediaActions>>,
    insert_index: usize,
}

impl SheetRenderHook {
    fn rows(&self) -> Option<Vec<UiNode>> {
        if !self.message.is_voice_message() {
            return None;
        }
        let url = self.message.voice_attachment()?.url.clone()?;
        let media = self.media.clone()?;
        Some(vec![
            UiNode::Row(download_row(media.clone(), url.clone())),
            UiNode::Row(copy_row(media, url)),
        ])
    }
}

impl AfterHook for SheetRenderHook {
    fn after(&self, args: &mut CallArgs, result: &mut CallResult) {
        if let CallArgs::Render(context) = args {
            let scope = ScopedIntercept::new(self.handle.clone());
            context.on_unmount(move || scope.release());
        }

        let CallResult::Element(tree) = result else {
            return;
        };
        let Some(rows) = self.rows() else {
            return;
        };
        let Some(UiNode::Fragment(buttons)) = tree.find_mut(&is_button_list) else {
            debug!(
                "No button list in {} for message {}",
                MESSAGE_LONG_PRESS_SHEET, self.message.id
            );
            return;
        };
        let at = self.insert_index.min(buttons.len());
        for (offset, row) in rows.into_iter().enumerate() {
            buttons.insert(at + offset, row);
        }
    }
}

fn is_button_list(node: &UiNode) -> bool {
    matches!(node, UiNode::Fragment(children)
        if children.first().and_then(UiNode::kind) == Some(BUTTON_ROW))
}

fn download_row(media: Arc<dyn MediaActions>, url: String) -> ActionRow {
    ActionRow {
        key: DOWNLOAD_ROW_KEY.to_string(),
        label: "Download Voice Message".to_string(),
        icon: "ic_download_24px".to_string(),
        on_press: PressHandler::new(move || {
            let media = media.clone();
            let url = url.clone();
            async move {
                if let Err(e) = media.download_media_asset(&url, AUDIO_ASSET_KIND).await {
                    error!("Failed to download voice message {}: {}", url, e);
                }
                media.hide_action_sheet();
            }
        }),
    }
}

fn copy_row(media: Arc<dyn MediaActions>, url: String) -> ActionRow {
    ActionRow {
        key: COPY_ROW_KEY.to_string(),
        label: "Copy Voice Message URL".to_string(),
        icon: "copy".to_string(),
        on_press: PressHandler::new(move || {
            let media = media.clone();
            let url = url.clone();
            async move {
                media.set_clipboard(&url);
                media.hide_action_sheet();
            }
        }),
    }
}
