//! Typed access to the editor running in the webview, and the interface the
//! host exposes back to it.

use serde::de::DeserializeOwned;
use serde_json::Value;
use weft_bridge::{BridgeError, LocalInterface, Messenger, RemoteError, Transport};
use weft_editor_core::{EditorEvent, LayerId};
use weft_editor_webview::api::{editor, host};
use weft_editor_webview::{ExecCommandArgs, KeymapBindingArgs, SelectArgs, SetCursorArgs};

/// Remote stub for the editor's API.
pub struct EditorRemote<T: Transport> {
    messenger: Messenger<T>,
}

impl<T: Transport> Clone for EditorRemote<T> {
    fn clone(&self) -> Self {
        Self {
            messenger: self.messenger.clone(),
        }
    }
}

impl<T: Transport> EditorRemote<T> {
    pub fn new(messenger: Messenger<T>) -> Self {
        Self { messenger }
    }

    pub fn messenger(&self) -> &Messenger<T> {
        &self.messenger
    }

    async fn call<R: DeserializeOwned>(&self, method: &str, args: Value) -> Result<R, BridgeError> {
        self.messenger.call(method, &args).await
    }

    pub async fn insert_text(&self, text: &str) -> Result<(), BridgeError> {
        self.call(editor::INSERT_TEXT, Value::from(text)).await
    }

    pub async fn exec_command(&self, name: &str, args: Value) -> Result<Value, BridgeError> {
        self.messenger
            .call(editor::EXEC_COMMAND, &ExecCommandArgs::new(name, args))
            .await
    }

    pub async fn supports_command(&self, name: &str) -> Result<bool, BridgeError> {
        self.call(editor::SUPPORTS_COMMAND, Value::from(name)).await
    }

    /// Returns whether there was anything to undo.
    pub async fn undo(&self) -> Result<bool, BridgeError> {
        self.call(editor::UNDO, Value::Null).await
    }

    pub async fn redo(&self) -> Result<bool, BridgeError> {
        self.call(editor::REDO, Value::Null).await
    }

    pub async fn clear_history(&self) -> Result<(), BridgeError> {
        self.call(editor::CLEAR_HISTORY, Value::Null).await
    }

    pub async fn get_value(&self) -> Result<String, BridgeError> {
        self.call(editor::GET_VALUE, Value::Null).await
    }

    pub async fn set_value(&self, text: &str) -> Result<(), BridgeError> {
        self.call(editor::SET_VALUE, Value::from(text)).await
    }

    pub async fn select(&self, anchor: usize, head: usize) -> Result<(), BridgeError> {
        self.messenger
            .call(editor::SELECT, &SelectArgs { anchor, head })
            .await
    }

    pub async fn set_cursor(&self, line: usize, col: usize) -> Result<(), BridgeError> {
        self.messenger
            .call(editor::SET_CURSOR, &SetCursorArgs { line, col })
            .await
    }

    /// Prepend a layer of chord to command bindings. Returns the layer id.
    pub async fn prepend_keymap(&self, bindings: &[KeymapBindingArgs]) -> Result<LayerId, BridgeError> {
        self.messenger.call(editor::PREPEND_KEYMAP, bindings).await
    }

    pub async fn remove_keymap(&self, id: LayerId) -> Result<bool, BridgeError> {
        self.call(editor::REMOVE_KEYMAP, Value::from(id)).await
    }
}

/// The interface the host exposes to the editor.
///
/// Log lines are re-emitted through `tracing` under the `weft::webview`
/// target; editor events go to `on_event`.
pub fn host_interface<F>(on_event: F) -> LocalInterface
where
    F: Fn(EditorEvent) + Send + Sync + 'static,
{
    LocalInterface::new()
        .method(host::LOG_MESSAGE, |message: String| {
            tracing::info!(target: "weft::webview", "{message}");
            Ok::<_, RemoteError>(())
        })
        .method(host::ON_EDITOR_EVENT, move |event: EditorEvent| {
            on_event(event);
            Ok::<_, RemoteError>(())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use weft_bridge::memory_pair;
    use weft_editor_core::EditorConfig;
    use weft_editor_webview::api::DEFAULT_CHANNEL;
    use weft_editor_webview::init_editor;

    #[tokio::test]
    async fn test_remote_drives_editor() {
        let (host_end, view_end) = memory_pair();
        let session = init_editor("", EditorConfig::default(), view_end.port);
        session.spawn_serve(view_end.inbound);

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let messenger = Messenger::new(DEFAULT_CHANNEL, host_end.port);
        messenger.set_local_interface(host_interface(move |event| sink.lock().unwrap().push(event)));
        messenger.spawn_serve(host_end.inbound);
        let remote = EditorRemote::new(messenger);

        remote.set_value("Hello\nWorld\n").await.unwrap();
        remote.set_cursor(1, 2).await.unwrap();
        remote.insert_text("!").await.unwrap();
        assert_eq!(remote.get_value().await.unwrap(), "Hello\nWo!rld\n");

        assert!(remote.undo().await.unwrap());
        assert!(remote.redo().await.unwrap());
        remote.clear_history().await.unwrap();
        assert!(!remote.undo().await.unwrap());

        remote.select(0, 5).await.unwrap();
        assert!(remote.supports_command("toggleComment").await.unwrap());
        remote.exec_command("toggleComment", Value::Null).await.unwrap();
        assert_eq!(remote.get_value().await.unwrap(), "<!-- Hello -->\nWo!rld\n");

        let layer = remote
            .prepend_keymap(&[KeymapBindingArgs::new("Ctrl-e", "selectAll")])
            .await
            .unwrap();
        assert!(remote.remove_keymap(layer).await.unwrap());

        // A final round-trip so every event notification has been handled.
        remote.get_value().await.unwrap();
        let events = events.lock().unwrap();
        assert!(events.contains(&EditorEvent::Change {
            value: "Hello\nWo!rld\n".into()
        }));
        assert!(events.iter().any(|e| matches!(e, EditorEvent::UndoRedoDepthChange { undo_depth: 0, .. })));
    }
}
