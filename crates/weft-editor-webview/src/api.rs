//! Method names and argument types shared by both sides of the bridge.
//!
//! The host drives the editor through the methods in [`editor`]; the editor
//! reports back through the methods in [`host`]. Arguments are JSON values with
//! camelCase field names.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;

/// Channel name used when none is configured.
pub const DEFAULT_CHANNEL: &str = "weft-editor";

/// Methods the editor exposes to the host.
pub mod editor {
    pub const INSERT_TEXT: &str = "insertText";
    pub const EXEC_COMMAND: &str = "execCommand";
    pub const SUPPORTS_COMMAND: &str = "supportsCommand";
    pub const UNDO: &str = "undo";
    pub const REDO: &str = "redo";
    pub const CLEAR_HISTORY: &str = "clearHistory";
    pub const GET_VALUE: &str = "getValue";
    pub const SET_VALUE: &str = "setValue";
    pub const SELECT: &str = "select";
    pub const SET_CURSOR: &str = "setCursor";
    pub const PREPEND_KEYMAP: &str = "prependKeymap";
    pub const REMOVE_KEYMAP: &str = "removeKeymap";

    pub const ALL: &[&str] = &[
        INSERT_TEXT,
        EXEC_COMMAND,
        SUPPORTS_COMMAND,
        UNDO,
        REDO,
        CLEAR_HISTORY,
        GET_VALUE,
        SET_VALUE,
        SELECT,
        SET_CURSOR,
        PREPEND_KEYMAP,
        REMOVE_KEYMAP,
    ];
}

/// Methods the host exposes to the editor. Both are sent as notifications.
pub mod host {
    pub const LOG_MESSAGE: &str = "logMessage";
    pub const ON_EDITOR_EVENT: &str = "onEditorEvent";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecCommandArgs {
    pub name: SmolStr,
    #[serde(default)]
    pub args: Value,
}

impl ExecCommandArgs {
    pub fn new(name: impl Into<SmolStr>, args: Value) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectArgs {
    pub anchor: usize,
    pub head: usize,
}

/// Zero-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetCursorArgs {
    pub line: usize,
    pub col: usize,
}

/// One binding in a remotely prepended keymap layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeymapBindingArgs {
    /// CodeMirror-style chord, e.g. `Mod-Shift-k`.
    pub chord: String,
    pub command: SmolStr,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub args: Value,
}

impl KeymapBindingArgs {
    pub fn new(chord: impl Into<String>, command: impl Into<SmolStr>) -> Self {
        Self {
            chord: chord.into(),
            command: command.into(),
            args: Value::Null,
        }
    }
}
