use serde::{Deserialize, Serialize};

/// Events the editor reports to whoever embeds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EditorEvent {
    /// Document content changed. Carries the full new value.
    Change { value: String },
    #[serde(rename_all = "camelCase")]
    SelectionChange { anchor: usize, head: usize },
    #[serde(rename_all = "camelCase")]
    UndoRedoDepthChange { undo_depth: usize, redo_depth: usize },
}
