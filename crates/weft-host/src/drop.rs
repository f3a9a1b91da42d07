//! Drag-and-drop onto the editor.
//!
//! A drop either carries internal note ids (under [`NOTE_IDS_MIME`]) or files
//! from outside the application. Either way it becomes exactly one `dropItems`
//! command on the editor.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::join_all;
use n0_future::task::JoinHandle;
use serde_json::Value;
use smol_str::SmolStr;
use weft_bridge::Transport;
use weft_editor_core::{DropItems, EditorCommandType};

use crate::editor_api::EditorRemote;
use crate::error::HostError;
use crate::note::NoteLookup;

/// MIME type under which dragged notes carry a JSON array of their ids.
pub const NOTE_IDS_MIME: &str = "text/x-weft-note-ids";

/// Runs editor commands.
pub trait CommandSink: Send + Sync + 'static {
    fn exec_command(&self, name: &str, args: Value) -> impl Future<Output = Result<Value, HostError>> + Send;
}

impl<T: Transport> CommandSink for EditorRemote<T> {
    async fn exec_command(&self, name: &str, args: Value) -> Result<Value, HostError> {
        Ok(EditorRemote::exec_command(self, name, args).await?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DroppedFile {
    /// Files without a local path (e.g. dragged from a browser) have none.
    pub path: Option<String>,
}

impl DroppedFile {
    pub fn at(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}

/// The parts of a platform drop event the translator looks at.
#[derive(Debug, Clone, Default)]
pub struct DropEvent {
    /// MIME types offered by the drag source.
    pub types: Vec<String>,
    /// String data by MIME type.
    pub data: HashMap<String, String>,
    pub files: Vec<DroppedFile>,
    /// Alt was held when the drop happened.
    pub alt_key: bool,
}

impl DropEvent {
    pub fn notes(ids: &[&str]) -> Self {
        let mut data = HashMap::new();
        data.insert(
            NOTE_IDS_MIME.to_owned(),
            Value::from(ids.to_vec()).to_string(),
        );
        Self {
            types: vec![NOTE_IDS_MIME.to_owned()],
            data,
            ..Self::default()
        }
    }

    pub fn files(files: Vec<DroppedFile>, alt_key: bool) -> Self {
        Self {
            types: vec!["Files".to_owned()],
            files,
            alt_key,
            ..Self::default()
        }
    }

    pub fn get_data(&self, mime: &str) -> Option<&str> {
        self.data.get(mime).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragPayload {
    NoteReference { ids: Vec<SmolStr> },
    FileReference { paths: Vec<String>, create_file_url: bool },
}

impl DragPayload {
    /// Classify a drop. `None` if it carries nothing the editor takes.
    pub fn classify(event: &DropEvent) -> Result<Option<Self>, HostError> {
        if event.types.iter().any(|t| t == NOTE_IDS_MIME) {
            let raw = event.get_data(NOTE_IDS_MIME).unwrap_or("[]");
            let ids = serde_json::from_str(raw).map_err(HostError::InvalidDropPayload)?;
            return Ok(Some(Self::NoteReference { ids }));
        }
        if !event.files.is_empty() {
            let paths = event
                .files
                .iter()
                .filter_map(|file| file.path.clone())
                .collect();
            return Ok(Some(Self::FileReference {
                paths,
                create_file_url: event.alt_key,
            }));
        }
        Ok(None)
    }
}

pub enum DropResult {
    /// Not ours; let the platform handle it.
    Ignored,
    /// Claimed. The task resolves once the command has run.
    Claimed(JoinHandle<Result<Value, HostError>>),
}

impl DropResult {
    pub fn is_claimed(&self) -> bool {
        matches!(self, Self::Claimed(_))
    }
}

/// Turns drops into `dropItems` commands.
pub struct DropTranslator<C, N> {
    commands: Arc<C>,
    notes: Arc<N>,
}

impl<C, N> Clone for DropTranslator<C, N> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
            notes: self.notes.clone(),
        }
    }
}

impl<C: CommandSink, N: NoteLookup> DropTranslator<C, N> {
    pub fn new(commands: C, notes: N) -> Self {
        Self {
            commands: Arc::new(commands),
            notes: Arc::new(notes),
        }
    }

    /// Handle a drop. Must be called from within a tokio runtime when the drop
    /// is claimed.
    pub fn handle(&self, event: &DropEvent) -> Result<DropResult, HostError> {
        let Some(payload) = DragPayload::classify(event)? else {
            return Ok(DropResult::Ignored);
        };
        let this = self.clone();
        let task = n0_future::task::spawn(async move { this.dispatch(payload).await });
        Ok(DropResult::Claimed(task))
    }

    async fn dispatch(&self, payload: DragPayload) -> Result<Value, HostError> {
        let items = match payload {
            DragPayload::NoteReference { ids } => DropItems::Notes {
                markdown_tags: self.resolve_notes(&ids).await,
            },
            DragPayload::FileReference {
                paths,
                create_file_url,
            } => DropItems::Files {
                paths,
                create_file_url,
            },
        };
        let args = serde_json::to_value(&items)?;
        self.commands
            .exec_command(EditorCommandType::DropItems.as_str(), args)
            .await
    }

    /// Resolve every id concurrently. Output follows input order; ids that
    /// fail to resolve are left out.
    async fn resolve_notes(&self, ids: &[SmolStr]) -> Vec<String> {
        let loads = ids.iter().map(|id| self.notes.load(id));
        join_all(loads)
            .await
            .into_iter()
            .zip(ids)
            .filter_map(|(result, id)| match result {
                Ok(note) => Some(note.markdown_tag()),
                Err(e) => {
                    tracing::warn!(note = %id, error = %e, "skipping dropped note");
                    None
                }
            })
            .collect()
    }
}
