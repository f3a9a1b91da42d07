//! Host side of the weft editor.
//!
//! The host owns the platform webview that renders the editor surface. This
//! crate wraps that webview ([`ExtendedWebView`]), keeps the HTML it loads in
//! sync with a file on disk ([`ContentSynchronizer`]), talks to the editor
//! through a typed stub ([`EditorRemote`]) and turns drag-and-drop payloads
//! into editor commands ([`DropTranslator`]).
//!
//! # Architecture
//!
//! - `webview`: platform webview trait, script injection, message posting
//! - `sync`: cache-busted `WebViewSource` publication, last issued update wins
//! - `editor_api`: typed calls into the editor and the host-side interface
//! - `drop`: note and file drops to a single `dropItems` command
//! - `note`: note records and their markdown links

pub mod drop;
pub mod editor_api;
mod error;
pub mod note;
pub mod sync;
pub mod webview;

pub use drop::{
    CommandSink, DragPayload, DropEvent, DropResult, DropTranslator, DroppedFile, NOTE_IDS_MIME,
};
pub use editor_api::{EditorRemote, host_interface};
pub use error::HostError;
pub use note::{Note, NoteLookup};
pub use sync::{
    ContentSynchronizer, FsStore, HtmlStore, SourceFileUpdateEvent, UpdateOutcome, WebViewSource,
};
pub use webview::{ExtendedWebView, WebView, WebViewPort};
