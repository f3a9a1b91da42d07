//! Editor side of the weft bridge.
//!
//! Runs inside the embedded editor surface. [`init_editor`] creates an
//! [`EditorControl`](weft_editor_core::EditorControl), exposes it to the host
//! as the messenger's local interface and forwards editor events and log
//! messages back to the host.

pub mod api;
mod error;
mod session;

pub use api::{ExecCommandArgs, KeymapBindingArgs, SelectArgs, SetCursorArgs};
pub use error::SessionError;
pub use session::{EditorSession, init_editor};
