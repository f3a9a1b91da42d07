use miette::Diagnostic;
use weft_bridge::{BridgeError, RemoteError};
use weft_editor_core::EditorError;

#[derive(Debug, thiserror::Error, Diagnostic)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Editor(#[from] EditorError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Bridge(#[from] BridgeError),
}

impl From<SessionError> for RemoteError {
    fn from(err: SessionError) -> Self {
        match &err {
            SessionError::Editor(e) => RemoteError::new(e.kind(), e),
            SessionError::Bridge(e) => RemoteError::new("BridgeError", e),
        }
    }
}
