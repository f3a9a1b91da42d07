use miette::Diagnostic;
use smol_str::SmolStr;

use crate::message::RemoteError;

/// Error type for messenger operations
#[derive(Debug, thiserror::Error, Diagnostic)]
#[non_exhaustive]
pub enum BridgeError {
    /// The other side has no handler for the method.
    #[error("remote side has no method {0}")]
    #[diagnostic(code(weft::bridge::unknown_method))]
    UnknownRemoteMethod(SmolStr),

    /// The transport went away. Pending calls are rejected with this and new
    /// calls fail immediately.
    #[error("transport closed")]
    #[diagnostic(
        code(weft::bridge::closed),
        help("the webview was torn down or its message channel ended")
    )]
    TransportClosed,

    #[error("failed to encode or decode message")]
    #[diagnostic(code(weft::bridge::serde))]
    Serialization(#[from] serde_json::Error),

    /// The remote handler ran and reported an error.
    #[error("remote call failed")]
    #[diagnostic(code(weft::bridge::remote))]
    Remote(#[source] RemoteError),

    /// An injected script raised.
    #[error("injected script failed: {0}")]
    #[diagnostic(code(weft::bridge::injection))]
    InjectionFailure(String),
}

impl BridgeError {
    /// Turn an error reply into the matching local error.
    pub(crate) fn from_reply(method: &str, err: RemoteError) -> Self {
        if err.is_unknown_method() {
            Self::UnknownRemoteMethod(SmolStr::new(method))
        } else {
            Self::Remote(err)
        }
    }

    /// The remote error kind, if this came from an error reply.
    pub fn remote_kind(&self) -> Option<&str> {
        match self {
            Self::Remote(err) => Some(err.kind.as_str()),
            Self::UnknownRemoteMethod(_) => Some("UnknownRemoteMethod"),
            _ => None,
        }
    }
}
