use miette::Diagnostic;
use smol_str::SmolStr;
use weft_bridge::BridgeError;

/// Errors raised on the host side.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[non_exhaustive]
pub enum HostError {
    #[error("ExtendedWebView({instance_id}): webview is not loaded")]
    #[diagnostic(
        code(weft::host::not_loaded),
        help("wait for the webview's load event before injecting scripts")
    )]
    WebViewNotLoaded { instance_id: SmolStr },

    #[error("could not resolve note {id}: {reason}")]
    #[diagnostic(code(weft::host::note_resolution))]
    NoteResolutionFailed { id: SmolStr, reason: String },

    #[error("malformed drop payload")]
    #[diagnostic(code(weft::host::drop_payload))]
    InvalidDropPayload(#[source] serde_json::Error),

    /// A newer content update was issued while this one was in flight.
    #[error("content update superseded")]
    #[diagnostic(code(weft::host::stale_update))]
    StaleUpdateDiscarded,

    #[error("content file i/o failed")]
    #[diagnostic(code(weft::host::io))]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Bridge(#[from] BridgeError),
}

impl From<serde_json::Error> for HostError {
    fn from(err: serde_json::Error) -> Self {
        Self::Bridge(BridgeError::Serialization(err))
    }
}
