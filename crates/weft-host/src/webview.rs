//! Host-side wrapper around a platform webview.

use std::sync::Arc;

use serde::Serialize;
use smol_str::SmolStr;
use weft_bridge::{BridgeError, InjectionScope, Transport, wrap_injected_script};

use crate::error::HostError;
use crate::sync::{ContentSynchronizer, FsStore, HtmlStore, UpdateOutcome, WebViewSource};

/// What the host needs from a platform webview.
pub trait WebView: Send + Sync + 'static {
    fn is_loaded(&self) -> bool;

    /// Evaluate a script in the page. Errors carry the page's exception text.
    fn inject_javascript(&self, script: &str) -> Result<(), String>;

    /// Deliver a text message to the page's message listener.
    fn post_message(&self, text: String) -> Result<(), BridgeError>;

    /// Point the webview at `source`, or at nothing.
    fn load(&self, source: Option<&WebViewSource>);
}

/// A webview with script injection, message posting and file-backed content.
pub struct ExtendedWebView<W: WebView, S: HtmlStore = FsStore> {
    instance_id: SmolStr,
    view: Arc<W>,
    content: ContentSynchronizer<S>,
}

impl<W: WebView, S: HtmlStore> ExtendedWebView<W, S> {
    pub fn new(view: W, content: ContentSynchronizer<S>) -> Self {
        Self {
            instance_id: SmolStr::new(content.instance_id()),
            view: Arc::new(view),
            content,
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn view(&self) -> &W {
        &self.view
    }

    pub fn content(&self) -> &ContentSynchronizer<S> {
        &self.content
    }

    /// Run a script in the page.
    ///
    /// The script is wrapped so an exception is logged in the page before it
    /// propagates. Failures are also logged here, then returned.
    pub fn inject_js(&self, js: &str) -> Result<(), HostError> {
        if !self.view.is_loaded() {
            return Err(HostError::WebViewNotLoaded {
                instance_id: self.instance_id.clone(),
            });
        }
        let script = wrap_injected_script(js);
        let label = format!("ExtendedWebView({})", self.instance_id);
        InjectionScope::new(label, |message: String| {
            tracing::error!(target: "weft::webview", "{message}");
        })
        .run(|| self.view.inject_javascript(&script))?;
        Ok(())
    }

    /// Serialize `message` as JSON and post it to the page.
    pub fn post_message<M: Serialize + ?Sized>(&self, message: &M) -> Result<(), HostError> {
        let text = serde_json::to_string(message)?;
        Ok(self.view.post_message(text)?)
    }

    /// Replace the page content.
    ///
    /// Once the update settles, the webview is pointed at whatever source is
    /// current; a superseded update leaves the view alone.
    pub async fn set_html(&self, html: &str) -> Result<UpdateOutcome, HostError> {
        let outcome = self.content.update(html).await?;
        if outcome != UpdateOutcome::Superseded {
            self.view.load(self.content.source().as_ref());
        }
        Ok(outcome)
    }

    /// A messenger transport that posts through this webview.
    pub fn port(&self) -> WebViewPort<W> {
        WebViewPort {
            view: self.view.clone(),
        }
    }
}

/// [`Transport`] posting raw message text to a webview.
pub struct WebViewPort<W> {
    view: Arc<W>,
}

impl<W> Clone for WebViewPort<W> {
    fn clone(&self) -> Self {
        Self {
            view: self.view.clone(),
        }
    }
}

impl<W: WebView> Transport for WebViewPort<W> {
    fn post(&self, text: String) -> Result<(), BridgeError> {
        self.view.post_message(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct FakeView {
        loaded: AtomicBool,
        scripts: Mutex<Vec<String>>,
        posted: Mutex<Vec<String>>,
        sources: Mutex<Vec<Option<WebViewSource>>>,
        fail_with: Mutex<Option<String>>,
    }

    impl WebView for FakeView {
        fn is_loaded(&self) -> bool {
            self.loaded.load(Ordering::SeqCst)
        }

        fn inject_javascript(&self, script: &str) -> Result<(), String> {
            self.scripts.lock().unwrap().push(script.to_owned());
            match self.fail_with.lock().unwrap().clone() {
                Some(e) => Err(e),
                None => Ok(()),
            }
        }

        fn post_message(&self, text: String) -> Result<(), BridgeError> {
            self.posted.lock().unwrap().push(text);
            Ok(())
        }

        fn load(&self, source: Option<&WebViewSource>) {
            self.sources.lock().unwrap().push(source.cloned());
        }
    }

    fn webview(dir: &Path) -> ExtendedWebView<FakeView> {
        ExtendedWebView::new(
            FakeView::default(),
            ContentSynchronizer::new(FsStore, "note-viewer", dir),
        )
    }

    #[test]
    fn test_inject_before_load_fails() {
        let dir = tempfile::tempdir().unwrap();
        let view = webview(dir.path());
        let err = view.inject_js("1 + 1").unwrap_err();
        assert!(matches!(err, HostError::WebViewNotLoaded { ref instance_id } if instance_id == "note-viewer"));
        assert!(view.view().scripts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_inject_wraps_script() {
        let dir = tempfile::tempdir().unwrap();
        let view = webview(dir.path());
        view.view().loaded.store(true, Ordering::SeqCst);
        view.inject_js("scroll(0)").unwrap();
        let scripts = view.view().scripts.lock().unwrap();
        assert_eq!(scripts.as_slice(), [wrap_injected_script("scroll(0)")]);
    }

    #[test]
    fn test_inject_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let view = webview(dir.path());
        view.view().loaded.store(true, Ordering::SeqCst);
        *view.view().fail_with.lock().unwrap() = Some("TypeError: x is null".into());
        let err = view.inject_js("x.y").unwrap_err();
        assert!(matches!(
            err,
            HostError::Bridge(BridgeError::InjectionFailure(ref e)) if e == "TypeError: x is null"
        ));
    }

    #[test]
    fn test_post_message_serializes() {
        let dir = tempfile::tempdir().unwrap();
        let view = webview(dir.path());
        view.post_message(&serde_json::json!({"type": "ping"})).unwrap();
        view.port().post("raw".into()).unwrap();
        assert_eq!(
            *view.view().posted.lock().unwrap(),
            vec![r#"{"type":"ping"}"#.to_string(), "raw".to_string()]
        );
    }

    #[tokio::test]
    async fn test_set_html_loads_source() {
        let dir = tempfile::tempdir().unwrap();
        let view = webview(dir.path());
        let outcome = view.set_html("<p>note</p>").await.unwrap();
        let UpdateOutcome::Published(source) = outcome else {
            panic!("expected a published source");
        };
        view.set_html("").await.unwrap();
        assert_eq!(*view.view().sources.lock().unwrap(), vec![Some(source), None]);
    }
}
