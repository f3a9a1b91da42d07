//! Keeps the HTML shown by the webview in a file and publishes cache-busted
//! sources for it.
//!
//! Each update writes the HTML to `<base>/<instance>.html` and publishes a new
//! [`WebViewSource`] whose URI carries a random `r` query parameter, so the
//! webview reloads even though the path never changes.
//!
//! Updates may overlap. The last one *issued* wins: every update gets a
//! generation number when it is issued, writes to its own staging file, and is
//! only moved onto the stable path and published if no newer update was issued
//! in the meantime. A superseded update still runs to completion; its result is
//! dropped.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tokio::sync::{Mutex, watch};
use weft_common::WebViewConfig;

use crate::error::HostError;

/// What the webview should load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebViewSource {
    /// `file://` URI of the HTML file with a cache-busting query.
    pub uri: String,
    /// `file://` URI of the base directory; relative resources resolve against it.
    pub base_url: String,
}

/// Reported to the host after a new source is published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFileUpdateEvent {
    pub uri: String,
    pub base_url: String,
    pub file_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Published(WebViewSource),
    /// Empty HTML: there is nothing to show.
    Cleared,
    /// A newer update was issued before this one could commit.
    Superseded,
}

/// File operations used by the synchronizer.
pub trait HtmlStore: Send + Sync + 'static {
    fn write(&self, path: &Path, html: &str) -> impl Future<Output = io::Result<()>> + Send;
    /// Replace `to` with `from`.
    fn rename(&self, from: &Path, to: &Path) -> impl Future<Output = io::Result<()>> + Send;
    fn remove(&self, path: &Path) -> impl Future<Output = io::Result<()>> + Send;
}

/// [`HtmlStore`] on the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

impl HtmlStore for FsStore {
    async fn write(&self, path: &Path, html: &str) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, html).await
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        tokio::fs::rename(from, to).await
    }

    async fn remove(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_file(path).await
    }
}

type FileUpdateCallback = Box<dyn Fn(&SourceFileUpdateEvent) + Send + Sync>;

struct Inner<S> {
    store: S,
    instance_id: SmolStr,
    base_directory: PathBuf,
    issued: AtomicU64,
    /// Serializes commits. Holds the generation of the last committed update.
    committed: Mutex<u64>,
    source: watch::Sender<Option<WebViewSource>>,
    on_file_update: Option<FileUpdateCallback>,
}

/// Writes webview HTML to disk and publishes a fresh source per update.
pub struct ContentSynchronizer<S: HtmlStore = FsStore> {
    inner: Arc<Inner<S>>,
}

impl<S: HtmlStore> Clone for ContentSynchronizer<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl ContentSynchronizer<FsStore> {
    pub fn from_config(config: &WebViewConfig) -> Self {
        Self::new(FsStore, config.instance_id.as_str(), &config.base_directory)
    }
}

impl<S: HtmlStore> ContentSynchronizer<S> {
    pub fn new(store: S, instance_id: impl Into<SmolStr>, base_directory: impl AsRef<Path>) -> Self {
        Self::build(store, instance_id.into(), base_directory.as_ref(), None)
    }

    /// Like [`new`](Self::new), calling `callback` every time a source is published.
    pub fn with_file_update_callback(
        store: S,
        instance_id: impl Into<SmolStr>,
        base_directory: impl AsRef<Path>,
        callback: impl Fn(&SourceFileUpdateEvent) + Send + Sync + 'static,
    ) -> Self {
        Self::build(
            store,
            instance_id.into(),
            base_directory.as_ref(),
            Some(Box::new(callback)),
        )
    }

    fn build(
        store: S,
        instance_id: SmolStr,
        base_directory: &Path,
        on_file_update: Option<FileUpdateCallback>,
    ) -> Self {
        let (source, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                store,
                instance_id,
                base_directory: base_directory.to_path_buf(),
                issued: AtomicU64::new(0),
                committed: Mutex::new(0),
                source,
                on_file_update,
            }),
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.inner.instance_id
    }

    /// The stable path the HTML is written to.
    pub fn file_path(&self) -> PathBuf {
        self.inner.file_path()
    }

    pub fn base_url(&self) -> String {
        self.inner.base_url()
    }

    /// The most recently published source.
    pub fn source(&self) -> Option<WebViewSource> {
        self.inner.source.borrow().clone()
    }

    /// Watch published sources.
    pub fn subscribe(&self) -> watch::Receiver<Option<WebViewSource>> {
        self.inner.source.subscribe()
    }

    /// Issue a content update.
    ///
    /// The update is ordered against others when this is called, not when the
    /// returned future first runs.
    pub fn update(
        &self,
        html: &str,
    ) -> impl Future<Output = Result<UpdateOutcome, HostError>> + Send + use<S> {
        let generation = self.inner.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let inner = self.inner.clone();
        let html = html.to_owned();
        async move {
            match inner.apply(generation, html).await {
                Err(HostError::StaleUpdateDiscarded) => {
                    tracing::debug!(
                        instance = %inner.instance_id,
                        generation,
                        "content update superseded"
                    );
                    Ok(UpdateOutcome::Superseded)
                }
                other => other,
            }
        }
    }
}

impl<S: HtmlStore> Inner<S> {
    fn file_path(&self) -> PathBuf {
        self.base_directory.join(format!("{}.html", self.instance_id))
    }

    fn staging_path(&self, generation: u64) -> PathBuf {
        self.base_directory
            .join(format!("{}.{generation}.html.tmp", self.instance_id))
    }

    fn base_url(&self) -> String {
        format!("file://{}", self.base_directory.display())
    }

    fn is_latest(&self, generation: u64) -> bool {
        self.issued.load(Ordering::SeqCst) == generation
    }

    async fn apply(&self, generation: u64, html: String) -> Result<UpdateOutcome, HostError> {
        if html.is_empty() {
            let mut committed = self.committed.lock().await;
            if !self.is_latest(generation) {
                return Err(HostError::StaleUpdateDiscarded);
            }
            *committed = generation;
            self.source.send_replace(None);
            return Ok(UpdateOutcome::Cleared);
        }

        let staging = self.staging_path(generation);
        self.store.write(&staging, &html).await?;

        let mut committed = self.committed.lock().await;
        if !self.is_latest(generation) {
            drop(committed);
            if let Err(e) = self.store.remove(&staging).await {
                tracing::warn!(path = %staging.display(), error = %e, "could not remove staging file");
            }
            return Err(HostError::StaleUpdateDiscarded);
        }

        let path = self.file_path();
        self.store.rename(&staging, &path).await?;
        *committed = generation;

        let cache_bust: u32 = rand::rng().random_range(0..100_000_000);
        let source = WebViewSource {
            uri: format!("file://{}?r={cache_bust}", path.display()),
            base_url: self.base_url(),
        };
        self.source.send_replace(Some(source.clone()));
        tracing::debug!(instance = %self.instance_id, generation, uri = %source.uri, "source published");

        if let Some(callback) = &self.on_file_update {
            callback(&SourceFileUpdateEvent {
                uri: source.uri.clone(),
                base_url: source.base_url.clone(),
                file_path: path,
            });
        }
        Ok(UpdateOutcome::Published(source))
    }
}
