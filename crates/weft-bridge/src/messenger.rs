//! Symmetric RPC endpoint.
//!
//! Each side of the bridge owns a [`Messenger`]: it exposes a
//! [`LocalInterface`] (method name to handler) to the other side and offers
//! `call` / `notify` to reach the other side's interface. Both directions share
//! one transport; the channel name keeps several messengers on one transport
//! apart.

use std::collections::HashMap;
use std::fmt;
use std::any::Any;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use n0_future::boxed::BoxFuture;
use n0_future::{FutureExt, Stream, StreamExt, future};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use smol_str::SmolStr;
use tokio::sync::{oneshot, watch};

use crate::error::BridgeError;
use crate::message::{Message, Outcome, Payload, RemoteError};
use crate::transport::Transport;

type HandlerResult = Result<Value, RemoteError>;

#[derive(Clone)]
enum Handler {
    /// Runs inline in the receive loop, so calls are handled in arrival order.
    Sync(Arc<dyn Fn(Value) -> HandlerResult + Send + Sync>),
    /// Spawned; the reply is sent whenever the future resolves.
    Async(Arc<dyn Fn(Value) -> BoxFuture<HandlerResult> + Send + Sync>),
}

/// Methods this side exposes to the other side.
#[derive(Clone, Default)]
pub struct LocalInterface {
    methods: HashMap<SmolStr, Handler>,
}

impl LocalInterface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a synchronous method with typed arguments and result.
    ///
    /// Arguments that fail to deserialize produce an `InvalidArguments` error reply.
    pub fn method<A, R, E, F>(mut self, name: &str, handler: F) -> Self
    where
        A: DeserializeOwned,
        R: Serialize,
        E: Into<RemoteError>,
        F: Fn(A) -> Result<R, E> + Send + Sync + 'static,
    {
        let method = SmolStr::new(name);
        let wrapped = move |args: Value| -> HandlerResult {
            let args: A = serde_json::from_value(args)
                .map_err(|e| RemoteError::invalid_arguments(&method, e))?;
            let result = handler(args).map_err(Into::<RemoteError>::into)?;
            serde_json::to_value(result).map_err(|e| RemoteError::new("Serialization", e))
        };
        self.methods
            .insert(SmolStr::new(name), Handler::Sync(Arc::new(wrapped)));
        self
    }

    /// Add an asynchronous method with typed arguments and result.
    pub fn method_async<A, R, E, F, Fut>(mut self, name: &str, handler: F) -> Self
    where
        A: DeserializeOwned + Send + 'static,
        R: Serialize,
        E: Into<RemoteError>,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        let method = SmolStr::new(name);
        let handler = Arc::new(handler);
        let wrapped = move |args: Value| -> BoxFuture<HandlerResult> {
            let parsed: Result<A, _> = serde_json::from_value(args);
            let method = method.clone();
            let handler = handler.clone();
            Box::pin(async move {
                let args = parsed.map_err(|e| RemoteError::invalid_arguments(&method, e))?;
                let result = handler(args).await.map_err(Into::<RemoteError>::into)?;
                serde_json::to_value(result).map_err(|e| RemoteError::new("Serialization", e))
            })
        };
        self.methods
            .insert(SmolStr::new(name), Handler::Async(Arc::new(wrapped)));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    fn get(&self, name: &str) -> Option<Handler> {
        self.methods.get(name).cloned()
    }
}

impl fmt::Debug for LocalInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.methods.keys()).finish()
    }
}

#[derive(Default)]
struct Pending {
    closed: bool,
    calls: HashMap<u64, oneshot::Sender<Outcome>>,
}

struct Inner<T> {
    channel: SmolStr,
    transport: T,
    next_id: AtomicU64,
    pending: Mutex<Pending>,
    /// Flipped once on close; wakes a `serve` loop parked on its inbound stream.
    shutdown: watch::Sender<bool>,
    local: Mutex<Arc<LocalInterface>>,
}

/// One endpoint of the bridge.
///
/// Cheap to clone; clones share pending calls and the local interface.
pub struct Messenger<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Messenger<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Transport> Messenger<T> {
    pub fn new(channel: impl Into<SmolStr>, transport: T) -> Self {
        Self {
            inner: Arc::new(Inner {
                channel: channel.into(),
                transport,
                next_id: AtomicU64::new(1),
                pending: Mutex::default(),
                shutdown: watch::Sender::new(false),
                local: Mutex::default(),
            }),
        }
    }

    pub fn channel(&self) -> &str {
        &self.inner.channel
    }

    /// Replace the interface exposed to the other side.
    pub fn set_local_interface(&self, local: LocalInterface) {
        *lock(&self.inner.local) = Arc::new(local);
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.inner.pending).closed
    }

    /// Number of calls still waiting for a reply.
    pub fn pending_calls(&self) -> usize {
        lock(&self.inner.pending).calls.len()
    }

    /// Call a method on the other side and wait for its reply.
    ///
    /// There is no timeout: the call resolves when the reply arrives or when
    /// the transport closes.
    pub async fn call<A, R>(&self, method: &str, args: &A) -> Result<R, BridgeError>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let args = serde_json::to_value(args)?;
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = lock(&self.inner.pending);
            if pending.closed {
                return Err(BridgeError::TransportClosed);
            }
            // Registered before sending so a fast reply always finds its slot.
            pending.calls.insert(id, tx);
        }

        let message = Message::call(&self.inner.channel, method, args, Some(id));
        if let Err(e) = self.post(&message) {
            lock(&self.inner.pending).calls.remove(&id);
            return Err(e);
        }
        tracing::trace!(channel = %self.inner.channel, method, id, "call sent");

        match rx.await {
            Ok(Outcome::Ok(value)) => Ok(serde_json::from_value(value)?),
            Ok(Outcome::Err(err)) => Err(BridgeError::from_reply(method, err)),
            Err(_) => Err(BridgeError::TransportClosed),
        }
    }

    /// Invoke a method on the other side without waiting for a result.
    pub fn notify<A>(&self, method: &str, args: &A) -> Result<(), BridgeError>
    where
        A: Serialize + ?Sized,
    {
        if self.is_closed() {
            return Err(BridgeError::TransportClosed);
        }
        let args = serde_json::to_value(args)?;
        self.post(&Message::call(&self.inner.channel, method, args, None))
    }

    /// Process inbound messages until the stream ends or the messenger is
    /// closed, then close.
    ///
    /// Returning drops this clone of the messenger, and with the last clone the
    /// transport, so the other side sees its inbound stream end.
    pub async fn serve<S>(self, mut inbound: S)
    where
        S: Stream<Item = String> + Unpin,
    {
        let mut shutdown = self.inner.shutdown.subscribe();
        loop {
            let closed = async {
                let _ = shutdown.wait_for(|closed| *closed).await;
                None
            };
            let Some(text) = future::or(closed, inbound.next()).await else {
                break;
            };
            self.handle_text(&text);
        }
        tracing::debug!(channel = %self.inner.channel, "serve loop finished");
        self.close();
    }

    /// Spawn [`serve`](Self::serve) on the current runtime.
    pub fn spawn_serve<S>(&self, inbound: S) -> n0_future::task::JoinHandle<()>
    where
        S: Stream<Item = String> + Unpin + Send + 'static,
    {
        n0_future::task::spawn(self.clone().serve(inbound))
    }

    /// Mark the transport closed and reject every pending call.
    pub fn close(&self) {
        let calls = {
            let mut pending = lock(&self.inner.pending);
            pending.closed = true;
            std::mem::take(&mut pending.calls)
        };
        self.inner.shutdown.send_replace(true);
        if !calls.is_empty() {
            tracing::debug!(
                channel = %self.inner.channel,
                rejected = calls.len(),
                "rejecting pending calls"
            );
        }
        // Dropping the senders makes each waiting call resolve to TransportClosed.
        drop(calls);
    }

    /// Handle one inbound JSON message. Does nothing once closed.
    pub fn handle_text(&self, text: &str) {
        if self.is_closed() {
            tracing::trace!(channel = %self.inner.channel, "closed, dropping inbound message");
            return;
        }
        let message = match Message::from_json(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, "dropping undecodable message");
                return;
            }
        };
        if message.channel != self.inner.channel {
            tracing::trace!(channel = %message.channel, "ignoring message for another channel");
            return;
        }

        match message.payload {
            Payload::Reply(outcome) => self.resolve(message.correlation_id, outcome),
            Payload::Call { method, args } => self.dispatch(method, args, message.correlation_id),
        }
    }

    fn resolve(&self, correlation_id: Option<u64>, outcome: Outcome) {
        let Some(id) = correlation_id else {
            tracing::warn!("reply without correlation id");
            return;
        };
        let slot = lock(&self.inner.pending).calls.remove(&id);
        match slot {
            // The caller may have given up; nothing to do then.
            Some(tx) => {
                let _ = tx.send(outcome);
            }
            None => tracing::warn!(id, "reply for unknown correlation id"),
        }
    }

    fn dispatch(&self, method: SmolStr, args: Value, correlation_id: Option<u64>) {
        let local = lock(&self.inner.local).clone();
        let Some(handler) = local.get(&method) else {
            tracing::warn!(method = %method, "call to unknown local method");
            if let Some(id) = correlation_id {
                self.reply(id, Outcome::Err(RemoteError::unknown_method(&method)));
            }
            return;
        };

        // A panicking handler becomes an error reply; the loop keeps serving.
        match handler {
            Handler::Sync(f) => {
                let result = catch_unwind(AssertUnwindSafe(|| f(args)))
                    .unwrap_or_else(|panic| Err(handler_panicked(&method, panic)));
                self.finish(&method, correlation_id, result);
            }
            Handler::Async(f) => {
                let this = self.clone();
                n0_future::task::spawn(async move {
                    let result = AssertUnwindSafe(async move { f(args).await })
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|panic| Err(handler_panicked(&method, panic)));
                    this.finish(&method, correlation_id, result);
                });
            }
        }
    }

    fn finish(&self, method: &str, correlation_id: Option<u64>, result: HandlerResult) {
        match correlation_id {
            Some(id) => self.reply(id, result.into()),
            None => {
                if let Err(e) = result {
                    tracing::warn!(method, error = %e, "notification handler failed");
                }
            }
        }
    }

    fn reply(&self, id: u64, outcome: Outcome) {
        if self.is_closed() {
            tracing::debug!(id, "closed, not replying");
            return;
        }
        let message = Message::reply(&self.inner.channel, id, outcome);
        if let Err(e) = self.post(&message) {
            tracing::debug!(id, error = %e, "could not send reply");
        }
    }

    fn post(&self, message: &Message) -> Result<(), BridgeError> {
        let text = message.to_json()?;
        let result = self.inner.transport.post(text);
        if matches!(result, Err(BridgeError::TransportClosed)) {
            self.close();
        }
        result
    }
}

fn handler_panicked(method: &str, panic: Box<dyn Any + Send>) -> RemoteError {
    let reason = panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned());
    tracing::error!(method, %reason, "handler panicked");
    RemoteError::new("HandlerPanicked", format!("{method} panicked: {reason}"))
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
