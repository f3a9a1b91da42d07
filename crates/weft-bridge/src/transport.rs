//! Outbound transports and an in-memory transport pair.

use std::sync::Arc;

use n0_future::boxed::BoxStream;
use n0_future::stream;
use tokio::sync::mpsc;

use crate::error::BridgeError;

/// Where a messenger sends its serialized messages.
///
/// Inbound messages are not part of this trait: they are fed to
/// [`Messenger::serve`](crate::Messenger::serve) as a stream.
pub trait Transport: Send + Sync + 'static {
    /// Post one JSON text message. Fails with `TransportClosed` once the peer is gone.
    fn post(&self, text: String) -> Result<(), BridgeError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn post(&self, text: String) -> Result<(), BridgeError> {
        (**self).post(text)
    }
}

/// Sending half of an in-memory link.
#[derive(Debug, Clone)]
pub struct MemoryPort {
    tx: mpsc::UnboundedSender<String>,
}

impl Transport for MemoryPort {
    fn post(&self, text: String) -> Result<(), BridgeError> {
        self.tx.send(text).map_err(|_| BridgeError::TransportClosed)
    }
}

/// One side of an in-memory link: a port to post on and the stream of
/// messages posted by the other side.
pub struct MemoryEnd {
    pub port: MemoryPort,
    pub inbound: BoxStream<String>,
}

/// Create two connected in-memory ends.
///
/// Each end's inbound stream finishes once every clone of the other end's
/// port is dropped.
pub fn memory_pair() -> (MemoryEnd, MemoryEnd) {
    let (a_tx, a_rx) = mpsc::unbounded_channel();
    let (b_tx, b_rx) = mpsc::unbounded_channel();
    let a = MemoryEnd {
        port: MemoryPort { tx: a_tx },
        inbound: receiver_stream(b_rx),
    };
    let b = MemoryEnd {
        port: MemoryPort { tx: b_tx },
        inbound: receiver_stream(a_rx),
    };
    (a, b)
}

fn receiver_stream(receiver: mpsc::UnboundedReceiver<String>) -> BoxStream<String> {
    let stream = stream::unfold(receiver, |mut receiver| async move {
        let text = receiver.recv().await?;
        Some((text, receiver))
    });
    Box::pin(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use n0_future::StreamExt;

    #[tokio::test]
    async fn test_memory_pair_delivers_in_order() {
        let (a, mut b) = memory_pair();
        a.port.post("one".into()).unwrap();
        a.port.post("two".into()).unwrap();
        drop(a);

        assert_eq!(b.inbound.next().await.as_deref(), Some("one"));
        assert_eq!(b.inbound.next().await.as_deref(), Some("two"));
        assert_eq!(b.inbound.next().await, None);
    }

    #[tokio::test]
    async fn test_post_after_peer_dropped_fails() {
        let (a, b) = memory_pair();
        drop(b);
        assert!(matches!(
            a.port.post("x".into()),
            Err(BridgeError::TransportClosed)
        ));
    }
}
