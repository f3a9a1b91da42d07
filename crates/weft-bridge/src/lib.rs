//! Host <-> webview messaging.
//!
//! This crate provides:
//! - `Message`: the JSON wire envelope (channel, call/reply payload, correlation id)
//! - `Transport`: where outbound messages go, plus an in-memory pair for tests and tools
//! - `Messenger`: symmetric RPC endpoint with a local interface and correlated remote calls
//! - `inject`: wrapping and failure reporting for injected scripts

pub mod error;
pub mod inject;
pub mod message;
pub mod messenger;
pub mod transport;

pub use error::BridgeError;
pub use inject::{InjectionScope, wrap_injected_script};
pub use message::{Message, Outcome, Payload, RemoteError};
pub use messenger::{LocalInterface, Messenger};
pub use transport::{MemoryEnd, MemoryPort, Transport, memory_pair};
