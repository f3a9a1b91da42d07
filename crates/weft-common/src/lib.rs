//! weft-common: shared plumbing for the weft crates.
//!
//! Error diagnostics, configuration files and tracing setup.

pub mod config;
pub mod error;
#[cfg(feature = "telemetry")]
pub mod telemetry;

pub use crate::config::{
    Config, EditorConfig, FileStore, Loader, Saver, TelemetrySettings, WebViewConfig,
};
pub use crate::error::{ParseError, SerDeError, WeftError};
