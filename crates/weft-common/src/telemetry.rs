//! Tracing setup for weft binaries.
//!
//! # Usage
//!
//! ```ignore
//! use weft_common::telemetry::{self, TelemetryConfig};
//!
//! fn main() {
//!     telemetry::init(TelemetryConfig::from_env("weft-cli"));
//!     tracing::info!("started");
//! }
//! ```

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::TelemetrySettings;

/// Telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name, logged once at startup
    pub service_name: String,
    /// Console log level (default: INFO, DEBUG in debug builds)
    pub console_level: Level,
    /// Filter directive used when `RUST_LOG` is unset. Overrides `console_level`.
    pub filter: Option<String>,
}

impl TelemetryConfig {
    /// Load config from environment variables.
    ///
    /// - `RUST_LOG`: Standard env filter (optional, overrides everything else)
    pub fn from_env(service_name: impl Into<String>) -> Self {
        let console_level = if cfg!(debug_assertions) {
            Level::DEBUG
        } else {
            Level::INFO
        };

        Self {
            service_name: service_name.into(),
            console_level,
            filter: None,
        }
    }

    /// Apply the `[telemetry]` section of a config file.
    pub fn with_settings(mut self, settings: &TelemetrySettings) -> Self {
        if settings.filter.is_some() {
            self.filter = settings.filter.clone();
        }
        self
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| match &self.filter {
            Some(directive) => EnvFilter::new(directive),
            None => EnvFilter::new(self.console_level.as_str().to_lowercase()),
        })
    }
}

/// Initialize console tracing.
///
/// Call once at application startup. A second call is a no-op apart from a warning.
pub fn init(config: TelemetryConfig) {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .with_filter(config.env_filter());

    match tracing_subscriber::registry().with(console_layer).try_init() {
        Ok(()) => tracing::debug!(service = %config.service_name, "telemetry initialized"),
        Err(e) => tracing::warn!(error = %e, "tracing already initialized"),
    }
}
