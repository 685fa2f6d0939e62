//! Structured logging setup for the TTS Orchestrator
//!
//! Initializes the global `tracing` subscriber. The filter comes from
//! `RUST_LOG` when set, otherwise from the configured default level.

use tracing_subscriber::EnvFilter;

use common::error::{Error, Result};

/// Initializes the global tracing subscriber
///
/// `default_directive` is used when `RUST_LOG` is not set, e.g. `"info"` or
/// `"tts_orchestrator=debug,info"`. Calling this twice returns an error.
pub fn init(default_directive: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| Error::Config(format!("failed to initialize logging: {}", e)))
}
