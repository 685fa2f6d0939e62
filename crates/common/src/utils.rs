//! Utility functions for the TTS Orchestrator

use crate::error::{Error, Result};

/// Maximum accepted length of a model name
pub const MAX_NAME_LENGTH: usize = 128;

/// Checks that a model name is usable as a directory name
///
/// Names are explicit identifiers: they key the storage layout and the
/// metadata ledger, so anything that could escape a directory or collide with
/// the staging area is rejected.
pub fn validate_model_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidArgument("model name is empty".to_string()));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(Error::InvalidArgument(format!(
            "model name exceeds {} characters",
            MAX_NAME_LENGTH
        )));
    }
    if name.starts_with('.') {
        return Err(Error::InvalidArgument(format!(
            "model name must not start with '.': {}",
            name
        )));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(Error::InvalidArgument(format!(
            "model name contains unsupported character {:?}: {}",
            bad, name
        )));
    }
    Ok(())
}

/// Formats a byte size into a human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f64 = bytes as f64;
    let base = 1024_f64;
    let exponent = (bytes_f64.ln() / base.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);

    let value = bytes_f64 / base.powi(exponent as i32);
    format!("{:.1} {}", value, UNITS[exponent])
}
