//! Error types for the TTS Orchestrator
//!
//! This module defines the error taxonomy used throughout the TTS Orchestrator
//! system. Callers match on the variants to distinguish retryable storage
//! failures from permanent validation failures.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for TTS Orchestrator operations
pub type Result<T> = std::result::Result<T, Error>;

/// A file every model bundle must carry at its root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequiredFile {
    /// The model weights file
    Weights,
    /// The model configuration file
    Config,
}

impl fmt::Display for RequiredFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequiredFile::Weights => write!(f, "weights file"),
            RequiredFile::Config => write!(f, "config file"),
        }
    }
}

/// Error type for TTS Orchestrator operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error from the storage layer
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A model with this name is already registered
    #[error("Duplicate model name: {0}")]
    DuplicateName(String),

    /// The bundle is structurally incomplete
    #[error("Invalid artifact: missing {missing}")]
    InvalidArtifact {
        /// Which required file was absent
        missing: RequiredFile,
    },

    /// No model registered under this name
    #[error("Model not found: {0}")]
    NotFound(String),

    /// The named model is currently active and cannot be deleted
    #[error("Cannot delete active model: {0}")]
    CannotDeleteActive(String),

    /// The inference engine rejected the artifact
    #[error("Model load failed: {0}")]
    LoadFailure(String),

    /// No model is serving; synthesis requests cannot be handled
    #[error("Service not ready: {0}")]
    NotReady(String),

    /// Invalid request argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns true if the error is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Returns true if the error is a duplicate name error
    pub fn is_duplicate_name(&self) -> bool {
        matches!(self, Error::DuplicateName(_))
    }

    /// Returns true if the error is an invalid artifact error
    pub fn is_invalid_artifact(&self) -> bool {
        matches!(self, Error::InvalidArtifact { .. })
    }

    /// Returns true if the error is a load failure
    pub fn is_load_failure(&self) -> bool {
        matches!(self, Error::LoadFailure(_))
    }

    /// Returns true if the error is a not ready error
    pub fn is_not_ready(&self) -> bool {
        matches!(self, Error::NotReady(_))
    }

    /// Returns true if the error is a storage-layer IO error
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_))
    }
}
