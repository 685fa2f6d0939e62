//! Artifact data model for the TTS Orchestrator
//!
//! This module defines the data model for model artifacts: named bundles of
//! model weights plus configuration, the unit of activation.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtifactStatus {
    /// The artifact is serving inference requests
    Active,
    /// The artifact is registered but not serving
    Inactive,
}

impl fmt::Display for ArtifactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactStatus::Active => write!(f, "ACTIVE"),
            ArtifactStatus::Inactive => write!(f, "INACTIVE"),
        }
    }
}

/// A named model artifact bundle
///
/// An artifact's files are immutable once registered; re-registering the same
/// name is a full replacement, never a partial overwrite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    /// Unique, filesystem-safe identifier
    pub name: String,
    /// Lifecycle status
    pub status: ArtifactStatus,
    /// Storage location of the bundle directory
    pub path: PathBuf,
    /// When the bundle was registered
    pub registered_at: DateTime<Utc>,
    /// Total size of the bundle in bytes
    pub size_bytes: u64,
    /// SHA-256 digest of the weights file, when computed
    pub weights_sha256: Option<String>,
}

impl Artifact {
    /// Returns true if the artifact is currently active
    pub fn is_active(&self) -> bool {
        self.status == ArtifactStatus::Active
    }
}

/// Resolved paths of the required files inside a bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    /// Bundle root directory
    pub root: PathBuf,
    /// Weights file path
    pub weights: PathBuf,
    /// Configuration file path
    pub config: PathBuf,
}

/// Roster of registered artifacts, split by status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInventory {
    /// The active artifact, if one is serving
    pub active: Option<Artifact>,
    /// All inactive candidates
    pub inactive: Vec<Artifact>,
}
