//! Serving state of the TTS Orchestrator
//!
//! This module provides the state representation for the system as a whole,
//! tracking whether a model is currently serving inference requests.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Represents the serving state of the system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServingState {
    /// No model is active
    NoModel {
        /// Why the system has no model, when known
        reason: Option<String>,
    },

    /// A candidate is being loaded
    Loading {
        /// Name of the candidate being loaded
        name: String,
    },

    /// A model is active and serving
    Serving {
        /// Name of the active model
        name: String,
    },

    /// The last activation failed and no model was serving before it
    LoadFailed {
        /// Why the load failed
        reason: String,
    },
}

impl ServingState {
    /// Creates the initial state
    pub fn new() -> Self {
        ServingState::NoModel { reason: None }
    }

    /// Returns true if a model is serving
    pub fn is_serving(&self) -> bool {
        matches!(self, ServingState::Serving { .. })
    }

    /// Returns true if no model is active
    pub fn is_no_model(&self) -> bool {
        matches!(self, ServingState::NoModel { .. })
    }

    /// Returns true if a load is in progress
    pub fn is_loading(&self) -> bool {
        matches!(self, ServingState::Loading { .. })
    }

    /// Returns true if the last load failed
    pub fn is_load_failed(&self) -> bool {
        matches!(self, ServingState::LoadFailed { .. })
    }

    /// Gets the serving model name, if any
    pub fn serving_model(&self) -> Option<&str> {
        match self {
            ServingState::Serving { name } => Some(name),
            _ => None,
        }
    }

    /// Gets the failure or no-model reason, if any
    pub fn reason(&self) -> Option<&str> {
        match self {
            ServingState::NoModel { reason } => reason.as_deref(),
            ServingState::LoadFailed { reason } => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Display for ServingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServingState::NoModel { reason: None } => write!(f, "NoModel"),
            ServingState::NoModel {
                reason: Some(reason),
            } => write!(f, "NoModel: {}", reason),
            ServingState::Loading { name } => write!(f, "Loading: {}", name),
            ServingState::Serving { name } => write!(f, "Serving: {}", name),
            ServingState::LoadFailed { reason } => write!(f, "LoadFailed: {}", reason),
        }
    }
}

impl Default for ServingState {
    fn default() -> Self {
        Self::new()
    }
}
