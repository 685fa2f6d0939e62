//! Main integration module for the TTS Orchestrator
//!
//! Wires the configuration, artifact storage, metadata ledger, validator,
//! and synthesis backend into one service facade. The administrative surface
//! (an HTTP panel, a CLI) and the audio encoding of synthesized samples are
//! external collaborators; they call into this facade.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use artifact_store::{ArtifactStore, BundleSource, BundleValidator, MetadataLedger};
use common::artifact::{Artifact, ModelInventory};
use common::error::{Error, Result};
use common::types::{SynthesisParams, MAX_TEXT_LENGTH};
use config::ConfigManager;
use inference_engine::SynthesisEngine;
use lifecycle_core::{LifecycleManager, ServingState};

/// Snapshot of the service for status reporting
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    /// Current serving state
    pub state: ServingState,
    /// Name of the active model, if any
    pub active_model: Option<String>,
    /// Number of inactive candidates
    pub inactive_models: usize,
    /// Base directory of the artifact tree
    pub model_base_path: PathBuf,
}

/// The TTS Orchestrator service facade
pub struct TtsOrchestrator {
    /// Lifecycle manager
    lifecycle: Arc<LifecycleManager>,

    /// Base directory of the artifact tree
    model_base_path: PathBuf,
}

impl TtsOrchestrator {
    /// Creates the service from configuration and a synthesis backend
    pub fn new(config: &ConfigManager, engine: Arc<dyn SynthesisEngine>) -> Result<Self> {
        let base = config.get_path("model_base_path")?;
        let weights_filename = config.get_str("weights_filename")?;
        let config_filename = config.get_str("config_filename")?;
        let load_timeout = config.get_duration_secs("load_timeout_secs")?;

        let store = ArtifactStore::new(&base, weights_filename.clone())?;
        let ledger = MetadataLedger::new(base.join("metadata.json"));
        let validator = BundleValidator::new(weights_filename, config_filename);
        let lifecycle = Arc::new(LifecycleManager::new(
            store,
            ledger,
            validator,
            engine,
            load_timeout,
        ));

        info!(base = %base.display(), "TTS orchestrator initialized");
        Ok(Self {
            lifecycle,
            model_base_path: base,
        })
    }

    /// Recovers persisted lifecycle state; call once at startup
    pub async fn start(&self) -> Result<ServingState> {
        self.lifecycle.recover().await
    }

    /// Registers a candidate bundle under `name`
    pub async fn register(
        &self,
        name: &str,
        source: &BundleSource,
        replace: bool,
    ) -> Result<Artifact> {
        self.lifecycle.register(name, source, replace).await
    }

    /// Activates the candidate `name`
    pub async fn activate(&self, name: &str) -> Result<Artifact> {
        self.lifecycle.activate(name).await
    }

    /// Deactivates the current model; idempotent
    pub async fn deactivate(&self) -> Result<()> {
        self.lifecycle.deactivate().await
    }

    /// Deletes an inactive candidate
    pub async fn delete(&self, name: &str) -> Result<()> {
        self.lifecycle.delete(name).await
    }

    /// Lists the active artifact and all inactive candidates
    pub async fn list(&self) -> Result<ModelInventory> {
        self.lifecycle.list().await
    }

    /// Returns the current serving state
    pub fn state(&self) -> ServingState {
        self.lifecycle.state()
    }

    /// Returns the output sample rate of the live model, if one is serving
    pub fn output_sample_rate(&self) -> Option<u32> {
        self.lifecycle
            .current_engine()
            .map(|engine| engine.sample_rate())
    }

    /// Builds a status snapshot
    pub async fn status(&self) -> Result<ServiceStatus> {
        let inventory = self.lifecycle.list().await?;
        Ok(ServiceStatus {
            state: self.lifecycle.state(),
            active_model: inventory.active.as_ref().map(|a| a.name.clone()),
            inactive_models: inventory.inactive.len(),
            model_base_path: self.model_base_path.clone(),
        })
    }

    /// Synthesizes PCM samples from text using the live model
    ///
    /// Rejected with `NotReady` while no model is serving; the caller can
    /// distinguish this from request errors and report it as such. The
    /// synthesis itself runs on the blocking pool so request handling is not
    /// starved.
    pub async fn synthesize(&self, text: &str, params: &SynthesisParams) -> Result<Vec<f32>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::InvalidArgument(
                "synthesis text is empty".to_string(),
            ));
        }
        if text.chars().count() > MAX_TEXT_LENGTH {
            return Err(Error::InvalidArgument(format!(
                "synthesis text exceeds {} characters",
                MAX_TEXT_LENGTH
            )));
        }

        let engine = self.lifecycle.current_engine().ok_or_else(|| {
            let reason = self
                .lifecycle
                .state()
                .reason()
                .map(str::to_owned)
                .unwrap_or_else(|| "no model is active".to_string());
            Error::NotReady(reason)
        })?;

        let params = params.clamped();
        let text = text.to_string();
        tokio::task::spawn_blocking(move || engine.synthesize(&text, &params))
            .await
            .map_err(|e| Error::Internal(format!("blocking task failed: {}", e)))?
    }
}
