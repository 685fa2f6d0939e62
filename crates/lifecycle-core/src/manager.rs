//! Lifecycle manager implementation
//!
//! Orchestrates validate, register, activate, deactivate, and delete against
//! the artifact store and the metadata ledger. Two invariants are protected
//! here: at most one artifact is ever active, and a failed operation cannot
//! leave the system without a usable model if one was serving before.
//!
//! Administrative operations serialize on a single async mutex. The live
//! engine instance is published through one write-lock assignment, so
//! concurrent synthesis callers always observe either the previous instance
//! or the new one, never a partial state. A long-running load never stalls
//! synthesis against the previous model: the live slot is only touched after
//! the load has succeeded.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use artifact_store::{ArtifactStore, BundleSource, BundleValidator, MetadataLedger};
use common::artifact::{Artifact, ModelInventory, ModelPaths};
use common::error::{Error, Result};
use common::utils::validate_model_name;
use inference_engine::{EngineInstance, SynthesisEngine};

use crate::state::ServingState;

/// The engine instance currently visible to inference callers
#[derive(Clone)]
pub struct LiveEngine {
    /// Name of the model the instance was loaded from
    pub name: String,
    /// The loaded instance
    pub instance: Arc<dyn EngineInstance>,
    /// When the instance went live
    pub activated_at: DateTime<Utc>,
}

/// Orchestrates the model artifact lifecycle
pub struct LifecycleManager {
    /// Artifact storage
    store: ArtifactStore,

    /// Persisted lifecycle state
    ledger: MetadataLedger,

    /// Bundle structure validator
    validator: BundleValidator,

    /// Synthesis backend
    engine: Arc<dyn SynthesisEngine>,

    /// Live engine slot, shared-read by synthesis callers
    live: RwLock<Option<LiveEngine>>,

    /// Published serving state
    state: RwLock<ServingState>,

    /// Serializes administrative operations
    admin: tokio::sync::Mutex<()>,

    /// Time limit for a single engine load
    load_timeout: Duration,
}

impl LifecycleManager {
    /// Creates a lifecycle manager over the given collaborators
    pub fn new(
        store: ArtifactStore,
        ledger: MetadataLedger,
        validator: BundleValidator,
        engine: Arc<dyn SynthesisEngine>,
        load_timeout: Duration,
    ) -> Self {
        Self {
            store,
            ledger,
            validator,
            engine,
            live: RwLock::new(None),
            state: RwLock::new(ServingState::new()),
            admin: tokio::sync::Mutex::new(()),
            load_timeout,
        }
    }

    /// Returns the published serving state
    pub fn state(&self) -> ServingState {
        self.state.read().clone()
    }

    /// Returns the engine instance for synthesis, if one is live
    pub fn current_engine(&self) -> Option<Arc<dyn EngineInstance>> {
        self.live.read().as_ref().map(|live| live.instance.clone())
    }

    /// Returns the live engine and its model name, if any
    pub fn live_engine(&self) -> Option<LiveEngine> {
        self.live.read().clone()
    }

    /// Returns the name of the live model, if any
    pub fn live_model(&self) -> Option<String> {
        self.live.read().as_ref().map(|live| live.name.clone())
    }

    /// Restores lifecycle state from the ledger at process start
    ///
    /// If the ledger names an active model that is present and loads, the
    /// system starts serving it. Any disagreement between ledger and
    /// filesystem, and any load failure, downgrades to `NoModel` with a
    /// recorded reason and re-aligns ledger and filesystem.
    pub async fn recover(&self) -> Result<ServingState> {
        let _guard = self.admin.lock().await;

        let mut record = self.ledger.load();
        let Some(name) = record.active_model.clone() else {
            info!("no active model recorded, starting without a model");
            self.set_state(ServingState::NoModel { reason: None });
            return Ok(self.state());
        };

        match self.load_recorded_active(&name).await {
            Ok(instance) => {
                *self.live.write() = Some(LiveEngine {
                    name: name.clone(),
                    instance,
                    activated_at: record.last_activated.unwrap_or_else(Utc::now),
                });
                self.set_state(ServingState::Serving { name: name.clone() });
                info!(name = %name, "recovered active model");
            }
            Err(e) => {
                warn!(name = %name, error = %e, "recorded active model unusable, starting without a model");
                let _ = self.store.clear_active().await;
                *self.live.write() = None;
                record.active_model = None;
                self.ledger.save(&mut record)?;
                self.set_state(ServingState::NoModel {
                    reason: Some(e.to_string()),
                });
            }
        }

        Ok(self.state())
    }

    /// Registers a candidate bundle under `name`
    ///
    /// The bundle is copied into the inactive area, structurally validated
    /// (flattening one nesting level if needed), digested, and recorded in
    /// the ledger roster. The serving state is unchanged.
    pub async fn register(
        &self,
        name: &str,
        source: &BundleSource,
        replace: bool,
    ) -> Result<Artifact> {
        let _guard = self.admin.lock().await;

        validate_model_name(name)?;
        if !replace && self.live_model().as_deref() == Some(name) {
            return Err(Error::DuplicateName(name.to_string()));
        }

        self.store.put_inactive(name, source, replace).await?;

        // The copy is not a registered artifact until it validates
        let validator = self.validator.clone();
        let bundle_root = self.store.inactive_path(name);
        let validated =
            tokio::task::spawn_blocking(move || validator.validate(&bundle_root)).await;
        let validated =
            validated.map_err(|e| Error::Internal(format!("blocking task failed: {}", e)))?;
        if let Err(e) = validated {
            let _ = self.store.discard_inactive(name).await;
            return Err(e);
        }

        let artifact = self.store.finalize_inactive(name).await?;

        let mut record = self.ledger.load();
        record.known_models.insert(name.to_string());
        self.ledger.save(&mut record)?;

        Ok(artifact)
    }

    /// Activates the candidate `name`
    ///
    /// The candidate is staged into the active area, verified, and loaded by
    /// the engine; only then is the previous active artifact retired, the
    /// staged copy renamed into the active slot, the new instance published,
    /// and the ledger updated. On failure the previous model keeps serving.
    pub async fn activate(&self, name: &str) -> Result<Artifact> {
        let _guard = self.admin.lock().await;

        if !self.store.has_inactive(name) {
            return Err(Error::NotFound(name.to_string()));
        }

        let prev_state = self.state();
        self.set_state(ServingState::Loading {
            name: name.to_string(),
        });

        match self.stage_load_commit(name).await {
            Ok(artifact) => {
                self.set_state(ServingState::Serving {
                    name: name.to_string(),
                });

                // Ledger last: filesystem and engine handle already agree
                let mut record = self.ledger.load();
                record.active_model = Some(name.to_string());
                record.known_models.insert(name.to_string());
                record.last_activated = Some(Utc::now());
                self.ledger.save(&mut record)?;

                info!(name = %name, "model activated");
                Ok(artifact)
            }
            Err(e) => {
                let _ = self.store.abort_stage(name).await;
                if prev_state.is_serving() {
                    // Previous artifact and engine instance were never
                    // touched; only the published state needs restoring.
                    self.set_state(prev_state);
                } else {
                    self.set_state(ServingState::LoadFailed {
                        reason: e.to_string(),
                    });
                }
                warn!(name = %name, error = %e, "activation failed, previous state preserved");
                Err(e)
            }
        }
    }

    /// Deactivates the current model; idempotent
    pub async fn deactivate(&self) -> Result<()> {
        let _guard = self.admin.lock().await;

        let was = self.live.write().take();
        self.store.clear_active().await?;

        let mut record = self.ledger.load();
        record.active_model = None;
        self.ledger.save(&mut record)?;

        self.set_state(ServingState::NoModel { reason: None });
        if let Some(live) = was {
            info!(name = %live.name, "model deactivated");
        }
        Ok(())
    }

    /// Deletes an inactive candidate
    ///
    /// Deleting the currently active model is rejected; deactivate first.
    pub async fn delete(&self, name: &str) -> Result<()> {
        let _guard = self.admin.lock().await;

        let mut record = self.ledger.load();
        if record.active_model.as_deref() == Some(name)
            || self.live_model().as_deref() == Some(name)
        {
            return Err(Error::CannotDeleteActive(name.to_string()));
        }

        self.store.delete_inactive(name).await?;

        record.known_models.remove(name);
        self.ledger.save(&mut record)?;
        Ok(())
    }

    /// Lists the active artifact and all inactive candidates
    pub async fn list(&self) -> Result<ModelInventory> {
        let active = self.store.get_active().await?;
        let mut inactive = self.store.list_inactive();
        if let Some(active) = &active {
            // The active model's candidate copy is not listed as inactive
            inactive.retain(|artifact| artifact.name != active.name);
        }
        Ok(ModelInventory { active, inactive })
    }

    /// Stages, validates, loads, commits, and publishes one candidate
    async fn stage_load_commit(&self, name: &str) -> Result<Artifact> {
        let staged = self.store.stage_active(name).await?;

        let validator = self.validator.clone();
        let staged_root = staged.clone();
        let paths = tokio::task::spawn_blocking(move || validator.validate(&staged_root))
            .await
            .map_err(|e| Error::Internal(format!("blocking task failed: {}", e)))??;

        let instance = self.load_with_timeout(&paths).await?;

        let artifact = self.store.commit_active(name).await?;

        // Single atomic publish of the new instance
        *self.live.write() = Some(LiveEngine {
            name: name.to_string(),
            instance,
            activated_at: Utc::now(),
        });

        Ok(artifact)
    }

    /// Runs an engine load under the configured time limit
    ///
    /// A timeout is treated as a load failure, as is any engine error.
    async fn load_with_timeout(&self, paths: &ModelPaths) -> Result<Arc<dyn EngineInstance>> {
        debug!(
            backend = self.engine.name(),
            bundle = %paths.root.display(),
            "loading model bundle"
        );
        match tokio::time::timeout(self.load_timeout, self.engine.load(paths)).await {
            Ok(Ok(instance)) => Ok(instance),
            Ok(Err(e @ Error::LoadFailure(_))) => Err(e),
            Ok(Err(other)) => Err(Error::LoadFailure(other.to_string())),
            Err(_) => Err(Error::LoadFailure(format!(
                "engine load timed out after {}s",
                self.load_timeout.as_secs()
            ))),
        }
    }

    /// Validates and loads the artifact the ledger says is active
    async fn load_recorded_active(&self, name: &str) -> Result<Arc<dyn EngineInstance>> {
        let active = self.store.get_active().await?;
        let artifact = active.ok_or_else(|| {
            Error::NotFound(format!("active slot is empty but ledger names {}", name))
        })?;
        if artifact.name != name {
            return Err(Error::Internal(format!(
                "active slot holds {} but ledger names {}",
                artifact.name, name
            )));
        }

        let validator = self.validator.clone();
        let root = artifact.path.clone();
        let paths = tokio::task::spawn_blocking(move || validator.validate(&root))
            .await
            .map_err(|e| Error::Internal(format!("blocking task failed: {}", e)))??;

        self.load_with_timeout(&paths).await
    }

    fn set_state(&self, next: ServingState) {
        let mut state = self.state.write();
        if *state != next {
            let prev = state.clone();
            debug!(from = %prev, to = %next, "serving state transition");
            *state = next;
        }
    }
}
