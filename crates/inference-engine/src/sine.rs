//! Sine-wave synthesis backend
//!
//! A deterministic stand-in for a real model runtime: it enforces the same
//! bundle contract (readable weights, parseable JSON config), honors the
//! synthesis parameters, and emits a pure tone whose duration tracks the
//! input text. The demo binary and the lifecycle tests run against it.

use std::f32::consts::TAU;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use common::artifact::ModelPaths;
use common::error::{Error, Result};
use common::types::{SynthesisParams, DEFAULT_SAMPLE_RATE};

use crate::engine::{EngineInstance, SynthesisEngine};

/// Seconds of audio per input character, before length scaling
const SECONDS_PER_CHAR: f32 = 0.05;

/// Sine-wave synthesis backend
pub struct SineEngine {
    /// Artificial delay applied to every load
    load_delay: Duration,
}

impl SineEngine {
    /// Creates a backend that loads immediately
    pub fn new() -> Self {
        Self {
            load_delay: Duration::ZERO,
        }
    }

    /// Creates a backend whose loads take at least `delay`
    ///
    /// Used by tests that race synthesis calls against an activation.
    pub fn with_load_delay(delay: Duration) -> Self {
        Self { load_delay: delay }
    }
}

impl Default for SineEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SynthesisEngine for SineEngine {
    fn name(&self) -> &str {
        "sine"
    }

    async fn load(&self, paths: &ModelPaths) -> Result<Arc<dyn EngineInstance>> {
        let weights_meta = std::fs::metadata(&paths.weights).map_err(|e| {
            Error::LoadFailure(format!(
                "weights file unreadable: {}: {}",
                paths.weights.display(),
                e
            ))
        })?;
        if weights_meta.len() == 0 {
            return Err(Error::LoadFailure(format!(
                "weights file is empty: {}",
                paths.weights.display()
            )));
        }

        let raw = std::fs::read_to_string(&paths.config).map_err(|e| {
            Error::LoadFailure(format!(
                "config file unreadable: {}: {}",
                paths.config.display(),
                e
            ))
        })?;
        let config: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|e| Error::LoadFailure(format!("config file is not valid JSON: {}", e)))?;

        // Coqui-style configs nest the sample rate under "audio"
        let sample_rate = config
            .pointer("/audio/sample_rate")
            .or_else(|| config.get("sample_rate"))
            .and_then(|v| v.as_u64())
            .map(|v| v as u32)
            .unwrap_or(DEFAULT_SAMPLE_RATE);

        if !self.load_delay.is_zero() {
            tokio::time::sleep(self.load_delay).await;
        }

        info!(
            bundle = %paths.root.display(),
            sample_rate,
            "sine backend loaded model bundle"
        );
        Ok(Arc::new(SineVoice { sample_rate }))
    }
}

/// A loaded sine-wave voice
#[derive(Debug)]
pub struct SineVoice {
    sample_rate: u32,
}

impl EngineInstance for SineVoice {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn synthesize(&self, text: &str, params: &SynthesisParams) -> Result<Vec<f32>> {
        if text.is_empty() {
            return Err(Error::InvalidArgument(
                "synthesis text is empty".to_string(),
            ));
        }

        let seconds =
            (text.chars().count() as f32 * SECONDS_PER_CHAR * params.length_scale).clamp(0.05, 60.0);
        let total_samples = (seconds * self.sample_rate as f32) as usize;

        let frequency = 180.0 + 80.0 * params.noise_scale;
        let amplitude = 0.2 + 0.6 * params.temperature;

        let mut samples = Vec::with_capacity(total_samples);
        for i in 0..total_samples {
            let t = i as f32 / self.sample_rate as f32;
            samples.push(amplitude * (TAU * frequency * t).sin());
        }

        debug!(
            chars = text.chars().count(),
            samples = samples.len(),
            "synthesized tone"
        );
        Ok(samples)
    }
}
