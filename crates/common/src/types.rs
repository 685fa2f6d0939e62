//! Common types for the TTS Orchestrator
//!
//! This module defines the synthesis parameter set and the limits applied to
//! incoming synthesis requests.

use serde::{Deserialize, Serialize};

/// Maximum accepted length of a synthesis request text, in characters
pub const MAX_TEXT_LENGTH: usize = 1000;

/// Sample rate assumed when a model config does not declare one
pub const DEFAULT_SAMPLE_RATE: u32 = 22_050;

/// Accepted range for `temperature`
pub const TEMPERATURE_RANGE: (f32, f32) = (0.1, 1.0);
/// Accepted range for `length_scale`
pub const LENGTH_SCALE_RANGE: (f32, f32) = (0.5, 2.0);
/// Accepted range for `noise_scale`
pub const NOISE_SCALE_RANGE: (f32, f32) = (0.0, 1.0);
/// Accepted range for `noise_scale_w`
pub const NOISE_SCALE_W_RANGE: (f32, f32) = (0.0, 1.0);

/// Parameters for a synthesis request
///
/// Out-of-range values are folded back into range by [`SynthesisParams::clamped`]
/// rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SynthesisParams {
    /// Sampling temperature
    pub temperature: f32,
    /// Phoneme duration scale; larger is slower speech
    pub length_scale: f32,
    /// Variance of the latent noise
    pub noise_scale: f32,
    /// Variance of the duration predictor noise
    pub noise_scale_w: f32,
}

impl Default for SynthesisParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            length_scale: 1.03,
            noise_scale: 0.78,
            noise_scale_w: 0.92,
        }
    }
}

impl SynthesisParams {
    /// Returns a copy with every field clamped to its accepted range
    pub fn clamped(self) -> Self {
        Self {
            temperature: self
                .temperature
                .clamp(TEMPERATURE_RANGE.0, TEMPERATURE_RANGE.1),
            length_scale: self
                .length_scale
                .clamp(LENGTH_SCALE_RANGE.0, LENGTH_SCALE_RANGE.1),
            noise_scale: self
                .noise_scale
                .clamp(NOISE_SCALE_RANGE.0, NOISE_SCALE_RANGE.1),
            noise_scale_w: self
                .noise_scale_w
                .clamp(NOISE_SCALE_W_RANGE.0, NOISE_SCALE_W_RANGE.1),
        }
    }
}
