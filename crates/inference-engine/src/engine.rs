//! Engine traits
//!
//! A [`SynthesisEngine`] is the long-lived backend; loading a model bundle
//! produces an [`EngineInstance`], the unit the lifecycle manager publishes
//! to inference callers. Instances are immutable once loaded and shared
//! behind an `Arc`, so concurrent synthesis calls never observe a
//! half-constructed model.

use std::sync::Arc;

use async_trait::async_trait;

use common::artifact::ModelPaths;
use common::error::Result;
use common::types::SynthesisParams;

/// A loaded, ready-to-serve model
pub trait EngineInstance: Send + Sync + std::fmt::Debug {
    /// Output sample rate in Hz
    fn sample_rate(&self) -> u32;

    /// Synthesizes PCM samples in the range [-1.0, 1.0] from text
    ///
    /// Blocking, CPU-bound work; callers run it off the async path.
    fn synthesize(&self, text: &str, params: &SynthesisParams) -> Result<Vec<f32>>;
}

/// A synthesis backend capable of loading model bundles
#[async_trait]
pub trait SynthesisEngine: Send + Sync {
    /// Backend name, for logs
    fn name(&self) -> &str;

    /// Loads the bundle at the given paths into a serving instance
    ///
    /// A rejection of the artifact for any reason is a
    /// [`common::error::Error::LoadFailure`].
    async fn load(&self, paths: &ModelPaths) -> Result<Arc<dyn EngineInstance>>;
}
