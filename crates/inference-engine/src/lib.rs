//! Synthesis engine interface for the TTS Orchestrator
//!
//! This crate defines the seam between the lifecycle manager and the actual
//! inference backend: an engine loads a model bundle into a ready-to-serve
//! instance, and the instance turns text into PCM samples. The built-in sine
//! backend is a trivial but fully functional implementation used by the demo
//! binary and the test suites; a real model runtime plugs in by implementing
//! [`SynthesisEngine`].

pub mod engine;
pub mod sine;

// Re-export commonly used types
pub use engine::{EngineInstance, SynthesisEngine};
pub use sine::SineEngine;
