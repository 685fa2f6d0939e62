use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use serde_json::json;
use tracing::info;

use config::ConfigManager;
use inference_engine::SineEngine;
use tts_orchestrator::TtsOrchestrator;

/// TTS inference service with runtime-swappable model artifacts
#[derive(Debug, Parser)]
#[command(name = "tts-orchestrator", version, about)]
struct Cli {
    /// Path to a JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base directory of the model artifact tree (overrides configuration)
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Default log filter when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level)?;

    let mut config = match &cli.config {
        Some(path) => ConfigManager::from_file(path)?,
        None => ConfigManager::new()?,
    };
    if let Some(dir) = &cli.models_dir {
        config.set("model_base_path", json!(dir.display().to_string()));
    }

    // The sine backend stands in for a real model runtime; swap in any
    // implementation of inference_engine::SynthesisEngine here.
    let orchestrator = TtsOrchestrator::new(&config, Arc::new(SineEngine::new()))?;

    let state = orchestrator.start().await?;
    info!(state = %state, "TTS orchestrator ready");

    let status = orchestrator.status().await?;
    info!(
        active = status.active_model.as_deref().unwrap_or("none"),
        candidates = status.inactive_models,
        base = %status.model_base_path.display(),
        "model inventory"
    );

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    Ok(())
}
