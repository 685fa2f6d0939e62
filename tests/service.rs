//! Smoke tests for the service facade

use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use artifact_store::BundleSource;
use common::error::Error;
use common::types::SynthesisParams;
use config::ConfigManager;
use inference_engine::SineEngine;
use tts_orchestrator::TtsOrchestrator;

const WEIGHTS: &str = "best_model.pth";
const CONFIG: &str = "config.json";

fn service_in(base: &TempDir) -> TtsOrchestrator {
    let mut config = ConfigManager::new().unwrap();
    config.set(
        "model_base_path",
        json!(base.path().join("models").display().to_string()),
    );
    TtsOrchestrator::new(&config, Arc::new(SineEngine::new())).unwrap()
}

fn upload_bundle(base: &TempDir, tag: &str) -> BundleSource {
    let dir = base.path().join("uploads").join(tag);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(WEIGHTS), format!("weights-{}", tag)).unwrap();
    std::fs::write(dir.join(CONFIG), r#"{"audio": {"sample_rate": 16000}}"#).unwrap();
    BundleSource::Directory(dir)
}

#[tokio::test]
async fn test_synthesis_is_rejected_until_a_model_serves() {
    let base = TempDir::new().unwrap();
    let service = service_in(&base);

    let state = service.start().await.unwrap();
    assert!(state.is_no_model());

    let err = service
        .synthesize("moin moin", &SynthesisParams::default())
        .await
        .unwrap_err();
    assert!(err.is_not_ready());
}

#[tokio::test]
async fn test_register_activate_synthesize_round_trip() {
    let base = TempDir::new().unwrap();
    let service = service_in(&base);
    service.start().await.unwrap();

    service
        .register("voiceA", &upload_bundle(&base, "a"), false)
        .await
        .unwrap();
    service.activate("voiceA").await.unwrap();

    let samples = service
        .synthesize("moin moin", &SynthesisParams::default())
        .await
        .unwrap();
    assert!(!samples.is_empty());
    assert_eq!(service.output_sample_rate(), Some(16000));

    let status = service.status().await.unwrap();
    assert_eq!(status.active_model.as_deref(), Some("voiceA"));
    assert_eq!(status.inactive_models, 0);
    assert!(status.state.is_serving());
}

#[tokio::test]
async fn test_synthesize_validates_text() {
    let base = TempDir::new().unwrap();
    let service = service_in(&base);
    service.start().await.unwrap();

    service
        .register("voiceA", &upload_bundle(&base, "a"), false)
        .await
        .unwrap();
    service.activate("voiceA").await.unwrap();

    let empty = service
        .synthesize("   ", &SynthesisParams::default())
        .await
        .unwrap_err();
    assert!(matches!(empty, Error::InvalidArgument(_)));

    let too_long = "x".repeat(2000);
    let err = service
        .synthesize(&too_long, &SynthesisParams::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[tokio::test]
async fn test_out_of_range_params_are_clamped_not_rejected() {
    let base = TempDir::new().unwrap();
    let service = service_in(&base);
    service.start().await.unwrap();

    service
        .register("voiceA", &upload_bundle(&base, "a"), false)
        .await
        .unwrap();
    service.activate("voiceA").await.unwrap();

    let params = SynthesisParams {
        temperature: 99.0,
        length_scale: -3.0,
        noise_scale: 7.0,
        noise_scale_w: -1.0,
    };
    let samples = service.synthesize("moin", &params).await.unwrap();
    assert!(!samples.is_empty());
    assert!(samples.iter().all(|s| s.abs() <= 1.0));
}
