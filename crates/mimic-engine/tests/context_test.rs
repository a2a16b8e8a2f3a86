use mimic_common::{Action, ActionEvent, Coordinates, MouseEvent, MouseSubtype, NewRecording};
use mimic_engine::MimicContext;
use mimic_engine::capture::{ElementMapScraper, StaticEnvironment};
use mimic_engine::config::{ConfigLoader, MimicConfig};
use mimic_engine::learner::ContextHints;
use mimic_engine::recorder::RecorderState;
use mimic_engine::store::{MemoryStore, RecordingStore};
use std::sync::Arc;

#[test]
fn partial_config_keeps_defaults() {
    let config = ConfigLoader::parse(
        r#"
recorder:
  capture_mouse_moves: true
extraction:
  per_action_cost_ms: 250
variation:
  merge_spacing_ms: 40
"#,
    )
    .unwrap();

    assert!(config.recorder.capture_mouse_moves);
    assert_eq!(config.recorder.process_probe_interval_ms, 2000);
    assert_eq!(config.extraction.per_action_cost_ms, 250);
    assert_eq!(config.extraction.min_efficiency, 0.7);
    assert_eq!(config.synthesis.default_platform, "linux");
    assert_eq!(config.variation.merge_spacing_ms, 40);
    assert_eq!(config.variation.coordinate_jitter, 5.0);
}

#[test]
fn malformed_config_is_an_error() {
    assert!(ConfigLoader::parse("recorder: [1, 2").is_err());
}

#[tokio::test]
async fn load_from_reads_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mimic.yaml");
    std::fs::write(&path, "synthesis:\n  default_platform: windows\n").unwrap();
    let config = ConfigLoader::load_from(&path).await.unwrap();
    assert_eq!(config.synthesis.default_environment().platform, "windows");
}

fn clicks(n: usize) -> Vec<Action> {
    (0..n)
        .map(|i| {
            Action::new(
                format!("c{}", i),
                ActionEvent::Mouse(MouseEvent {
                    subtype: MouseSubtype::Click,
                    coordinates: Coordinates::at(i as f64, 0.0),
                    target: None,
                    button: None,
                    pressure: None,
                    timestamp: i as u64 * 100,
                }),
            )
        })
        .collect()
}

#[tokio::test]
async fn context_lifecycle() {
    let store = Arc::new(MemoryStore::new());
    store.save(NewRecording::new("clicks", clicks(4))).await.unwrap();

    let mut config = MimicConfig::default();
    config.extraction.per_action_cost_ms = 100;
    let env = Arc::new(StaticEnvironment::default());
    let mut context = MimicContext::new(
        config,
        store.clone(),
        env,
        Box::new(ElementMapScraper::default()),
    );

    assert!(!context.is_started());
    assert_eq!(context.start().await, 1);
    assert_eq!(context.start().await, 1);
    assert!(context.is_started());

    let task = context.generate_future_task(&ContextHints::default(), 1.0);
    assert_eq!(task.actions.len(), 4);

    let instructions = context.translator.translate_to_instructions(&task.actions);
    assert_eq!(instructions.len(), 4);

    context.shutdown().await;
    assert!(!context.is_started());
    assert_eq!(context.recorder.state().await, RecorderState::Disposed);
}
