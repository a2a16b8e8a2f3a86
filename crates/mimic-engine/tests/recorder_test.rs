use async_trait::async_trait;
use mimic_common::{
    Action, ActionEvent, Bounds, CaptureError, Environment, GuiElement, Modifiers, ProcessInfo,
    ResourceMetrics, SystemCall, SystemSubtype,
};
use mimic_engine::capture::{ActiveWindow, ElementMapScraper, EnvironmentProbe, GuiScraper};
use mimic_engine::config::RecorderConfig;
use mimic_engine::recorder::{
    InputSignal, KeyboardInput, MouseInput, Recorder, RecorderError, RecorderState, SystemInput,
};
use mimic_engine::store::{MemoryStore, RecordingStore};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Default)]
struct FakeEnvironment {
    processes: Mutex<Vec<ProcessInfo>>,
    window: Mutex<Option<ActiveWindow>>,
    window_delay: Duration,
}

impl FakeEnvironment {
    fn set_processes(&self, processes: Vec<ProcessInfo>) {
        *self.processes.lock().unwrap() = processes;
    }
}

#[async_trait]
impl EnvironmentProbe for FakeEnvironment {
    async fn environment(&self) -> Result<Environment, CaptureError> {
        Ok(Environment {
            platform: "linux".into(),
            ..Default::default()
        })
    }

    async fn active_window(&self) -> Result<Option<ActiveWindow>, CaptureError> {
        if !self.window_delay.is_zero() {
            tokio::time::sleep(self.window_delay).await;
        }
        Ok(self.window.lock().unwrap().clone())
    }

    async fn processes(&self) -> Result<Vec<ProcessInfo>, CaptureError> {
        Ok(self.processes.lock().unwrap().clone())
    }

    async fn resources(&self) -> Result<ResourceMetrics, CaptureError> {
        Err(CaptureError::Unavailable("no metrics in tests".into()))
    }
}

/// Scraper whose captures take `delay` and whose disposals are counted.
struct SlowScraper {
    inner: ElementMapScraper,
    delay: Duration,
    disposals: Arc<AtomicUsize>,
}

impl SlowScraper {
    fn new(delay: Duration, disposals: Arc<AtomicUsize>) -> Self {
        Self {
            inner: ElementMapScraper::new(vec![save_button()]),
            delay,
            disposals,
        }
    }
}

#[async_trait]
impl GuiScraper for SlowScraper {
    async fn capture_screen(&mut self) -> Result<(), CaptureError> {
        tokio::time::sleep(self.delay).await;
        self.inner.capture_screen().await
    }

    fn elements(&self) -> Vec<GuiElement> {
        self.inner.elements()
    }

    fn find_element_at(&self, x: f64, y: f64) -> Option<GuiElement> {
        self.inner.find_element_at(x, y)
    }

    async fn dispose(&mut self) {
        self.disposals.fetch_add(1, Ordering::SeqCst);
        self.inner.dispose().await;
    }
}

fn save_button() -> GuiElement {
    GuiElement {
        element_type: "button".into(),
        text: Some("Save".into()),
        confidence: Some(0.9),
        bounds: Bounds {
            x: 100.0,
            y: 100.0,
            width: 80.0,
            height: 30.0,
        },
        attributes: BTreeMap::from([("id".to_string(), "save-btn".to_string())]),
    }
}

fn process(pid: u32, name: &str) -> ProcessInfo {
    ProcessInfo {
        pid,
        name: name.into(),
        ..Default::default()
    }
}

fn recorder(env: Arc<FakeEnvironment>) -> Recorder {
    Recorder::new(
        RecorderConfig::default(),
        env,
        Box::new(ElementMapScraper::new(vec![save_button()])),
    )
}

#[tokio::test(start_paused = true)]
async fn records_in_arrival_order_with_elapsed_timestamps() {
    let env = Arc::new(FakeEnvironment::default());
    *env.window.lock().unwrap() = Some(ActiveWindow {
        title: "Editor".into(),
        application: "editor".into(),
    });
    let mut recorder = recorder(env);

    recorder.start().await.unwrap();
    assert!(recorder.is_recording().await);
    assert_eq!(recorder.probe_count(), 3);

    let click = recorder
        .record(InputSignal::Mouse(MouseInput::click(120.0, 110.0)))
        .await
        .unwrap();
    assert!(click.is_some());

    tokio::time::advance(Duration::from_millis(250)).await;
    recorder
        .record(InputSignal::Keyboard(KeyboardInput::text("hello")))
        .await
        .unwrap();

    let actions = recorder.stop().await;
    assert_eq!(recorder.state().await, RecorderState::Idle);
    assert_eq!(recorder.probe_count(), 0);
    assert_eq!(actions.len(), 2);
    assert_eq!(actions[0].timestamp(), 0);
    assert_eq!(actions[1].timestamp(), 250);
    assert_eq!(actions[0].context.window_title.as_deref(), Some("Editor"));
    assert_eq!(actions[0].context.gui_state.elements.len(), 1);

    match &actions[0].event {
        ActionEvent::Mouse(mouse) => {
            let target = mouse.target.as_ref().expect("click should resolve a target");
            assert_eq!(target.element, "save-btn");
            assert_eq!(target.label(), "Save");
        }
        other => panic!("expected a mouse event, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn mouse_moves_are_ignored_by_default() {
    let mut recorder = recorder(Arc::new(FakeEnvironment::default()));
    recorder.start().await.unwrap();
    let id = recorder
        .record(InputSignal::Mouse(MouseInput::moved(5.0, 5.0)))
        .await
        .unwrap();
    assert!(id.is_none());
    assert!(recorder.stop().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn idle_recorder_drops_signals() {
    let recorder = recorder(Arc::new(FakeEnvironment::default()));
    let id = recorder
        .record(InputSignal::Keyboard(KeyboardInput::text("x")))
        .await
        .unwrap();
    assert!(id.is_none());
    assert!(recorder.snapshot().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn restart_clears_buffer_and_resets_clock() {
    let mut recorder = recorder(Arc::new(FakeEnvironment::default()));
    recorder.start().await.unwrap();
    tokio::time::advance(Duration::from_millis(400)).await;
    recorder
        .record(InputSignal::Keyboard(KeyboardInput::key_down(
            "s",
            Modifiers {
                ctrl: true,
                ..Default::default()
            },
        )))
        .await
        .unwrap();
    assert_eq!(recorder.snapshot().await.len(), 1);

    recorder.start().await.unwrap();
    assert!(recorder.snapshot().await.is_empty());
    recorder
        .record(InputSignal::Keyboard(KeyboardInput::text("a")))
        .await
        .unwrap();
    let actions = recorder.stop().await;
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].timestamp(), 0);
}

#[tokio::test(start_paused = true)]
async fn process_watch_reports_new_processes() {
    let env = Arc::new(FakeEnvironment::default());
    env.set_processes(vec![process(1, "init")]);
    let mut recorder = recorder(env.clone());
    recorder.start().await.unwrap();

    // Let the background pollers take their baseline.
    tokio::time::sleep(Duration::from_millis(10)).await;
    env.set_processes(vec![process(1, "init"), process(42, "editor")]);
    tokio::time::sleep(Duration::from_millis(2100)).await;

    let actions = recorder.stop().await;
    let started: Vec<_> = actions
        .iter()
        .filter_map(|a| match &a.event {
            ActionEvent::System(sys) if sys.subtype == SystemSubtype::ProcessStart => {
                sys.process.as_ref().map(|p| p.pid)
            }
            _ => None,
        })
        .collect();
    assert_eq!(started, vec![42]);
}

#[tokio::test(start_paused = true)]
async fn system_calls_are_stamped_with_the_action_time() {
    let mut recorder = recorder(Arc::new(FakeEnvironment::default()));
    recorder.start().await.unwrap();
    tokio::time::advance(Duration::from_millis(75)).await;
    recorder
        .record(InputSignal::System(SystemInput::call(SystemCall {
            call_type: "file".into(),
            module: "fs".into(),
            function: "write".into(),
            parameters: None,
            result: None,
            error: None,
            timestamp: 0,
        })))
        .await
        .unwrap();
    let actions = recorder.stop().await;
    match &actions[0].event {
        ActionEvent::System(sys) => {
            assert_eq!(sys.timestamp, 75);
            assert_eq!(sys.system_call.as_ref().map(|c| c.timestamp), Some(75));
        }
        other => panic!("expected a system event, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn save_persists_buffer_with_environment() {
    let store = MemoryStore::new();
    let mut recorder = recorder(Arc::new(FakeEnvironment::default()));
    recorder.start().await.unwrap();
    recorder
        .record(InputSignal::Mouse(MouseInput::click(1.0, 1.0)))
        .await
        .unwrap();

    let id = recorder
        .save(&store, "session", "a test", &["demo".to_string()])
        .await
        .unwrap();
    let saved = store.get(&id).await.unwrap();
    assert_eq!(saved.name, "session");
    assert_eq!(saved.actions.len(), 1);
    assert_eq!(saved.environment.platform, "linux");
    assert!(saved.has_tag("demo"));
}

#[tokio::test(start_paused = true)]
async fn disposed_recorder_refuses_to_start() {
    let mut recorder = recorder(Arc::new(FakeEnvironment::default()));
    recorder.start().await.unwrap();
    recorder.dispose().await;
    recorder.dispose().await;

    assert_eq!(recorder.state().await, RecorderState::Disposed);
    assert_eq!(recorder.probe_count(), 0);
    assert!(matches!(recorder.start().await, Err(RecorderError::Disposed)));
    assert!(matches!(
        recorder
            .record(InputSignal::Keyboard(KeyboardInput::text("x")))
            .await,
        Err(RecorderError::Disposed)
    ));
}

fn typed(action: &Action) -> &str {
    match &action.event {
        ActionEvent::Keyboard(key) => &key.key,
        _ => "",
    }
}

#[tokio::test(start_paused = true)]
async fn slow_context_keeps_arrival_order_and_time() {
    let env = Arc::new(FakeEnvironment {
        window_delay: Duration::from_millis(300),
        ..Default::default()
    });
    let mut recorder = recorder(env);
    recorder.start().await.unwrap();

    let first = recorder.record(InputSignal::Keyboard(KeyboardInput::text("FIRST")));
    let second = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        recorder
            .record(InputSignal::Keyboard(KeyboardInput::text("SECOND")))
            .await
    };
    let (first, second) = tokio::join!(first, second);
    assert!(first.unwrap().is_some());
    assert!(second.unwrap().is_some());

    let actions = recorder.stop().await;
    assert_eq!(actions.len(), 2);
    assert_eq!(typed(&actions[0]), "FIRST");
    assert_eq!(actions[0].timestamp(), 0);
    assert_eq!(typed(&actions[1]), "SECOND");
    assert_eq!(actions[1].timestamp(), 10);
}

#[tokio::test(start_paused = true)]
async fn busy_scraper_does_not_delay_stamping() {
    let disposals = Arc::new(AtomicUsize::new(0));
    let mut recorder = Recorder::new(
        RecorderConfig::default(),
        Arc::new(FakeEnvironment::default()),
        Box::new(SlowScraper::new(Duration::from_millis(800), disposals)),
    );
    let started = Instant::now();
    recorder.start().await.unwrap();
    // The periodic GUI refresh now holds the scraper.
    tokio::time::sleep(Duration::from_millis(1)).await;
    let arrival = Instant::now();
    let elapsed = (arrival - started).as_millis() as u64;

    let key = recorder.record(InputSignal::Keyboard(KeyboardInput::text("typed")));
    let click = async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        recorder
            .record(InputSignal::Mouse(MouseInput::click(120.0, 110.0)))
            .await
    };
    let (key, click) = tokio::join!(key, click);
    assert!(key.unwrap().is_some());
    assert!(click.unwrap().is_some());

    let actions = recorder.stop().await;
    assert_eq!(actions.len(), 2);
    assert_eq!(typed(&actions[0]), "typed");
    assert_eq!(actions[0].timestamp(), elapsed);
    assert_eq!(actions[0].context.gui_state.elements.len(), 1);
    assert_eq!(actions[1].timestamp(), elapsed + 5);
    match &actions[1].event {
        ActionEvent::Mouse(mouse) => {
            assert_eq!(mouse.target.as_ref().map(|t| t.element.as_str()), Some("save-btn"));
        }
        other => panic!("expected a mouse event, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn dispose_releases_the_scraper_once() {
    let disposals = Arc::new(AtomicUsize::new(0));
    let mut recorder = Recorder::new(
        RecorderConfig::default(),
        Arc::new(FakeEnvironment::default()),
        Box::new(SlowScraper::new(Duration::ZERO, disposals.clone())),
    );
    recorder.start().await.unwrap();
    assert_eq!(disposals.load(Ordering::SeqCst), 0);

    recorder.dispose().await;
    recorder.dispose().await;

    assert_eq!(disposals.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.state().await, RecorderState::Disposed);
}
