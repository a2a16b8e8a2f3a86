//! Periodic background probes feeding the recorder buffer.

use super::context::GuiHandle;
use super::session::SessionSink;
use super::signal::{InputSignal, SystemInput};
use crate::config::RecorderConfig;
use mimic_common::{ProcessInfo, ServiceInfo, SystemSubtype};
use std::collections::HashMap;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Owns the probe tasks. Dropping the set aborts every task, so probes never
/// outlive the recorder on any exit path.
pub(crate) struct ProbeSet {
    handles: Vec<JoinHandle<()>>,
}

impl ProbeSet {
    pub fn spawn(config: &RecorderConfig, sink: SessionSink, gui: Option<GuiHandle>) -> Self {
        let mut handles = vec![
            tokio::spawn(process_probe(
                sink.clone(),
                config.process_probe_interval_ms,
            )),
            tokio::spawn(service_probe(sink, config.service_probe_interval_ms)),
        ];
        if let Some(gui) = gui {
            handles.push(tokio::spawn(gui_probe(gui, config.gui_probe_interval_ms)));
        }
        tracing::debug!("Started {} background probes", handles.len());
        Self { handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }
}

impl Drop for ProbeSet {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

fn ticker(interval_ms: u64) -> tokio::time::Interval {
    let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Emits `process_start` / `process_end` for processes that appear or vanish
/// between polls. The first poll only sets the baseline.
async fn process_probe(sink: SessionSink, interval_ms: u64) {
    let mut ticker = ticker(interval_ms);
    let mut known: Option<HashMap<u32, ProcessInfo>> = None;

    loop {
        ticker.tick().await;
        let current = match sink.context.env().processes().await {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!("Process probe unavailable: {}", e);
                continue;
            }
        };
        let current: HashMap<u32, ProcessInfo> =
            current.into_iter().map(|p| (p.pid, p)).collect();

        if let Some(previous) = &known {
            let (started, ended) = diff_processes(previous, &current);
            for process in started {
                let signal = SystemInput {
                    process: Some(process),
                    ..SystemInput::new(SystemSubtype::ProcessStart)
                };
                sink.capture(InputSignal::System(signal).into_event()).await;
            }
            for process in ended {
                let signal = SystemInput {
                    process: Some(process),
                    ..SystemInput::new(SystemSubtype::ProcessEnd)
                };
                sink.capture(InputSignal::System(signal).into_event()).await;
            }
        }
        known = Some(current);
    }
}

/// Emits `service_change` for new services and status transitions.
async fn service_probe(sink: SessionSink, interval_ms: u64) {
    let mut ticker = ticker(interval_ms);
    let mut known: Option<HashMap<String, String>> = None;

    loop {
        ticker.tick().await;
        let services = match sink.context.env().services().await {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!("Service probe unavailable: {}", e);
                continue;
            }
        };

        if let Some(previous) = &known {
            for service in changed_services(previous, &services) {
                let signal = SystemInput {
                    service: Some(service),
                    ..SystemInput::new(SystemSubtype::ServiceChange)
                };
                sink.capture(InputSignal::System(signal).into_event()).await;
            }
        }
        known = Some(
            services
                .into_iter()
                .map(|s| (s.name, s.status))
                .collect(),
        );
    }
}

/// Keeps the published element map fresh.
async fn gui_probe(gui: GuiHandle, interval_ms: u64) {
    let mut ticker = ticker(interval_ms);
    loop {
        ticker.tick().await;
        if let Err(e) = gui.refresh().await {
            tracing::warn!("GUI capture unavailable: {}", e);
        }
    }
}

fn diff_processes(
    previous: &HashMap<u32, ProcessInfo>,
    current: &HashMap<u32, ProcessInfo>,
) -> (Vec<ProcessInfo>, Vec<ProcessInfo>) {
    let mut started: Vec<ProcessInfo> = current
        .iter()
        .filter(|(pid, _)| !previous.contains_key(pid))
        .map(|(_, p)| p.clone())
        .collect();
    let mut ended: Vec<ProcessInfo> = previous
        .iter()
        .filter(|(pid, _)| !current.contains_key(pid))
        .map(|(_, p)| p.clone())
        .collect();
    started.sort_by_key(|p| p.pid);
    ended.sort_by_key(|p| p.pid);
    (started, ended)
}

fn changed_services(
    previous: &HashMap<String, String>,
    current: &[ServiceInfo],
) -> Vec<ServiceInfo> {
    current
        .iter()
        .filter(|s| previous.get(&s.name) != Some(&s.status))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proc(pid: u32, name: &str) -> ProcessInfo {
        ProcessInfo {
            pid,
            name: name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn process_diff_is_sorted_by_pid() {
        let previous: HashMap<u32, ProcessInfo> =
            [(1, proc(1, "a")), (2, proc(2, "b"))].into_iter().collect();
        let current: HashMap<u32, ProcessInfo> =
            [(2, proc(2, "b")), (9, proc(9, "z")), (5, proc(5, "y"))]
                .into_iter()
                .collect();
        let (started, ended) = diff_processes(&previous, &current);
        assert_eq!(started.iter().map(|p| p.pid).collect::<Vec<_>>(), vec![5, 9]);
        assert_eq!(ended.iter().map(|p| p.pid).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn service_changes_include_new_and_transitioned() {
        let previous: HashMap<String, String> =
            [("db".to_string(), "running".to_string())].into_iter().collect();
        let current = vec![
            ServiceInfo {
                name: "db".into(),
                status: "stopped".into(),
            },
            ServiceInfo {
                name: "cache".into(),
                status: "running".into(),
            },
        ];
        assert_eq!(changed_services(&previous, &current).len(), 2);
        assert!(changed_services(&previous, &current[..0]).is_empty());
    }
}
