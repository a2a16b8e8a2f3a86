use crate::capture::{ActiveWindow, CaptureError, EnvironmentProbe, GuiScraper};
use mimic_common::{
    ActionContext, ElementTarget, Environment, GuiElement, GuiSnapshot, ProcessInfo,
    ScreenResolution,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};

/// The scraper plus the element list published by its last capture.
///
/// Snapshots read the published list, so they never wait behind a capture that
/// holds the scraper.
#[derive(Clone)]
pub(crate) struct GuiHandle {
    scraper: Arc<Mutex<Box<dyn GuiScraper>>>,
    elements: Arc<watch::Sender<Vec<GuiElement>>>,
}

impl GuiHandle {
    pub fn new(scraper: Box<dyn GuiScraper>) -> Self {
        let (elements, _) = watch::channel(Vec::new());
        Self {
            scraper: Arc::new(Mutex::new(scraper)),
            elements: Arc::new(elements),
        }
    }

    /// Captures the screen and publishes the resulting element map.
    pub async fn refresh(&self) -> Result<(), CaptureError> {
        let mut scraper = self.scraper.lock().await;
        scraper.capture_screen().await?;
        self.elements.send_replace(scraper.elements());
        Ok(())
    }

    pub fn elements(&self) -> Vec<GuiElement> {
        self.elements.borrow().clone()
    }

    pub async fn element_at(&self, x: f64, y: f64) -> Option<GuiElement> {
        self.scraper.lock().await.find_element_at(x, y)
    }

    pub async fn dispose(&self) {
        self.scraper.lock().await.dispose().await;
        self.elements.send_replace(Vec::new());
    }
}

/// Gathers the point-in-time context attached to each action.
///
/// Every collaborator failure degrades to an empty value and a warning; capture
/// never stops because a probe is unavailable.
#[derive(Clone)]
pub(crate) struct ContextBuilder {
    env: Arc<dyn EnvironmentProbe>,
    gui: Option<GuiHandle>,
}

impl ContextBuilder {
    pub fn new(env: Arc<dyn EnvironmentProbe>, gui: Option<GuiHandle>) -> Self {
        Self { env, gui }
    }

    pub fn env(&self) -> &Arc<dyn EnvironmentProbe> {
        &self.env
    }

    pub async fn environment(&self) -> Environment {
        match self.env.environment().await {
            Ok(env) => env,
            Err(e) => {
                tracing::warn!("Environment probe unavailable: {}", e);
                Environment::default()
            }
        }
    }

    pub async fn snapshot(&self) -> ActionContext {
        let environment = self.environment().await;

        let window = match self.env.active_window().await {
            Ok(window) => window,
            Err(e) => {
                tracing::warn!("Active window probe unavailable: {}", e);
                None
            }
        };

        let processes = match self.env.processes().await {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!("Process probe unavailable: {}", e);
                Vec::new()
            }
        };

        let resources = match self.env.resources().await {
            Ok(metrics) => metrics,
            Err(e) => {
                tracing::warn!("Resource probe unavailable: {}", e);
                Default::default()
            }
        };

        let gui_state = match &self.gui {
            Some(gui) => GuiSnapshot {
                elements: gui.elements(),
                regions: Vec::new(),
            },
            None => GuiSnapshot::default(),
        };

        let screen_resolution = environment.primary_display().map(|d| ScreenResolution {
            width: d.width,
            height: d.height,
        });
        let (window_title, active_application) = match window {
            Some(ActiveWindow { title, application }) => (Some(title), Some(application)),
            None => (None, None),
        };
        let chain = active_application
            .as_deref()
            .map(|app| process_chain(&processes, app))
            .unwrap_or_default();

        ActionContext {
            window_title,
            active_application,
            screen_resolution,
            environment,
            process_chain: chain,
            resources,
            gui_state,
        }
    }

    /// Resolves the element under a pointer position.
    pub async fn target_at(&self, x: f64, y: f64) -> Option<ElementTarget> {
        let element = self.gui.as_ref()?.element_at(x, y).await?;
        Some(element_target(&element))
    }
}

pub(crate) fn element_target(element: &GuiElement) -> ElementTarget {
    let element_id = element
        .attributes
        .get("id")
        .cloned()
        .unwrap_or_else(|| {
            format!(
                "{}@{},{}",
                element.element_type, element.bounds.x, element.bounds.y
            )
        });
    let selector = match (element.attributes.get("selector"), &element.text) {
        (Some(selector), _) => selector.clone(),
        (None, Some(text)) => format!("{}[text={:?}]", element.element_type, text),
        (None, None) => format!("{}#{}", element.element_type, element_id),
    };
    ElementTarget {
        element: element_id,
        selector,
        text: element.text.clone(),
        attributes: element.attributes.clone(),
        role: element.attributes.get("role").cloned(),
    }
}

/// Ancestry of the process running `application`, innermost first.
pub(crate) fn process_chain(processes: &[ProcessInfo], application: &str) -> Vec<ProcessInfo> {
    let by_pid: HashMap<u32, &ProcessInfo> = processes.iter().map(|p| (p.pid, p)).collect();
    let Some(mut current) = processes
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(application))
    else {
        return Vec::new();
    };

    let mut chain = vec![current.clone()];
    while let Some(parent) = current.parent_pid.and_then(|pid| by_pid.get(&pid).copied()) {
        if chain.iter().any(|p| p.pid == parent.pid) {
            break;
        }
        chain.push(parent.clone());
        current = parent;
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proc(pid: u32, name: &str, parent: Option<u32>) -> ProcessInfo {
        ProcessInfo {
            pid,
            name: name.into(),
            parent_pid: parent,
            command: None,
        }
    }

    #[test]
    fn chain_follows_parents_and_stops_on_cycles() {
        let processes = vec![
            proc(1, "init", None),
            proc(20, "shell", Some(1)),
            proc(300, "Editor", Some(20)),
            proc(7, "loop-a", Some(8)),
            proc(8, "loop-b", Some(7)),
        ];
        let names: Vec<String> = process_chain(&processes, "editor")
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Editor", "shell", "init"]);
        assert_eq!(process_chain(&processes, "loop-a").len(), 2);
        assert!(process_chain(&processes, "missing").is_empty());
    }

    #[test]
    fn target_prefers_explicit_identifiers() {
        let mut element = GuiElement {
            element_type: "button".into(),
            text: Some("Save".into()),
            ..Default::default()
        };
        element.attributes.insert("id".into(), "save-btn".into());
        let target = element_target(&element);
        assert_eq!(target.element, "save-btn");
        assert_eq!(target.selector, "button[text=\"Save\"]");
        assert_eq!(target.label(), "Save");
    }
}
