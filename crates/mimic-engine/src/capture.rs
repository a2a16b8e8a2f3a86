//! Capture-side collaborators: GUI scraping and environment inspection.
//!
//! Both are consumed by the recorder; real implementations live outside this crate.

use async_trait::async_trait;
pub use mimic_common::CaptureError;
use mimic_common::{Environment, GuiElement, ProcessInfo, ResourceMetrics, ServiceInfo};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActiveWindow {
    pub title: String,
    pub application: String,
}

/// On-screen element recognition.
#[async_trait]
pub trait GuiScraper: Send + Sync {
    /// Refresh the internal element map from the current screen.
    async fn capture_screen(&mut self) -> Result<(), CaptureError>;

    /// Elements found by the last capture.
    fn elements(&self) -> Vec<GuiElement>;

    /// Innermost element containing the point, if any.
    fn find_element_at(&self, x: f64, y: f64) -> Option<GuiElement>;

    /// Release capture resources. Further captures fail with [`CaptureError::Disposed`].
    async fn dispose(&mut self);
}

/// Environment and process inspection primitives.
#[async_trait]
pub trait EnvironmentProbe: Send + Sync {
    async fn environment(&self) -> Result<Environment, CaptureError>;

    async fn active_window(&self) -> Result<Option<ActiveWindow>, CaptureError>;

    async fn processes(&self) -> Result<Vec<ProcessInfo>, CaptureError>;

    async fn services(&self) -> Result<Vec<ServiceInfo>, CaptureError> {
        Ok(Vec::new())
    }

    async fn resources(&self) -> Result<ResourceMetrics, CaptureError>;
}

/// Scraper that serves a fixed element map.
#[derive(Debug, Default)]
pub struct ElementMapScraper {
    elements: Vec<GuiElement>,
    captures: usize,
    disposed: bool,
}

impl ElementMapScraper {
    pub fn new(elements: Vec<GuiElement>) -> Self {
        Self {
            elements,
            captures: 0,
            disposed: false,
        }
    }

    pub fn captures(&self) -> usize {
        self.captures
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

#[async_trait]
impl GuiScraper for ElementMapScraper {
    async fn capture_screen(&mut self) -> Result<(), CaptureError> {
        if self.disposed {
            return Err(CaptureError::Disposed);
        }
        self.captures += 1;
        Ok(())
    }

    fn elements(&self) -> Vec<GuiElement> {
        self.elements.clone()
    }

    fn find_element_at(&self, x: f64, y: f64) -> Option<GuiElement> {
        self.elements
            .iter()
            .filter(|e| e.bounds.contains(x, y))
            .min_by(|a, b| {
                let area_a = a.bounds.width * a.bounds.height;
                let area_b = b.bounds.width * b.bounds.height;
                area_a.total_cmp(&area_b)
            })
            .cloned()
    }

    async fn dispose(&mut self) {
        self.disposed = true;
    }
}

/// Probe that reports a fixed environment. Used when no platform probe is wired in.
#[derive(Debug, Clone, Default)]
pub struct StaticEnvironment {
    pub environment: Environment,
    pub window: Option<ActiveWindow>,
    pub processes: Vec<ProcessInfo>,
    pub services: Vec<ServiceInfo>,
    pub resources: ResourceMetrics,
}

impl StaticEnvironment {
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            ..Default::default()
        }
    }
}

#[async_trait]
impl EnvironmentProbe for StaticEnvironment {
    async fn environment(&self) -> Result<Environment, CaptureError> {
        Ok(self.environment.clone())
    }

    async fn active_window(&self) -> Result<Option<ActiveWindow>, CaptureError> {
        Ok(self.window.clone())
    }

    async fn processes(&self) -> Result<Vec<ProcessInfo>, CaptureError> {
        Ok(self.processes.clone())
    }

    async fn services(&self) -> Result<Vec<ServiceInfo>, CaptureError> {
        Ok(self.services.clone())
    }

    async fn resources(&self) -> Result<ResourceMetrics, CaptureError> {
        Ok(self.resources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimic_common::Bounds;

    fn element(kind: &str, x: f64, y: f64, w: f64, h: f64) -> GuiElement {
        GuiElement {
            element_type: kind.into(),
            bounds: Bounds {
                x,
                y,
                width: w,
                height: h,
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn finds_innermost_element() {
        let scraper = ElementMapScraper::new(vec![
            element("window", 0.0, 0.0, 800.0, 600.0),
            element("button", 10.0, 10.0, 50.0, 20.0),
        ]);
        let hit = scraper.find_element_at(20.0, 15.0).unwrap();
        assert_eq!(hit.element_type, "button");
        assert!(scraper.find_element_at(900.0, 10.0).is_none());
    }

    #[tokio::test]
    async fn disposed_scraper_refuses_capture() {
        let mut scraper = ElementMapScraper::default();
        scraper.capture_screen().await.unwrap();
        scraper.dispose().await;
        assert!(matches!(
            scraper.capture_screen().await,
            Err(CaptureError::Disposed)
        ));
        assert_eq!(scraper.captures(), 1);
    }
}
