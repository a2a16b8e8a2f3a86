use crate::environment::Environment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level discriminant of an [`ActionEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Mouse,
    Keyboard,
    System,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Mouse => "mouse",
            ActionKind::Keyboard => "keyboard",
            ActionKind::System => "system",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "mouse" => Some(ActionKind::Mouse),
            "keyboard" => Some(ActionKind::Keyboard),
            "system" => Some(ActionKind::System),
            _ => None,
        }
    }
}

/// One captured (or synthesized) unit of interaction.
///
/// Serializes as `{ "id", "type", "event", "context" }`, where `type` selects the
/// shape of `event`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    #[serde(flatten)]
    pub event: ActionEvent,
    #[serde(default)]
    pub context: ActionContext,
}

impl Action {
    pub fn new(id: impl Into<String>, event: ActionEvent) -> Self {
        Self {
            id: id.into(),
            event,
            context: ActionContext::default(),
        }
    }

    pub fn with_context(mut self, context: ActionContext) -> Self {
        self.context = context;
        self
    }

    pub fn kind(&self) -> ActionKind {
        self.event.kind()
    }

    pub fn timestamp(&self) -> u64 {
        self.event.timestamp()
    }

    /// `"type:subtype"` token used by pattern sequences.
    pub fn token(&self) -> String {
        self.event.token()
    }

    /// True when the action reports a failure, i.e. a system call carrying an error.
    pub fn indicates_error(&self) -> bool {
        match &self.event {
            ActionEvent::System(sys) => sys
                .system_call
                .as_ref()
                .is_some_and(|call| call.error.is_some()),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "event", rename_all = "lowercase")]
pub enum ActionEvent {
    Mouse(MouseEvent),
    Keyboard(KeyboardEvent),
    System(SystemEvent),
}

impl ActionEvent {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionEvent::Mouse(_) => ActionKind::Mouse,
            ActionEvent::Keyboard(_) => ActionKind::Keyboard,
            ActionEvent::System(_) => ActionKind::System,
        }
    }

    pub fn timestamp(&self) -> u64 {
        match self {
            ActionEvent::Mouse(e) => e.timestamp,
            ActionEvent::Keyboard(e) => e.timestamp,
            ActionEvent::System(e) => e.timestamp,
        }
    }

    pub fn set_timestamp(&mut self, timestamp: u64) {
        match self {
            ActionEvent::Mouse(e) => e.timestamp = timestamp,
            ActionEvent::Keyboard(e) => e.timestamp = timestamp,
            ActionEvent::System(e) => e.timestamp = timestamp,
        }
    }

    pub fn subtype(&self) -> &'static str {
        match self {
            ActionEvent::Mouse(e) => e.subtype.as_str(),
            ActionEvent::Keyboard(e) => e.subtype.as_str(),
            ActionEvent::System(e) => e.subtype.as_str(),
        }
    }

    pub fn token(&self) -> String {
        format!("{}:{}", self.kind().as_str(), self.subtype())
    }

    /// Compares kind and payload, ignoring when the event happened.
    pub fn same_payload(&self, other: &ActionEvent) -> bool {
        if self.kind() != other.kind() {
            return false;
        }
        let mut a = self.clone();
        let mut b = other.clone();
        a.set_timestamp(0);
        b.set_timestamp(0);
        a == b
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseSubtype {
    Click,
    DoubleClick,
    RightClick,
    Down,
    Up,
    Move,
    Scroll,
    Drag,
}

impl MouseSubtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            MouseSubtype::Click => "click",
            MouseSubtype::DoubleClick => "double_click",
            MouseSubtype::RightClick => "right_click",
            MouseSubtype::Down => "down",
            MouseSubtype::Up => "up",
            MouseSubtype::Move => "move",
            MouseSubtype::Scroll => "scroll",
            MouseSubtype::Drag => "drag",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "click" => MouseSubtype::Click,
            "double_click" => MouseSubtype::DoubleClick,
            "right_click" => MouseSubtype::RightClick,
            "down" => MouseSubtype::Down,
            "up" => MouseSubtype::Up,
            "move" => MouseSubtype::Move,
            "scroll" => MouseSubtype::Scroll,
            "drag" => MouseSubtype::Drag,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    #[default]
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative: Option<Point>,
}

impl Coordinates {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            screen: None,
            relative: None,
        }
    }
}

/// The GUI element a mouse event landed on.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementTarget {
    pub element: String,
    pub selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl ElementTarget {
    /// Human-facing label: visible text when present, the element identifier otherwise.
    pub fn label(&self) -> &str {
        match self.text.as_deref() {
            Some(text) if !text.trim().is_empty() => text,
            _ => &self.element,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MouseEvent {
    pub subtype: MouseSubtype,
    pub coordinates: Coordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<ElementTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button: Option<MouseButton>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyboardSubtype {
    KeyDown,
    KeyUp,
    KeyPress,
    /// Committed text input (IME or plain typing).
    Input,
}

impl KeyboardSubtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyboardSubtype::KeyDown => "key_down",
            KeyboardSubtype::KeyUp => "key_up",
            KeyboardSubtype::KeyPress => "key_press",
            KeyboardSubtype::Input => "input",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "key_down" => KeyboardSubtype::KeyDown,
            "key_up" => KeyboardSubtype::KeyUp,
            "key_press" => KeyboardSubtype::KeyPress,
            "input" => KeyboardSubtype::Input,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
    #[serde(rename = "fn")]
    pub function: bool,
}

impl Modifiers {
    pub fn any(&self) -> bool {
        self.ctrl || self.alt || self.shift || self.meta || self.function
    }

    /// Modifier combination that turns a key into a shortcut rather than text.
    pub fn is_shortcut(&self) -> bool {
        self.ctrl || self.alt || self.meta
    }

    pub fn labels(&self) -> Vec<&'static str> {
        let mut labels = Vec::new();
        if self.ctrl {
            labels.push("Ctrl");
        }
        if self.alt {
            labels.push("Alt");
        }
        if self.shift {
            labels.push("Shift");
        }
        if self.meta {
            labels.push("Meta");
        }
        if self.function {
            labels.push("Fn");
        }
        labels
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyboardEvent {
    pub subtype: KeyboardSubtype,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_code: Option<u32>,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<bool>,
    pub timestamp: u64,
}

impl KeyboardEvent {
    /// Single printable character without shortcut modifiers.
    pub fn is_text(&self) -> bool {
        self.subtype == KeyboardSubtype::Input
            || (self.key.chars().count() == 1 && !self.modifiers.is_shortcut())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemSubtype {
    ProcessStart,
    ProcessEnd,
    ServiceChange,
    SystemCall,
    WindowChange,
    ResourceSample,
    #[serde(other)]
    Unknown,
}

impl SystemSubtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemSubtype::ProcessStart => "process_start",
            SystemSubtype::ProcessEnd => "process_end",
            SystemSubtype::ServiceChange => "service_change",
            SystemSubtype::SystemCall => "system_call",
            SystemSubtype::WindowChange => "window_change",
            SystemSubtype::ResourceSample => "resource_sample",
            SystemSubtype::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "process_start" => SystemSubtype::ProcessStart,
            "process_end" => SystemSubtype::ProcessEnd,
            "service_change" => SystemSubtype::ServiceChange,
            "system_call" => SystemSubtype::SystemCall,
            "window_change" => SystemSubtype::WindowChange,
            "resource_sample" => SystemSubtype::ResourceSample,
            "unknown" => SystemSubtype::Unknown,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_pid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    pub status: String,
}

/// An abstract call into the operating system. Only modelled, never executed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemCall {
    #[serde(rename = "type")]
    pub call_type: String,
    pub module: String,
    pub function: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && y >= self.y && x <= self.x + self.width && y <= self.y + self.height
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowInfo {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_fullscreen: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_minimized: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_maximized: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemEvent {
    pub subtype: SystemSubtype,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<ProcessInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_call: Option<SystemCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<WindowInfo>,
    pub timestamp: u64,
}

impl SystemEvent {
    pub fn new(subtype: SystemSubtype, timestamp: u64) -> Self {
        Self {
            subtype,
            process: None,
            service: None,
            system_call: None,
            window: None,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScreenResolution {
    pub width: u32,
    pub height: u32,
}

/// System-resource metrics sampled alongside an action.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceMetrics {
    pub cpu_percent: f64,
    pub memory_mb: f64,
    pub disk_io_kbps: f64,
    pub network_kbps: f64,
}

impl ResourceMetrics {
    pub fn named(&self) -> [(&'static str, f64); 4] {
        [
            ("cpu_percent", self.cpu_percent),
            ("memory_mb", self.memory_mb),
            ("disk_io_kbps", self.disk_io_kbps),
            ("network_kbps", self.network_kbps),
        ]
    }

    /// Applies `f` to every metric.
    pub fn map(&self, mut f: impl FnMut(f64) -> f64) -> Self {
        Self {
            cpu_percent: f(self.cpu_percent),
            memory_mb: f(self.memory_mb),
            disk_io_kbps: f(self.disk_io_kbps),
            network_kbps: f(self.network_kbps),
        }
    }
}

/// An element reported by the GUI-scrape collaborator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GuiElement {
    #[serde(rename = "type")]
    pub element_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub bounds: Bounds,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GuiSnapshot {
    pub elements: Vec<GuiElement>,
    pub regions: Vec<Bounds>,
}

/// Point-in-time environment snapshot attached to every action.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_application: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_resolution: Option<ScreenResolution>,
    pub environment: Environment,
    pub process_chain: Vec<ProcessInfo>,
    pub resources: ResourceMetrics,
    pub gui_state: GuiSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(k: &str, ts: u64) -> ActionEvent {
        ActionEvent::Keyboard(KeyboardEvent {
            subtype: KeyboardSubtype::KeyPress,
            key: k.into(),
            key_code: None,
            modifiers: Modifiers::default(),
            repeat: None,
            timestamp: ts,
        })
    }

    #[test]
    fn same_payload_ignores_timestamp() {
        assert!(key("a", 10).same_payload(&key("a", 900)));
        assert!(!key("a", 10).same_payload(&key("b", 10)));
    }

    #[test]
    fn subtype_tokens_parse_back() {
        for s in [MouseSubtype::Click, MouseSubtype::DoubleClick, MouseSubtype::Drag] {
            assert_eq!(MouseSubtype::parse(s.as_str()), Some(s));
        }
        for s in [KeyboardSubtype::KeyDown, KeyboardSubtype::Input] {
            assert_eq!(KeyboardSubtype::parse(s.as_str()), Some(s));
        }
        assert_eq!(
            SystemSubtype::parse("window_change"),
            Some(SystemSubtype::WindowChange)
        );
        assert_eq!(key("a", 0).token(), "keyboard:key_press");
    }

    #[test]
    fn unknown_system_subtype_deserializes() {
        let event: SystemEvent =
            serde_json::from_str(r#"{"subtype":"kernel_panic","timestamp":5}"#).unwrap();
        assert_eq!(event.subtype, SystemSubtype::Unknown);
    }
}
