use mimic_common::{
    ActionEvent, Coordinates, KeyboardEvent, KeyboardSubtype, Modifiers, MouseButton, MouseEvent,
    MouseSubtype, ProcessInfo, ServiceInfo, SystemCall, SystemEvent, SystemSubtype, WindowInfo,
};

/// A raw input or system signal delivered to the recorder.
#[derive(Debug, Clone, PartialEq)]
pub enum InputSignal {
    Mouse(MouseInput),
    Keyboard(KeyboardInput),
    System(SystemInput),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MouseInput {
    pub subtype: MouseSubtype,
    pub x: f64,
    pub y: f64,
    pub screen: Option<u32>,
    pub button: Option<MouseButton>,
    pub pressure: Option<f64>,
}

impl MouseInput {
    pub fn click(x: f64, y: f64) -> Self {
        Self {
            subtype: MouseSubtype::Click,
            x,
            y,
            screen: None,
            button: Some(MouseButton::Left),
            pressure: None,
        }
    }

    pub fn moved(x: f64, y: f64) -> Self {
        Self {
            subtype: MouseSubtype::Move,
            button: None,
            ..Self::click(x, y)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyboardInput {
    pub subtype: KeyboardSubtype,
    pub key: String,
    pub key_code: Option<u32>,
    pub modifiers: Modifiers,
    pub repeat: Option<bool>,
}

impl KeyboardInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            subtype: KeyboardSubtype::Input,
            key: text.into(),
            key_code: None,
            modifiers: Modifiers::default(),
            repeat: None,
        }
    }

    pub fn key_down(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            subtype: KeyboardSubtype::KeyDown,
            modifiers,
            ..Self::text(key)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SystemInput {
    pub subtype: SystemSubtype,
    pub process: Option<ProcessInfo>,
    pub service: Option<ServiceInfo>,
    pub system_call: Option<SystemCall>,
    pub window: Option<WindowInfo>,
}

impl SystemInput {
    pub fn new(subtype: SystemSubtype) -> Self {
        Self {
            subtype,
            process: None,
            service: None,
            system_call: None,
            window: None,
        }
    }

    pub fn call(call: SystemCall) -> Self {
        Self {
            system_call: Some(call),
            ..Self::new(SystemSubtype::SystemCall)
        }
    }

    pub fn window(window: WindowInfo) -> Self {
        Self {
            window: Some(window),
            ..Self::new(SystemSubtype::WindowChange)
        }
    }
}

impl InputSignal {
    /// Builds the event payload; the recorder stamps the timestamp on append.
    pub(crate) fn into_event(self) -> ActionEvent {
        match self {
            InputSignal::Mouse(m) => ActionEvent::Mouse(MouseEvent {
                subtype: m.subtype,
                coordinates: Coordinates {
                    x: m.x,
                    y: m.y,
                    screen: m.screen,
                    relative: None,
                },
                target: None,
                button: m.button,
                pressure: m.pressure,
                timestamp: 0,
            }),
            InputSignal::Keyboard(k) => ActionEvent::Keyboard(KeyboardEvent {
                subtype: k.subtype,
                key: k.key,
                key_code: k.key_code,
                modifiers: k.modifiers,
                repeat: k.repeat,
                timestamp: 0,
            }),
            InputSignal::System(s) => ActionEvent::System(SystemEvent {
                subtype: s.subtype,
                process: s.process,
                service: s.service,
                system_call: s.system_call,
                window: s.window,
                timestamp: 0,
            }),
        }
    }
}
