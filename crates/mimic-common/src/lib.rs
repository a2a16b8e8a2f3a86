pub mod action;
pub mod environment;
pub mod error;
pub mod instruction;
pub mod pattern;
pub mod recording;

pub use action::{
    Action, ActionContext, ActionEvent, ActionKind, Bounds, Coordinates, ElementTarget,
    GuiElement, GuiSnapshot, KeyboardEvent, KeyboardSubtype, Modifiers, MouseButton, MouseEvent,
    MouseSubtype, Point, ProcessInfo, ResourceMetrics, ScreenResolution, ServiceInfo, SystemCall,
    SystemEvent, SystemSubtype, WindowInfo,
};
pub use environment::{Display, Environment};
pub use error::{CaptureError, DispatchError, StoreError};
pub use instruction::{Instruction, InstructionKind};
pub use pattern::{ContextFeatures, Pattern, SuccessMetrics};
pub use recording::{NewRecording, Recording};
