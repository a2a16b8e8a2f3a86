use crate::action::SystemCall;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstructionKind {
    Click,
    Type,
    Navigate,
    System,
    Wait,
}

/// Higher-level automation step derived from one or more actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instruction {
    #[serde(rename = "type")]
    pub kind: InstructionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_call: Option<SystemCall>,
    pub description: String,
    /// Window title active when the source action was captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl Instruction {
    pub fn new(kind: InstructionKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            target: None,
            value: None,
            selector: None,
            system_call: None,
            description: description.into(),
            context: None,
        }
    }
}
