//! Maps captured actions to automation instructions, a prompt, and a stub script.

mod script;

use mimic_common::{
    Action, ActionEvent, Instruction, InstructionKind, KeyboardEvent, KeyboardSubtype,
    MouseEvent, SystemEvent, SystemSubtype,
};

/// Stateless; one instance can be shared by every caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct Translator;

impl Translator {
    pub fn new() -> Self {
        Self
    }

    /// One instruction per action, plus an implicit focus step whenever the
    /// window title changes, then adjacent typing in the same window is merged.
    pub fn translate_to_instructions(&self, actions: &[Action]) -> Vec<Instruction> {
        let mut instructions = Vec::with_capacity(actions.len());
        let mut previous_title: Option<&str> = None;

        for (index, action) in actions.iter().enumerate() {
            let title = action.context.window_title.as_deref();
            if index > 0 && title != previous_title {
                if let Some(title) = title {
                    instructions.push(focus_window(title));
                }
            }
            previous_title = title;

            let mut instruction = translate_action(action);
            instruction.context = title.map(str::to_string);
            instructions.push(instruction);
        }

        coalesce(instructions)
    }

    /// Numbered, 1-based steps with optional context and target lines.
    pub fn generate_llm_prompt(&self, instructions: &[Instruction]) -> String {
        let mut prompt = String::new();
        for (index, instruction) in instructions.iter().enumerate() {
            prompt.push_str(&format!("{}. {}\n", index + 1, instruction.description));
            if let Some(context) = &instruction.context {
                prompt.push_str(&format!("   Context: {}\n", context));
            }
            if let Some(target) = &instruction.target {
                prompt.push_str(&format!("   Target: {}\n", target));
            }
        }
        prompt
    }

    /// Stub routine with one call per instruction. Needs a driver binding to run.
    pub fn generate_executable_code(&self, instructions: &[Instruction]) -> String {
        script::render(instructions)
    }
}

fn focus_window(title: &str) -> Instruction {
    Instruction {
        target: Some(title.to_string()),
        context: Some(title.to_string()),
        ..Instruction::new(InstructionKind::System, format!("Focus window \"{}\"", title))
    }
}

fn translate_action(action: &Action) -> Instruction {
    match &action.event {
        ActionEvent::Mouse(event) => click(event),
        ActionEvent::Keyboard(event) => typing(event),
        ActionEvent::System(event) => system(event),
    }
}

fn click(event: &MouseEvent) -> Instruction {
    let (target, selector) = match &event.target {
        Some(target) => (target.label().to_string(), Some(target.selector.clone())),
        None => (
            format!("({}, {})", event.coordinates.x, event.coordinates.y),
            None,
        ),
    };
    Instruction {
        target: Some(target.clone()),
        selector,
        ..Instruction::new(InstructionKind::Click, format!("Click {}", target))
    }
}

fn key_value(event: &KeyboardEvent) -> String {
    if event.subtype == KeyboardSubtype::KeyUp {
        return String::new();
    }
    if event.is_text() {
        return event.key.clone();
    }
    let mut parts: Vec<&str> = event.modifiers.labels();
    parts.push(&event.key);
    format!("{{{}}}", parts.join("+"))
}

fn typing(event: &KeyboardEvent) -> Instruction {
    let value = key_value(event);
    let description = if event.subtype == KeyboardSubtype::KeyUp {
        format!("Release {}", event.key)
    } else {
        format!("Type \"{}\"", value)
    };
    Instruction {
        value: Some(value),
        ..Instruction::new(InstructionKind::Type, description)
    }
}

fn system(event: &SystemEvent) -> Instruction {
    if let Some(call) = &event.system_call {
        return Instruction {
            system_call: Some(call.clone()),
            target: Some(format!("{}.{}", call.module, call.function)),
            ..Instruction::new(
                InstructionKind::System,
                format!(
                    "Call {} {}.{}",
                    call.call_type, call.module, call.function
                ),
            )
        };
    }

    match (event.subtype, &event.window, &event.process) {
        (SystemSubtype::WindowChange, Some(window), _) => Instruction {
            target: Some(window.title.clone()),
            ..Instruction::new(
                InstructionKind::Navigate,
                format!("Switch to window \"{}\"", window.title),
            )
        },
        (SystemSubtype::ProcessStart, _, Some(process)) => Instruction {
            target: Some(process.name.clone()),
            ..Instruction::new(
                InstructionKind::Wait,
                format!("Wait for process {} to start", process.name),
            )
        },
        (SystemSubtype::ProcessEnd, _, Some(process)) => Instruction {
            target: Some(process.name.clone()),
            ..Instruction::new(
                InstructionKind::Wait,
                format!("Wait for process {} to exit", process.name),
            )
        },
        (subtype, _, _) => Instruction::new(
            InstructionKind::Wait,
            format!("Wait for {}", subtype.as_str().replace('_', " ")),
        ),
    }
}

/// Merges runs of adjacent `type` instructions sharing a context.
fn coalesce(instructions: Vec<Instruction>) -> Vec<Instruction> {
    let mut merged: Vec<Instruction> = Vec::with_capacity(instructions.len());
    let mut run: Option<Instruction> = None;

    for instruction in instructions {
        if instruction.kind != InstructionKind::Type {
            merged.extend(run.take());
            merged.push(instruction);
            continue;
        }

        match run.as_mut() {
            Some(current) if current.context == instruction.context => {
                let value = current.value.get_or_insert_with(String::new);
                value.push_str(instruction.value.as_deref().unwrap_or_default());
                current.description = format!("Type \"{}\"", value);
            }
            _ => {
                merged.extend(run.take());
                run = Some(instruction);
            }
        }
    }
    merged.extend(run);
    merged
}
