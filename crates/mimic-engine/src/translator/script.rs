use mimic_common::{Instruction, InstructionKind};

const HEADER: &str = concat!(
    "// Generated automation stub. ",
    "Bind `driver` to a real implementation to run it.\n",
    "async fn run_automation(driver: &mut impl Driver) -> Result<(), DriverError> {\n",
);

pub(super) fn render(instructions: &[Instruction]) -> String {
    let mut code = String::from(HEADER);
    for instruction in instructions {
        code.push_str("    ");
        code.push_str(&call(instruction));
        code.push('\n');
    }
    code.push_str("    Ok(())\n}\n");
    code
}

fn literal(value: Option<&str>) -> String {
    // JSON string escaping is a valid Rust string literal for printable input.
    serde_json::to_string(value.unwrap_or_default()).unwrap_or_else(|_| "\"\"".to_string())
}

fn call(instruction: &Instruction) -> String {
    match instruction.kind {
        InstructionKind::Click => format!(
            "driver.click({}).await?;",
            literal(
                instruction
                    .selector
                    .as_deref()
                    .or(instruction.target.as_deref())
            )
        ),
        InstructionKind::Type => format!(
            "driver.type_text({}).await?;",
            literal(instruction.value.as_deref())
        ),
        InstructionKind::Navigate => format!(
            "driver.navigate({}).await?;",
            literal(instruction.target.as_deref())
        ),
        InstructionKind::System => match &instruction.system_call {
            Some(sc) => format!(
                "driver.system_call({}, {}, {}, {}).await?;",
                literal(Some(&sc.call_type)),
                literal(Some(&sc.module)),
                literal(Some(&sc.function)),
                literal(
                    sc.parameters
                        .as_ref()
                        .map(|p| p.to_string())
                        .as_deref()
                )
            ),
            None => format!(
                "driver.focus_window({}).await?;",
                literal(instruction.target.as_deref())
            ),
        },
        InstructionKind::Wait => format!(
            "driver.wait({}).await?; // {}",
            instruction
                .value
                .as_deref()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0),
            instruction.description
        ),
    }
}
