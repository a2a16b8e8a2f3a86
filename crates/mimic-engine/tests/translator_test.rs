use mimic_common::{
    Action, ActionContext, ActionEvent, Coordinates, ElementTarget, InstructionKind,
    KeyboardEvent, KeyboardSubtype, Modifiers, MouseButton, MouseEvent, MouseSubtype, SystemCall,
    SystemEvent, SystemSubtype,
};
use mimic_engine::translator::Translator;
use serde_json::json;

fn click_on(id: &str, text: &str, selector: &str, ts: u64) -> Action {
    Action::new(
        id,
        ActionEvent::Mouse(MouseEvent {
            subtype: MouseSubtype::Click,
            coordinates: Coordinates::at(10.0, 20.0),
            target: Some(ElementTarget {
                element: format!("{}-btn", text.to_lowercase()),
                selector: selector.into(),
                text: Some(text.into()),
                ..Default::default()
            }),
            button: Some(MouseButton::Left),
            pressure: None,
            timestamp: ts,
        }),
    )
}

fn typed(id: &str, text: &str, ts: u64, window: &str) -> Action {
    Action::new(
        id,
        ActionEvent::Keyboard(KeyboardEvent {
            subtype: KeyboardSubtype::Input,
            key: text.into(),
            key_code: None,
            modifiers: Modifiers::default(),
            repeat: None,
            timestamp: ts,
        }),
    )
    .with_context(ActionContext {
        window_title: Some(window.into()),
        ..Default::default()
    })
}

#[test]
fn save_then_cancel_scenario() {
    let translator = Translator::new();
    let actions = vec![
        click_on("1", "Save", "#save", 0),
        click_on("2", "Cancel", "#cancel", 500),
    ];

    let instructions = translator.translate_to_instructions(&actions);
    assert_eq!(instructions.len(), 2);
    assert!(instructions.iter().all(|i| i.kind == InstructionKind::Click));

    let prompt = translator.generate_llm_prompt(&instructions);
    let steps: Vec<&str> = prompt
        .lines()
        .filter(|line| !line.starts_with(' '))
        .collect();
    assert_eq!(steps, vec!["1. Click Save", "2. Click Cancel"]);
    assert!(prompt.contains("   Target: Save\n"));

    let code = translator.generate_executable_code(&instructions);
    let calls: Vec<&str> = code
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("driver."))
        .collect();
    assert_eq!(
        calls,
        vec![
            "driver.click(\"#save\").await?;",
            "driver.click(\"#cancel\").await?;"
        ]
    );
    assert!(code.contains("async fn run_automation"));
}

#[test]
fn window_change_inserts_focus_and_breaks_typing_runs() {
    let translator = Translator::new();
    let actions = vec![
        typed("1", "he", 0, "Editor"),
        typed("2", "llo", 50, "Editor"),
        typed("3", "hi", 100, "Chat"),
    ];

    let instructions = translator.translate_to_instructions(&actions);
    let kinds: Vec<InstructionKind> = instructions.iter().map(|i| i.kind).collect();
    assert_eq!(
        kinds,
        vec![
            InstructionKind::Type,
            InstructionKind::System,
            InstructionKind::Type
        ]
    );
    assert_eq!(instructions[0].value.as_deref(), Some("hello"));
    assert_eq!(instructions[1].target.as_deref(), Some("Chat"));
    assert_eq!(instructions[2].value.as_deref(), Some("hi"));

    let prompt = translator.generate_llm_prompt(&instructions);
    assert!(prompt.starts_with("1. Type \"hello\"\n   Context: Editor\n"));
}

#[test]
fn system_calls_are_carried_through() {
    let translator = Translator::new();
    let mut event = SystemEvent::new(SystemSubtype::SystemCall, 0);
    event.system_call = Some(SystemCall {
        call_type: "file".into(),
        module: "fs".into(),
        function: "write".into(),
        parameters: Some(json!({"path": "/tmp/out.txt"})),
        result: None,
        error: None,
        timestamp: 0,
    });
    let actions = vec![Action::new("1", ActionEvent::System(event))];

    let instructions = translator.translate_to_instructions(&actions);
    assert_eq!(instructions.len(), 1);
    assert_eq!(instructions[0].kind, InstructionKind::System);
    assert_eq!(
        instructions[0].system_call.as_ref().map(|c| c.function.as_str()),
        Some("write")
    );

    let code = translator.generate_executable_code(&instructions);
    assert!(code.contains("driver.system_call(\"file\", \"fs\", \"write\""));
}

#[test]
fn empty_input_yields_empty_outputs() {
    let translator = Translator::new();
    let instructions = translator.translate_to_instructions(&[]);
    assert!(instructions.is_empty());
    assert_eq!(translator.generate_llm_prompt(&instructions), "");
    assert!(translator.generate_executable_code(&instructions).ends_with("    Ok(())\n}\n"));
}
