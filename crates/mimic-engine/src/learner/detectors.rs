//! Heuristic emergent-behavior detectors.

use mimic_common::{Action, ActionEvent};
use std::collections::{BTreeSet, HashSet};

pub const KEYBOARD_SHORTCUTS: &str = "keyboard-shortcuts";
pub const RAPID_INPUT: &str = "rapid-input";
pub const MULTI_WINDOW: &str = "multi-window";
pub const SYSTEM_AUTOMATION: &str = "system-automation";
pub const TARGETED_CLICKS: &str = "targeted-clicks";

/// Keystrokes closer together than this count as one burst.
const RAPID_GAP_MS: u64 = 150;
const RAPID_MIN_RUN: usize = 3;

pub fn detect(actions: &[Action]) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    if uses_shortcuts(actions) {
        found.insert(KEYBOARD_SHORTCUTS.to_string());
    }
    if has_rapid_input(actions) {
        found.insert(RAPID_INPUT.to_string());
    }
    if spans_windows(actions) {
        found.insert(MULTI_WINDOW.to_string());
    }
    if actions.iter().any(|a| match &a.event {
        ActionEvent::System(sys) => sys.system_call.is_some(),
        _ => false,
    }) {
        found.insert(SYSTEM_AUTOMATION.to_string());
    }
    if clicks_are_targeted(actions) {
        found.insert(TARGETED_CLICKS.to_string());
    }
    found
}

fn uses_shortcuts(actions: &[Action]) -> bool {
    actions.iter().any(|a| match &a.event {
        ActionEvent::Keyboard(key) => key.modifiers.is_shortcut(),
        _ => false,
    })
}

fn has_rapid_input(actions: &[Action]) -> bool {
    let mut run = 0usize;
    let mut last: Option<u64> = None;
    for action in actions {
        let ActionEvent::Keyboard(key) = &action.event else {
            run = 0;
            last = None;
            continue;
        };
        run = match last {
            Some(prev) if key.timestamp.saturating_sub(prev) <= RAPID_GAP_MS => run + 1,
            _ => 1,
        };
        last = Some(key.timestamp);
        if run >= RAPID_MIN_RUN {
            return true;
        }
    }
    false
}

fn spans_windows(actions: &[Action]) -> bool {
    let titles: HashSet<&str> = actions
        .iter()
        .filter_map(|a| a.context.window_title.as_deref())
        .collect();
    titles.len() >= 2
}

fn clicks_are_targeted(actions: &[Action]) -> bool {
    let mut clicks = actions.iter().filter_map(|a| match &a.event {
        ActionEvent::Mouse(mouse) => Some(mouse),
        _ => None,
    });
    let Some(first) = clicks.next() else {
        return false;
    };
    first.target.is_some() && clicks.all(|m| m.target.is_some())
}
