//! Undo/redo laws over sequences of edits through the editor control.

use proptest::prelude::*;
use serde_json::Value;
use weft_editor_core::{EditorConfig, EditorControl};

fn control(text: &str) -> EditorControl {
    let settings = EditorConfig {
        mac_keymap: false,
        ..EditorConfig::default()
    };
    EditorControl::new(text, settings)
}

#[derive(Debug, Clone)]
enum Op {
    Insert { at: usize, text: String },
    ReplaceRange { from: usize, to: usize, text: String },
    Command(&'static str),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..100, "[a-z\n]{1,4}").prop_map(|(at, text)| Op::Insert { at, text }),
        (0usize..100, 0usize..100, "[a-z]{0,3}")
            .prop_map(|(from, to, text)| Op::ReplaceRange { from, to, text }),
        prop::sample::select(vec!["toggleComment", "deleteLine", "duplicateLine"]).prop_map(Op::Command),
    ]
}

/// Apply one op. Returns true if it produced a history entry.
fn apply(control: &mut EditorControl, op: &Op) -> bool {
    let len = control.get_value().chars().count();
    let before = control.state().undo_depth();
    match op {
        Op::Insert { at, text } => {
            let at = at % (len + 1);
            control.select(at, at);
            control.insert_text(text);
        }
        Op::ReplaceRange { from, to, text } => {
            control.select(from % (len + 1), to % (len + 1));
            control.insert_text(text);
        }
        Op::Command(name) => {
            control.exec_command(name, Value::Null).unwrap();
        }
    }
    control.state().undo_depth() > before
}

proptest! {
    #[test]
    fn undo_all_then_redo_all(ops in prop::collection::vec(op_strategy(), 1..20)) {
        let mut control = control("");
        let mut steps = 0;
        for op in &ops {
            if apply(&mut control, op) {
                steps += 1;
            }
        }
        let final_text = control.get_value();

        for _ in 0..steps {
            prop_assert!(control.undo());
        }
        prop_assert_eq!(control.get_value(), "");
        prop_assert!(!control.undo());

        for _ in 0..steps {
            prop_assert!(control.redo());
        }
        prop_assert_eq!(control.get_value(), final_text);
    }

    #[test]
    fn undo_redo_is_identity(ops in prop::collection::vec(op_strategy(), 1..12)) {
        let mut control = control("seed\ntext\n");
        for op in &ops {
            apply(&mut control, op);
            let text = control.get_value();
            if control.undo() {
                control.redo();
            }
            prop_assert_eq!(control.get_value(), text);
        }
    }

    #[test]
    fn clear_history_then_undo_keeps_content(ops in prop::collection::vec(op_strategy(), 1..12)) {
        let mut control = control("");
        for op in &ops {
            apply(&mut control, op);
        }
        let text = control.get_value();
        control.clear_history();
        prop_assert!(!control.undo());
        prop_assert_eq!(control.get_value(), text);
    }
}
