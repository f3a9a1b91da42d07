//! The editor control: one addressable object wrapping state, commands,
//! keymaps and extensions.

use serde_json::Value;
use smol_str::SmolStr;
use weft_common::EditorConfig;

use crate::actions::{Key, KeyCombo, KeydownResult};
use crate::command::{CommandArgs, CommandHandler, CommandRegistry, CommandResult};
use crate::commands::{EditorCommandType, register_builtins};
use crate::error::EditorError;
use crate::event::EditorEvent;
use crate::extension::{EditorUpdate, Extension, ExtensionSet, UpdateOrigin};
use crate::keymap::{BindingRun, KeyBinding, KeymapHandle, KeymapStack, LayerId};
use crate::state::EditorState;
use crate::types::{Position, Selection};

/// Receives editor events after each operation.
pub type EventSink = Box<dyn FnMut(EditorEvent) + Send>;

/// Receives log messages produced by the editor.
pub type LogSink = Box<dyn FnMut(String) + Send>;

/// Default bindings, consulted after every prepended layer.
pub fn default_keymap(is_mac: bool) -> Vec<KeyBinding> {
    let primary = |c: &str| KeyCombo::primary(Key::character(c), is_mac);
    let primary_shift = |c: &str| KeyCombo::primary_shift(Key::character(c), is_mac);
    vec![
        KeyBinding::command(primary("z"), EditorCommandType::Undo),
        KeyBinding::command(primary("y"), EditorCommandType::Redo),
        KeyBinding::command(primary_shift("z"), EditorCommandType::Redo),
        KeyBinding::command(primary("a"), EditorCommandType::SelectAll),
        KeyBinding::command(primary("/"), EditorCommandType::ToggleComment),
        KeyBinding::command(primary_shift("k"), EditorCommandType::DeleteLine),
        KeyBinding::command(primary("d"), EditorCommandType::SelectLine),
    ]
}

pub struct EditorControl {
    state: EditorState,
    commands: CommandRegistry,
    keymaps: KeymapStack,
    extensions: ExtensionSet,
    events: Option<EventSink>,
    log: Option<LogSink>,
    last_selection: Selection,
    last_depths: (usize, usize),
}

impl EditorControl {
    pub fn new(text: &str, settings: EditorConfig) -> Self {
        let keymaps = KeymapStack::new(default_keymap(settings.mac_keymap));
        let mut commands = CommandRegistry::new();
        register_builtins(&mut commands);
        Self {
            state: EditorState::new(text, settings),
            commands,
            keymaps,
            extensions: ExtensionSet::new(),
            events: None,
            log: None,
            last_selection: Selection::default(),
            last_depths: (0, 0),
        }
    }

    /// Route editor events to `sink`, replacing any previous sink.
    pub fn on_event(&mut self, sink: impl FnMut(EditorEvent) + Send + 'static) {
        self.events = Some(Box::new(sink));
    }

    /// Route editor log messages to `sink`, replacing any previous sink.
    pub fn on_log(&mut self, sink: impl FnMut(String) + Send + 'static) {
        self.log = Some(Box::new(sink));
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn keymaps(&self) -> &KeymapStack {
        &self.keymaps
    }

    // === Content ===

    /// Replace the selection with `text` as one undoable step.
    pub fn insert_text(&mut self, text: &str) {
        self.state.replace_selection(text);
        self.flush(UpdateOrigin::Api);
    }

    pub fn get_value(&self) -> String {
        self.state.value()
    }

    /// Replace the document. History is cleared.
    pub fn set_value(&mut self, text: &str) {
        self.state.set_value(text);
        self.flush(UpdateOrigin::Api);
    }

    // === Commands ===

    /// Run a command by name. `Value::Null` means no arguments.
    pub fn exec_command(&mut self, name: &str, args: CommandArgs) -> CommandResult {
        let handler = self
            .commands
            .get(name)
            .ok_or_else(|| EditorError::UnknownCommand(SmolStr::new(name)))?;
        let result = handler(&mut self.state, args);
        if let Err(e) = &result {
            tracing::debug!(command = name, error = %e, "command failed");
        }
        self.flush(UpdateOrigin::Command);
        result
    }

    /// Register a command, replacing any handler with the same name.
    pub fn register_command<F>(&mut self, name: impl Into<SmolStr>, handler: F) -> Option<CommandHandler>
    where
        F: Fn(&mut EditorState, CommandArgs) -> CommandResult + Send + Sync + 'static,
    {
        self.commands.register(name, handler)
    }

    /// Register a command, failing if the name is already taken.
    pub fn try_register_command<F>(&mut self, name: impl Into<SmolStr>, handler: F) -> Result<(), EditorError>
    where
        F: Fn(&mut EditorState, CommandArgs) -> CommandResult + Send + Sync + 'static,
    {
        self.commands.try_register(name, handler)
    }

    pub fn supports_command(&self, name: &str) -> bool {
        self.commands.contains(name)
    }

    // === Extensions & keymaps ===

    pub fn add_extension(&mut self, extension: impl Extension + 'static) {
        self.extensions.push(extension);
    }

    /// Add a keymap layer in front of all existing bindings.
    pub fn prepend_keymap(&mut self, bindings: Vec<KeyBinding>) -> KeymapHandle {
        self.keymaps.prepend(bindings)
    }

    pub fn remove_keymap(&mut self, id: LayerId) -> bool {
        self.keymaps.remove(id)
    }

    /// Dispatch a key press through the keymap stack.
    ///
    /// Bindings for the chord are tried newest first. A handler returning
    /// `false`, a command returning `false`, or a binding naming an
    /// unregistered command lets the next binding run. At most one binding
    /// consumes the event.
    pub fn handle_key(&mut self, chord: &KeyCombo) -> KeydownResult {
        let mut handled = false;
        for run in self.keymaps.resolve(chord) {
            handled = match run {
                BindingRun::Handler(handler) => handler(&mut self.state),
                BindingRun::Command { name, args } => {
                    let Some(handler) = self.commands.get(&name) else {
                        tracing::trace!(command = %name, "binding names unknown command");
                        continue;
                    };
                    match handler(&mut self.state, args) {
                        Ok(Value::Bool(false)) => false,
                        Ok(_) => true,
                        Err(e) => {
                            self.log_message(format!("{chord}: {name} failed: {e}"));
                            true
                        }
                    }
                }
            };
            if handled {
                break;
            }
        }
        self.flush(UpdateOrigin::Command);

        if handled {
            KeydownResult::Handled
        } else if chord.key.is_navigation() {
            KeydownResult::PassThrough
        } else {
            KeydownResult::NotHandled
        }
    }

    // === History ===

    pub fn undo(&mut self) -> bool {
        let applied = self.state.undo();
        self.flush(UpdateOrigin::Undo);
        applied
    }

    pub fn redo(&mut self) -> bool {
        let applied = self.state.redo();
        self.flush(UpdateOrigin::Redo);
        applied
    }

    /// Forget undo and redo history. Content is unchanged.
    pub fn clear_history(&mut self) {
        self.state.clear_history();
        self.flush(UpdateOrigin::Api);
    }

    // === Selection ===

    pub fn selection(&self) -> Selection {
        self.state.selection()
    }

    /// Select from `anchor` to `head` (char offsets, clamped).
    pub fn select(&mut self, anchor: usize, head: usize) {
        self.state.set_selection(Selection::new(anchor, head));
        self.flush(UpdateOrigin::Api);
    }

    /// Move the cursor to a zero-based line and column, clamped to the document.
    pub fn set_cursor(&mut self, line: usize, col: usize) {
        let offset = self.state.offset_of(Position::new(line, col));
        self.state.set_selection(Selection::collapsed(offset));
        self.flush(UpdateOrigin::Api);
    }

    /// Line and column of the selection head.
    pub fn cursor(&self) -> Position {
        self.state.position_of(self.state.selection().head)
    }

    pub fn log_message(&mut self, message: String) {
        tracing::debug!(target: "weft::editor", "{message}");
        if let Some(log) = &mut self.log {
            log(message);
        }
    }

    /// Deliver pending changes to extensions and report events.
    fn flush(&mut self, origin: UpdateOrigin) {
        let changes = self.state.take_changes();
        let selection = self.state.selection();
        let depths = (self.state.undo_depth(), self.state.redo_depth());

        if !changes.is_empty() || selection != self.last_selection {
            self.extensions.notify(&EditorUpdate {
                changes: &changes,
                doc: self.state.doc(),
                selection,
                origin,
            });
        }

        if let Some(sink) = &mut self.events {
            if !changes.is_empty() {
                sink(EditorEvent::Change {
                    value: self.state.value(),
                });
            }
            if selection != self.last_selection {
                sink(EditorEvent::SelectionChange {
                    anchor: selection.anchor,
                    head: selection.head,
                });
            }
            if depths != self.last_depths {
                sink(EditorEvent::UndoRedoDepthChange {
                    undo_depth: depths.0,
                    redo_depth: depths.1,
                });
            }
        }

        self.last_selection = selection;
        self.last_depths = depths;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn control(text: &str) -> EditorControl {
        let settings = EditorConfig {
            mac_keymap: false,
            ..EditorConfig::default()
        };
        EditorControl::new(text, settings)
    }

    #[test]
    fn test_clear_history() {
        let mut c = control("");
        let inserted = "Testing... This is a test...";
        c.insert_text(inserted);
        assert_eq!(c.get_value(), inserted);

        c.undo();
        assert_eq!(c.get_value(), "");

        c.redo();
        c.clear_history();
        assert_eq!(c.get_value(), inserted);

        // Cleared changes can't be undone.
        c.undo();
        assert_eq!(c.get_value(), inserted);

        c.insert_text("!!!");
        assert_eq!(c.get_value(), format!("{inserted}!!!"));
        c.undo();
        assert_eq!(c.get_value(), inserted);
    }

    #[test]
    fn test_extension_sees_updates() {
        let mut c = control("");
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        c.add_extension(move |update: &EditorUpdate<'_>| {
            if update.doc_changed() {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        });

        c.insert_text("Test...");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        c.undo();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_custom_command() {
        let mut c = control("");
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        c.register_command("myTestCommand", move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(json!("test"))
        });

        assert!(c.supports_command("myTestCommand"));
        assert_eq!(c.exec_command("myTestCommand", Value::Null).unwrap(), json!("test"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unknown_command() {
        let mut c = control("");
        assert!(!c.supports_command("nope"));
        let err = c.exec_command("nope", Value::Null).unwrap_err();
        assert!(matches!(err, EditorError::UnknownCommand(name) if name == "nope"));
    }

    #[test]
    fn test_override_default_keybinding() {
        let mut c = control("test");
        c.exec_command("selectAll", Value::Null).unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let ctrl_d = KeyCombo::parse("Ctrl-d", false).unwrap();
        let layer = c.prepend_keymap(vec![KeyBinding::handler(ctrl_d.clone(), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        })]);

        assert_eq!(c.handle_key(&ctrl_d), KeydownResult::Handled);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(layer.remove());
        assert_eq!(c.handle_key(&ctrl_d), KeydownResult::Handled);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // Default Mod-d selected the line.
        assert_eq!(c.selection(), Selection::new(0, 4));

        assert!(!layer.remove());
    }

    #[test]
    fn test_handler_returning_false_falls_through() {
        let mut c = control("ab");
        let ctrl_a = KeyCombo::parse("Ctrl-a", false).unwrap();
        c.prepend_keymap(vec![KeyBinding::handler(ctrl_a.clone(), |_| false)]);
        c.prepend_keymap(vec![KeyBinding::command(ctrl_a.clone(), "notRegistered")]);

        assert_eq!(c.handle_key(&ctrl_a), KeydownResult::Handled);
        assert_eq!(c.selection(), Selection::new(0, 2));
    }

    #[test]
    fn test_unbound_keys() {
        let mut c = control("");
        assert_eq!(c.handle_key(&KeyCombo::new(Key::ArrowUp)), KeydownResult::PassThrough);
        assert_eq!(
            c.handle_key(&KeyCombo::new(Key::character("q"))),
            KeydownResult::NotHandled
        );
        // Nothing to undo: the command reports false and nothing consumes the key.
        assert_eq!(
            c.handle_key(&KeyCombo::parse("Mod-z", false).unwrap()),
            KeydownResult::NotHandled
        );
    }

    #[test]
    fn test_toggle_comment() {
        let mut c = control("Hello\nWorld\n");
        c.select(1, 5);

        c.exec_command("toggleComment", Value::Null).unwrap();
        assert_eq!(c.get_value(), "<!-- Hello -->\nWorld\n");

        c.exec_command("toggleComment", Value::Null).unwrap();
        assert_eq!(c.get_value(), "Hello\nWorld\n");
    }

    #[test]
    fn test_delete_line() {
        let mut c = control("Hello\nWorld\n");
        c.set_cursor(1, 0);
        assert_eq!(c.cursor(), Position::new(1, 0));

        c.exec_command("deleteLine", Value::Null).unwrap();
        assert_eq!(c.get_value(), "Hello\n");
    }

    #[test]
    fn test_events_reported() {
        let mut c = control("");
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        c.on_event(move |event| sink.lock().unwrap().push(event));

        c.insert_text("hi");
        assert_eq!(
            *events.lock().unwrap(),
            vec![
                EditorEvent::Change { value: "hi".into() },
                EditorEvent::SelectionChange { anchor: 2, head: 2 },
                EditorEvent::UndoRedoDepthChange {
                    undo_depth: 1,
                    redo_depth: 0
                },
            ]
        );

        events.lock().unwrap().clear();
        c.clear_history();
        assert_eq!(
            *events.lock().unwrap(),
            vec![EditorEvent::UndoRedoDepthChange {
                undo_depth: 0,
                redo_depth: 0
            }]
        );
    }

    #[test]
    fn test_failed_key_command_is_logged() {
        let mut c = control("");
        let logs = Arc::new(Mutex::new(Vec::new()));
        let sink = logs.clone();
        c.on_log(move |line| sink.lock().unwrap().push(line));
        c.register_command("boom", |_, _| {
            Err(EditorError::CommandFailed {
                command: "boom".into(),
                message: "nope".into(),
            })
        });
        let chord = KeyCombo::parse("Ctrl-b", false).unwrap();
        c.prepend_keymap(vec![KeyBinding::command(chord.clone(), "boom")]);

        assert_eq!(c.handle_key(&chord), KeydownResult::Handled);
        assert_eq!(logs.lock().unwrap().len(), 1);
    }
}
