//! weft-editor-core: the editor control, without any framework dependencies.
//!
//! This crate provides:
//! - `TextBuffer` trait for text storage abstraction
//! - `EditorRope` - ropey-backed implementation
//! - `UndoableBuffer<T>` - history with transactions and `clear_history`
//! - `CommandRegistry`, `KeymapStack`, `ExtensionSet`
//! - `EditorControl` - the addressable editor object tying them together

pub mod actions;
pub mod command;
pub mod commands;
pub mod control;
pub mod error;
pub mod event;
pub mod extension;
pub mod keymap;
pub mod state;
pub mod text;
pub mod types;
pub mod undo;

pub use actions::{Key, KeyCombo, KeydownResult, Modifiers};
pub use command::{CommandArgs, CommandHandler, CommandRegistry, CommandResult};
pub use commands::{DropItems, EditorCommandType};
pub use control::{EditorControl, EventSink, LogSink, default_keymap};
pub use error::EditorError;
pub use event::EditorEvent;
pub use extension::{EditorUpdate, Extension, ExtensionSet, UpdateOrigin};
pub use keymap::{BindingRun, KeyBinding, KeymapHandle, KeymapStack, LayerId};
pub use smol_str::SmolStr;
pub use state::EditorState;
pub use text::{EditorRope, TextBuffer};
pub use types::{Position, Selection};
pub use undo::{Change, UndoManager, UndoableBuffer};
pub use weft_common::EditorConfig;
