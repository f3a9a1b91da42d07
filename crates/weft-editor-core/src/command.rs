//! Name to handler mapping for editor commands.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use smol_str::SmolStr;

use crate::error::EditorError;
use crate::state::EditorState;

/// Command arguments. `Value::Null` means no arguments.
pub type CommandArgs = Value;

/// Command result. Handlers with nothing to return yield `Value::Null`.
pub type CommandResult = Result<Value, EditorError>;

/// A registered command handler.
pub type CommandHandler = Arc<dyn Fn(&mut EditorState, CommandArgs) -> CommandResult + Send + Sync>;

/// Registry of named commands.
///
/// Names are unique; registering an existing name replaces the handler.
#[derive(Clone, Default)]
pub struct CommandRegistry {
    handlers: BTreeMap<SmolStr, CommandHandler>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a handler under `name`, returning the handler it replaced.
    pub fn register<F>(&mut self, name: impl Into<SmolStr>, handler: F) -> Option<CommandHandler>
    where
        F: Fn(&mut EditorState, CommandArgs) -> CommandResult + Send + Sync + 'static,
    {
        let name = name.into();
        let previous = self.handlers.insert(name.clone(), Arc::new(handler));
        if previous.is_some() {
            tracing::debug!(command = %name, "command handler replaced");
        }
        previous
    }

    /// Like [`register`](Self::register) but refuses to replace an existing handler.
    pub fn try_register<F>(&mut self, name: impl Into<SmolStr>, handler: F) -> Result<(), EditorError>
    where
        F: Fn(&mut EditorState, CommandArgs) -> CommandResult + Send + Sync + 'static,
    {
        let name = name.into();
        if self.handlers.contains_key(&name) {
            return Err(EditorError::DuplicateCommand(name));
        }
        self.handlers.insert(name, Arc::new(handler));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<CommandHandler> {
        self.handlers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(SmolStr::as_str)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}
