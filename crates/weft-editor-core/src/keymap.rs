//! Layered key bindings.
//!
//! A [`KeymapStack`] holds default bindings plus any number of override layers.
//! Layers are consulted newest first, defaults last. Each prepended layer is
//! removed through its own [`KeymapHandle`], by identity.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use serde_json::Value;
use smol_str::SmolStr;

use crate::actions::KeyCombo;
use crate::error::EditorError;
use crate::state::EditorState;

/// Handler bound directly to a key. Returning `false` lets the next binding run.
pub type KeyHandler = Arc<dyn Fn(&mut EditorState) -> bool + Send + Sync>;

/// What a binding does when its chord is pressed.
#[derive(Clone)]
pub enum BindingRun {
    /// Execute a registered command.
    Command { name: SmolStr, args: Value },
    Handler(KeyHandler),
}

impl fmt::Debug for BindingRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command { name, args } => f
                .debug_struct("Command")
                .field("name", name)
                .field("args", args)
                .finish(),
            Self::Handler(_) => f.write_str("Handler(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct KeyBinding {
    pub chord: KeyCombo,
    pub run: BindingRun,
}

impl KeyBinding {
    pub fn command(chord: KeyCombo, name: impl Into<SmolStr>) -> Self {
        Self {
            chord,
            run: BindingRun::Command {
                name: name.into(),
                args: Value::Null,
            },
        }
    }

    pub fn handler<F>(chord: KeyCombo, handler: F) -> Self
    where
        F: Fn(&mut EditorState) -> bool + Send + Sync + 'static,
    {
        Self {
            chord,
            run: BindingRun::Handler(Arc::new(handler)),
        }
    }

    /// Bind a chord string such as `Mod-Shift-z` to a command.
    pub fn parse(chord: &str, command: impl Into<SmolStr>, is_mac: bool) -> Result<Self, EditorError> {
        Ok(Self::command(KeyCombo::parse(chord, is_mac)?, command))
    }

    pub fn with_args(mut self, args: Value) -> Self {
        if let BindingRun::Command { args: slot, .. } = &mut self.run {
            *slot = args;
        }
        self
    }
}

/// Identifier of a prepended layer.
pub type LayerId = u64;

#[derive(Debug)]
struct Layer {
    id: LayerId,
    bindings: Vec<KeyBinding>,
}

#[derive(Debug, Default)]
struct Layers {
    next_id: LayerId,
    /// Newest first.
    stack: Vec<Layer>,
}

/// Ordered override layers on top of default bindings.
#[derive(Debug, Default)]
pub struct KeymapStack {
    layers: Arc<Mutex<Layers>>,
    defaults: Vec<KeyBinding>,
}

impl KeymapStack {
    pub fn new(defaults: Vec<KeyBinding>) -> Self {
        Self {
            layers: Arc::default(),
            defaults,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Layers> {
        self.layers.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Push a layer to the front. Its bindings take priority over everything already present.
    pub fn prepend(&self, bindings: Vec<KeyBinding>) -> KeymapHandle {
        let mut layers = self.lock();
        layers.next_id += 1;
        let id = layers.next_id;
        layers.stack.insert(0, Layer { id, bindings });
        tracing::debug!(layer = id, depth = layers.stack.len(), "keymap layer prepended");
        KeymapHandle {
            id,
            layers: Arc::downgrade(&self.layers),
        }
    }

    /// Remove a layer by id. Returns false if it was already gone.
    pub fn remove(&self, id: LayerId) -> bool {
        remove_layer(&mut self.lock(), id)
    }

    pub fn layer_count(&self) -> usize {
        self.lock().stack.len()
    }

    /// All bindings for `chord`, in the order they should be tried.
    pub fn resolve(&self, chord: &KeyCombo) -> Vec<BindingRun> {
        let layers = self.lock();
        layers
            .stack
            .iter()
            .flat_map(|layer| layer.bindings.iter())
            .chain(self.defaults.iter())
            .filter(|binding| &binding.chord == chord)
            .map(|binding| binding.run.clone())
            .collect()
    }
}

fn remove_layer(layers: &mut Layers, id: LayerId) -> bool {
    let before = layers.stack.len();
    layers.stack.retain(|layer| layer.id != id);
    let removed = layers.stack.len() != before;
    if removed {
        tracing::debug!(layer = id, "keymap layer removed");
    }
    removed
}

/// Removal capability for one prepended layer.
///
/// Dropping the handle leaves the layer in place.
#[derive(Debug, Clone)]
pub struct KeymapHandle {
    id: LayerId,
    layers: Weak<Mutex<Layers>>,
}

impl KeymapHandle {
    pub fn id(&self) -> LayerId {
        self.id
    }

    /// Remove exactly this layer. Later calls are no-ops.
    pub fn remove(&self) -> bool {
        match self.layers.upgrade() {
            Some(layers) => {
                let mut layers = layers.lock().unwrap_or_else(|e| e.into_inner());
                remove_layer(&mut layers, self.id)
            }
            None => false,
        }
    }
}
