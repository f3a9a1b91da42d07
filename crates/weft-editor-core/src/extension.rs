//! Extensions observing the live document.

use std::fmt;

use crate::text::EditorRope;
use crate::types::Selection;
use crate::undo::Change;

/// What caused an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOrigin {
    /// `insertText` / `setValue` or another direct API call.
    Api,
    /// A command run through `execCommand` or a key binding.
    Command,
    Undo,
    Redo,
}

/// One batch of changes delivered to extensions after an operation completes.
#[derive(Debug)]
pub struct EditorUpdate<'a> {
    /// Changes in application order. Empty for selection-only updates.
    pub changes: &'a [Change],
    /// Document after the changes.
    pub doc: &'a EditorRope,
    pub selection: Selection,
    pub origin: UpdateOrigin,
}

impl EditorUpdate<'_> {
    pub fn doc_changed(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// An opaque behaviour attached to the editor.
///
/// Closures taking `&EditorUpdate` implement this directly.
pub trait Extension: Send {
    fn update(&mut self, update: &EditorUpdate<'_>);
}

impl<F> Extension for F
where
    F: FnMut(&EditorUpdate<'_>) + Send,
{
    fn update(&mut self, update: &EditorUpdate<'_>) {
        self(update)
    }
}

/// Append-only, ordered set of extensions.
#[derive(Default)]
pub struct ExtensionSet {
    extensions: Vec<Box<dyn Extension>>,
}

impl ExtensionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, extension: impl Extension + 'static) {
        self.extensions.push(Box::new(extension));
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Deliver an update to every extension, oldest first.
    pub fn notify(&mut self, update: &EditorUpdate<'_>) {
        for extension in &mut self.extensions {
            extension.update(update);
        }
    }
}

impl fmt::Debug for ExtensionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionSet")
            .field("len", &self.extensions.len())
            .finish()
    }
}
