//! Undo/redo management for editor operations.
//!
//! Provides:
//! - `UndoManager` trait for abstracting undo implementations
//! - `UndoableBuffer<T>` - wraps a TextBuffer and provides undo/redo
//!
//! Edits are grouped into `HistoryEntry` values. A plain `insert`/`delete`
//! outside a transaction becomes its own entry; everything between
//! `begin_transaction` and `commit_transaction` is coalesced into one.

use std::ops::Range;

use smol_str::{SmolStr, ToSmolStr};

use crate::text::TextBuffer;
use crate::types::Selection;

/// Trait for managing undo/redo operations.
///
/// Implementations must actually perform the undo/redo, not just track state.
pub trait UndoManager {
    /// Check if undo is available.
    fn can_undo(&self) -> bool;

    /// Check if redo is available.
    fn can_redo(&self) -> bool;

    /// Perform undo. Returns the selection to restore, or None if there was nothing to undo.
    fn undo(&mut self) -> Option<Selection>;

    /// Perform redo. Returns the selection to restore, or None if there was nothing to redo.
    fn redo(&mut self) -> Option<Selection>;

    /// Clear all undo/redo history. Content is left untouched.
    fn clear_history(&mut self);

    /// Number of entries that can be undone.
    fn undo_depth(&self) -> usize;

    /// Number of entries that can be redone.
    fn redo_depth(&self) -> usize;
}

/// A recorded primitive edit.
#[derive(Debug, Clone, PartialEq, Eq)]
struct EditOperation {
    /// Character position where edit occurred
    pos: usize,
    /// Text that was deleted (empty for pure insertions)
    deleted: SmolStr,
    /// Text that was inserted (empty for pure deletions)
    inserted: SmolStr,
}

/// One undoable step: the primitive edits it is made of, in application order,
/// plus the selection on either side of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    ops: Vec<EditOperation>,
    selection_before: Selection,
    selection_after: Selection,
}

impl HistoryEntry {
    /// Number of primitive edits coalesced into this entry.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// A content change as seen by observers: `deleted` chars removed at `pos`,
/// then `inserted` chars inserted at `pos`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change {
    pub pos: usize,
    pub deleted: usize,
    pub inserted: usize,
}

struct OpenTransaction {
    depth: usize,
    ops: Vec<EditOperation>,
    selection_before: Selection,
}

/// A TextBuffer wrapper that tracks edits and provides undo/redo.
///
/// All mutations go through this wrapper, which records them for undo and
/// keeps a log of changes for observers (drained with `take_changes`).
pub struct UndoableBuffer<T> {
    buffer: T,
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    max_steps: usize,
    open: Option<OpenTransaction>,
    changes: Vec<Change>,
}

impl<T: TextBuffer + Default> Default for UndoableBuffer<T> {
    fn default() -> Self {
        Self::new(T::default(), 100)
    }
}

impl<T: TextBuffer> UndoableBuffer<T> {
    /// Create a new undoable buffer wrapping the given buffer.
    pub fn new(buffer: T, max_steps: usize) -> Self {
        Self {
            buffer,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_steps: max_steps.max(1),
            open: None,
            changes: Vec::new(),
        }
    }

    /// Get a reference to the inner buffer.
    pub fn inner(&self) -> &T {
        &self.buffer
    }

    /// Replace the whole content without recording history, and forget all history.
    pub fn reset(&mut self, buffer: T) {
        let old_len = self.buffer.len_chars();
        self.buffer = buffer;
        self.changes.push(Change {
            pos: 0,
            deleted: old_len,
            inserted: self.buffer.len_chars(),
        });
        self.open = None;
        self.clear_history();
    }

    /// Start coalescing edits into one entry. Transactions nest; only the
    /// outermost commit produces an entry.
    pub fn begin_transaction(&mut self, selection_before: Selection) {
        match &mut self.open {
            Some(tx) => tx.depth += 1,
            None => {
                self.open = Some(OpenTransaction {
                    depth: 1,
                    ops: Vec::new(),
                    selection_before,
                })
            }
        }
    }

    /// Close the innermost transaction. Returns true if an entry was recorded.
    pub fn commit_transaction(&mut self, selection_after: Selection) -> bool {
        let Some(tx) = &mut self.open else {
            return false;
        };
        tx.depth -= 1;
        if tx.depth > 0 {
            return false;
        }
        let Some(tx) = self.open.take() else {
            return false;
        };
        if tx.ops.is_empty() {
            return false;
        }
        self.push_entry(HistoryEntry {
            ops: tx.ops,
            selection_before: tx.selection_before,
            selection_after,
        });
        true
    }

    /// Drain the changes applied since the last call.
    pub fn take_changes(&mut self) -> Vec<Change> {
        std::mem::take(&mut self.changes)
    }

    /// Record an operation (called internally by TextBuffer impl).
    fn record_op(&mut self, op: EditOperation) {
        match &mut self.open {
            Some(tx) => {
                if tx.ops.is_empty() {
                    // First edit of the transaction branches history.
                    self.redo_stack.clear();
                }
                tx.ops.push(op);
            }
            None => {
                let before = Selection::collapsed(op.pos + op.deleted.chars().count());
                let after = Selection::collapsed(op.pos + op.inserted.chars().count());
                self.push_entry(HistoryEntry {
                    ops: vec![op],
                    selection_before: before,
                    selection_after: after,
                });
            }
        }
    }

    fn push_entry(&mut self, entry: HistoryEntry) {
        // Clear redo stack on new edit
        self.redo_stack.clear();
        self.undo_stack.push(entry);

        // Trim if over max
        while self.undo_stack.len() > self.max_steps {
            self.undo_stack.remove(0);
        }
    }

    fn apply_raw(&mut self, pos: usize, remove: &str, insert: &str) {
        let remove_chars = remove.chars().count();
        if remove_chars > 0 {
            self.buffer.delete(pos..pos + remove_chars);
        }
        if !insert.is_empty() {
            self.buffer.insert(pos, insert);
        }
        self.changes.push(Change {
            pos,
            deleted: remove_chars,
            inserted: insert.chars().count(),
        });
    }
}

// Implement TextBuffer by delegating to inner buffer + recording operations
impl<T: TextBuffer> TextBuffer for UndoableBuffer<T> {
    fn len_bytes(&self) -> usize {
        self.buffer.len_bytes()
    }

    fn len_chars(&self) -> usize {
        self.buffer.len_chars()
    }

    fn insert(&mut self, char_offset: usize, text: &str) {
        if text.is_empty() {
            return;
        }
        self.record_op(EditOperation {
            pos: char_offset,
            deleted: SmolStr::default(),
            inserted: text.to_smolstr(),
        });
        self.apply_raw(char_offset, "", text);
    }

    fn delete(&mut self, char_range: Range<usize>) {
        if char_range.is_empty() {
            return;
        }
        // Get the text being deleted for undo
        let deleted = self.buffer.slice(char_range.clone()).unwrap_or_default();
        self.record_op(EditOperation {
            pos: char_range.start,
            deleted: deleted.clone(),
            inserted: SmolStr::default(),
        });
        self.apply_raw(char_range.start, &deleted, "");
    }

    fn slice(&self, char_range: Range<usize>) -> Option<SmolStr> {
        self.buffer.slice(char_range)
    }

    fn char_at(&self, char_offset: usize) -> Option<char> {
        self.buffer.char_at(char_offset)
    }

    fn to_string(&self) -> String {
        self.buffer.to_string()
    }

    fn char_to_byte(&self, char_offset: usize) -> usize {
        self.buffer.char_to_byte(char_offset)
    }

    fn byte_to_char(&self, byte_offset: usize) -> usize {
        self.buffer.byte_to_char(byte_offset)
    }

    fn len_lines(&self) -> usize {
        self.buffer.len_lines()
    }

    fn line_to_char(&self, line: usize) -> usize {
        self.buffer.line_to_char(line)
    }

    fn char_to_line(&self, char_offset: usize) -> usize {
        self.buffer.char_to_line(char_offset)
    }
}

impl<T: TextBuffer> UndoManager for UndoableBuffer<T> {
    fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    fn undo(&mut self) -> Option<Selection> {
        let entry = self.undo_stack.pop()?;

        // Apply inverses in reverse order: delete what was inserted, insert what was deleted
        for op in entry.ops.iter().rev() {
            self.apply_raw(op.pos, &op.inserted, &op.deleted);
        }

        let selection = entry.selection_before;
        self.redo_stack.push(entry);
        Some(selection)
    }

    fn redo(&mut self) -> Option<Selection> {
        let entry = self.redo_stack.pop()?;

        // Re-apply original: delete what was deleted, insert what was inserted
        for op in &entry.ops {
            self.apply_raw(op.pos, &op.deleted, &op.inserted);
        }

        let selection = entry.selection_after;
        self.undo_stack.push(entry);
        Some(selection)
    }

    fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        if let Some(tx) = &mut self.open {
            tx.ops.clear();
        }
    }

    fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EditorRope;

    #[test]
    fn test_undoable_buffer_insert_undo() {
        let rope = EditorRope::from_str("hello");
        let mut buf = UndoableBuffer::new(rope, 100);

        assert_eq!(buf.to_string(), "hello");
        assert!(!buf.can_undo());

        buf.insert(5, " world");
        assert_eq!(buf.to_string(), "hello world");
        assert!(buf.can_undo());

        assert!(buf.undo().is_some());
        assert_eq!(buf.to_string(), "hello");
        assert!(!buf.can_undo());
        assert!(buf.can_redo());

        assert!(buf.redo().is_some());
        assert_eq!(buf.to_string(), "hello world");
        assert!(buf.can_undo());
        assert!(!buf.can_redo());
    }

    #[test]
    fn test_undoable_buffer_delete_undo() {
        let rope = EditorRope::from_str("hello world");
        let mut buf = UndoableBuffer::new(rope, 100);

        buf.delete(5..11);
        assert_eq!(buf.to_string(), "hello");

        assert!(buf.undo().is_some());
        assert_eq!(buf.to_string(), "hello world");
    }

    #[test]
    fn test_transaction_coalesces_into_one_entry() {
        let rope = EditorRope::from_str("hello world");
        let mut buf = UndoableBuffer::new(rope, 100);

        buf.begin_transaction(Selection::new(6, 11));
        buf.delete(6..11);
        buf.insert(6, "rust");
        assert!(buf.commit_transaction(Selection::collapsed(10)));
        assert_eq!(buf.to_string(), "hello rust");
        assert_eq!(buf.undo_depth(), 1);

        assert_eq!(buf.undo(), Some(Selection::new(6, 11)));
        assert_eq!(buf.to_string(), "hello world");
        assert_eq!(buf.redo(), Some(Selection::collapsed(10)));
        assert_eq!(buf.to_string(), "hello rust");
    }

    #[test]
    fn test_nested_transaction_commits_once() {
        let mut buf = UndoableBuffer::new(EditorRope::new(), 100);

        buf.begin_transaction(Selection::default());
        buf.insert(0, "a");
        buf.begin_transaction(Selection::default());
        buf.insert(1, "b");
        assert!(!buf.commit_transaction(Selection::collapsed(2)));
        buf.insert(2, "c");
        assert!(buf.commit_transaction(Selection::collapsed(3)));

        assert_eq!(buf.undo_depth(), 1);
        buf.undo();
        assert_eq!(buf.to_string(), "");
    }

    #[test]
    fn test_empty_transaction_keeps_redo() {
        let mut buf = UndoableBuffer::new(EditorRope::new(), 100);
        buf.insert(0, "x");
        buf.undo();

        buf.begin_transaction(Selection::default());
        assert!(!buf.commit_transaction(Selection::default()));
        assert!(buf.can_redo());
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let rope = EditorRope::from_str("abc");
        let mut buf = UndoableBuffer::new(rope, 100);

        buf.insert(3, "d");
        assert!(buf.undo().is_some());
        assert!(buf.can_redo());

        buf.insert(3, "e");
        assert!(!buf.can_redo());
    }

    #[test]
    fn test_clear_history_keeps_content() {
        let mut buf = UndoableBuffer::new(EditorRope::new(), 100);
        buf.insert(0, "Testing...");
        buf.clear_history();

        assert_eq!(buf.undo(), None);
        assert_eq!(buf.to_string(), "Testing...");

        buf.insert(10, "!!!");
        buf.undo();
        assert_eq!(buf.to_string(), "Testing...");
    }

    #[test]
    fn test_max_steps() {
        let mut buf = UndoableBuffer::new(EditorRope::new(), 3);

        buf.insert(0, "a");
        buf.insert(1, "b");
        buf.insert(2, "c");
        buf.insert(3, "d"); // should evict "a"

        assert_eq!(buf.to_string(), "abcd");

        assert!(buf.undo().is_some()); // removes d
        assert!(buf.undo().is_some()); // removes c
        assert!(buf.undo().is_some()); // removes b
        assert!(buf.undo().is_none()); // a was evicted

        assert_eq!(buf.to_string(), "a");
    }

    #[test]
    fn test_changes_are_logged_for_undo_too() {
        let mut buf = UndoableBuffer::new(EditorRope::new(), 10);
        buf.insert(0, "ab");
        assert_eq!(
            buf.take_changes(),
            vec![Change {
                pos: 0,
                deleted: 0,
                inserted: 2
            }]
        );
        buf.undo();
        assert_eq!(
            buf.take_changes(),
            vec![Change {
                pos: 0,
                deleted: 2,
                inserted: 0
            }]
        );
        assert!(buf.take_changes().is_empty());
    }
}
