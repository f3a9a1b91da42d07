//! Editor state: document, selection and history.
//!
//! `EditorState` is what command handlers operate on. Every content mutation
//! goes through the history-tracking buffer, and the selection is kept inside
//! the document bounds.

use std::ops::Range;

use smol_str::SmolStr;
use weft_common::EditorConfig;

use crate::text::{EditorRope, TextBuffer};
use crate::types::{Position, Selection};
use crate::undo::{Change, UndoManager, UndoableBuffer};

pub struct EditorState {
    buffer: UndoableBuffer<EditorRope>,
    selection: Selection,
    settings: EditorConfig,
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new("", EditorConfig::default())
    }
}

impl EditorState {
    pub fn new(text: &str, settings: EditorConfig) -> Self {
        Self {
            buffer: UndoableBuffer::new(EditorRope::from_str(text), settings.history_depth),
            selection: Selection::default(),
            settings,
        }
    }

    pub fn settings(&self) -> &EditorConfig {
        &self.settings
    }

    pub fn doc(&self) -> &EditorRope {
        self.buffer.inner()
    }

    /// Full document text.
    pub fn value(&self) -> String {
        self.buffer.to_string()
    }

    pub fn len_chars(&self) -> usize {
        self.buffer.len_chars()
    }

    pub fn slice(&self, range: Range<usize>) -> Option<SmolStr> {
        self.buffer.slice(range)
    }

    pub fn char_at(&self, offset: usize) -> Option<char> {
        self.buffer.char_at(offset)
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Set the selection, clamped to the document.
    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection.clamp(self.len_chars());
    }

    pub fn selected_text(&self) -> SmolStr {
        self.buffer
            .slice(self.selection.to_range())
            .unwrap_or_default()
    }

    /// Run `f` as a single undoable step.
    ///
    /// All edits made inside are coalesced into one history entry, which
    /// restores the selection from before `f` on undo.
    pub fn transact<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.buffer.begin_transaction(self.selection);
        let result = f(self);
        self.buffer.commit_transaction(self.selection);
        result
    }

    /// Insert text at `offset`, shifting the selection to follow it.
    pub fn insert(&mut self, offset: usize, text: &str) {
        self.replace(offset..offset, text);
    }

    /// Delete a char range, shifting the selection to follow it.
    pub fn delete(&mut self, range: Range<usize>) {
        self.replace(range, "");
    }

    /// Replace a char range. Out-of-bounds ends are clamped.
    pub fn replace(&mut self, range: Range<usize>, text: &str) {
        let len = self.len_chars();
        let start = range.start.min(len);
        let end = range.end.clamp(start, len);
        if start == end && text.is_empty() {
            return;
        }
        let inserted = text.chars().count();

        self.buffer.begin_transaction(self.selection);
        self.buffer.delete(start..end);
        self.buffer.insert(start, text);
        self.selection = self.selection.map_edit(start..end, inserted);
        self.buffer.commit_transaction(self.selection);
    }

    /// Replace the selection with `text` and put the cursor after it.
    pub fn replace_selection(&mut self, text: &str) {
        let range = self.selection.to_range();
        self.transact(|state| {
            state.replace(range.clone(), text);
            state.selection = Selection::collapsed(range.start + text.chars().count());
        });
    }

    /// Replace the whole document and forget history.
    pub fn set_value(&mut self, text: &str) {
        self.buffer.reset(EditorRope::from_str(text));
        self.selection = Selection::default();
    }

    pub fn undo(&mut self) -> bool {
        match self.buffer.undo() {
            Some(selection) => {
                self.set_selection(selection);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.buffer.redo() {
            Some(selection) => {
                self.set_selection(selection);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.buffer.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.buffer.can_redo()
    }

    pub fn clear_history(&mut self) {
        self.buffer.clear_history();
    }

    pub fn undo_depth(&self) -> usize {
        self.buffer.undo_depth()
    }

    pub fn redo_depth(&self) -> usize {
        self.buffer.redo_depth()
    }

    /// Drain the content changes applied since the last call.
    pub fn take_changes(&mut self) -> Vec<Change> {
        self.buffer.take_changes()
    }

    // === Line/column helpers ===

    pub fn line_count(&self) -> usize {
        self.buffer.len_lines()
    }

    pub fn line_of(&self, offset: usize) -> usize {
        self.buffer.char_to_line(offset)
    }

    /// Char range of a line, excluding its terminator.
    pub fn line_range(&self, line: usize) -> Range<usize> {
        self.buffer.line_content_range(line)
    }

    /// Lines touched by the selection, as an inclusive-exclusive line index range.
    ///
    /// A non-empty selection ending exactly at a line start does not include that line.
    pub fn selected_lines(&self) -> Range<usize> {
        let sel = self.selection;
        let first = self.line_of(sel.start());
        let mut last = self.line_of(sel.end());
        if !sel.is_collapsed() && last > first && self.buffer.line_to_char(last) == sel.end() {
            last -= 1;
        }
        first..last + 1
    }

    pub fn position_of(&self, offset: usize) -> Position {
        let offset = offset.min(self.len_chars());
        let line = self.line_of(offset);
        Position::new(line, offset - self.buffer.line_to_char(line))
    }

    /// Char offset for a line/column, clamped to the document and to the line length.
    pub fn offset_of(&self, position: Position) -> usize {
        let line = position.line.min(self.line_count().saturating_sub(1));
        let range = self.line_range(line);
        range.start + position.col.min(range.len())
    }
}
