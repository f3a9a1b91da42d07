//! Selections and line/column positions.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Anchor/head pair in char offsets. The head is the end the cursor sits on;
/// it may come before the anchor.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// A bare cursor at `offset`.
    pub fn collapsed(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn start(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn end(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    pub fn to_range(&self) -> Range<usize> {
        self.start()..self.end()
    }

    /// Clamp both ends to a document of `len` chars.
    pub fn clamp(self, len: usize) -> Self {
        Self::new(self.anchor.min(len), self.head.min(len))
    }

    /// Follow an edit that replaced `replaced` with `inserted` chars.
    ///
    /// Offsets before the edit stay, offsets after it shift, and offsets inside
    /// the replaced range land at the end of the inserted text.
    pub fn map_edit(self, replaced: Range<usize>, inserted: usize) -> Self {
        let map = |offset: usize| {
            if offset <= replaced.start {
                offset
            } else if offset >= replaced.end {
                offset - replaced.len() + inserted
            } else {
                replaced.start + inserted
            }
        };
        Self::new(map(self.anchor), map(self.head))
    }
}

/// Zero-based line and column (in chars).
#[derive(Clone, Debug, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}
