use std::future::Future;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::HostError;

/// The parts of a note needed to link to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: SmolStr,
    pub title: String,
}

impl Note {
    pub fn new(id: impl Into<SmolStr>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }

    /// Markdown link to the note: `[title](:/id)`.
    pub fn markdown_tag(&self) -> String {
        format!("[{}](:/{})", escape_title(&self.title), self.id)
    }
}

/// Escape characters that would end the link text early.
fn escape_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for c in title.chars() {
        if matches!(c, '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Loads notes by id. Implemented by whatever owns the note database.
pub trait NoteLookup: Send + Sync + 'static {
    fn load(&self, id: &str) -> impl Future<Output = Result<Note, HostError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_tag() {
        assert_eq!(Note::new("abc123", "Groceries").markdown_tag(), "[Groceries](:/abc123)");
    }

    #[test]
    fn test_markdown_tag_escapes_brackets() {
        assert_eq!(
            Note::new("n1", "[draft] plan").markdown_tag(),
            r"[\[draft\] plan](:/n1)"
        );
    }
}
