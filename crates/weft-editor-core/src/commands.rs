//! Built-in editor commands.
//!
//! These are registered on every new editor control. Any of them can be
//! overridden by registering a handler under the same name.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;

use crate::command::{CommandArgs, CommandRegistry, CommandResult};
use crate::error::EditorError;
use crate::state::EditorState;
use crate::types::Selection;

/// Names of the built-in commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorCommandType {
    Undo,
    Redo,
    SelectAll,
    SelectLine,
    ToggleComment,
    DeleteLine,
    DuplicateLine,
    InsertText,
    DropItems,
}

impl EditorCommandType {
    pub const ALL: [Self; 9] = [
        Self::Undo,
        Self::Redo,
        Self::SelectAll,
        Self::SelectLine,
        Self::ToggleComment,
        Self::DeleteLine,
        Self::DuplicateLine,
        Self::InsertText,
        Self::DropItems,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Undo => "undo",
            Self::Redo => "redo",
            Self::SelectAll => "selectAll",
            Self::SelectLine => "selectLine",
            Self::ToggleComment => "toggleComment",
            Self::DeleteLine => "deleteLine",
            Self::DuplicateLine => "duplicateLine",
            Self::InsertText => "insertText",
            Self::DropItems => "dropItems",
        }
    }
}

impl AsRef<str> for EditorCommandType {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<EditorCommandType> for SmolStr {
    fn from(command: EditorCommandType) -> Self {
        SmolStr::new_static(command.as_str())
    }
}

/// Argument of the `dropItems` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DropItems {
    /// Internal notes, already converted to markdown links.
    Notes {
        #[serde(rename = "markdownTags")]
        markdown_tags: Vec<String>,
    },
    /// Files from outside the application.
    Files {
        paths: Vec<String>,
        #[serde(rename = "createFileURL", default)]
        create_file_url: bool,
    },
}

/// Register every built-in command.
pub fn register_builtins(registry: &mut CommandRegistry) {
    registry.register(EditorCommandType::Undo, |state, _| Ok(Value::Bool(state.undo())));
    registry.register(EditorCommandType::Redo, |state, _| Ok(Value::Bool(state.redo())));
    registry.register(EditorCommandType::SelectAll, select_all);
    registry.register(EditorCommandType::SelectLine, select_line);
    registry.register(EditorCommandType::ToggleComment, toggle_comment);
    registry.register(EditorCommandType::DeleteLine, delete_line);
    registry.register(EditorCommandType::DuplicateLine, duplicate_line);
    registry.register(EditorCommandType::InsertText, insert_text);
    registry.register(EditorCommandType::DropItems, drop_items);
}

fn select_all(state: &mut EditorState, _: CommandArgs) -> CommandResult {
    state.set_selection(Selection::new(0, state.len_chars()));
    Ok(Value::Bool(true))
}

/// Char offset where `line` starts, or the document end past the last line.
fn line_start(state: &EditorState, line: usize) -> usize {
    if line >= state.line_count() {
        state.len_chars()
    } else {
        state.line_range(line).start
    }
}

fn select_line(state: &mut EditorState, _: CommandArgs) -> CommandResult {
    let lines = state.selected_lines();
    let start = line_start(state, lines.start);
    let end = line_start(state, lines.end);
    state.set_selection(Selection::new(start, end));
    Ok(Value::Bool(true))
}

/// Wrap the selected lines in block-comment delimiters, or unwrap them if
/// they are already wrapped.
fn toggle_comment(state: &mut EditorState, _: CommandArgs) -> CommandResult {
    let open = state.settings().comment_open.clone();
    let close = state.settings().comment_close.clone();
    let lines = state.selected_lines();
    let start = state.line_range(lines.start).start;
    let end = state.line_range(lines.end - 1).end;
    let text = state.slice(start..end).unwrap_or_default();

    let selection = state.selection();
    let open_len = open.chars().count();
    let delimiters_len = open_len + close.chars().count();
    state.transact(|state| {
        if let Some(inner) = text
            .strip_prefix(open.as_str())
            .and_then(|rest| rest.strip_suffix(close.as_str()))
        {
            state.replace(start..end, inner);
            let inner_end = start + inner.chars().count();
            let unshift = |offset: usize| {
                if offset > end {
                    offset - delimiters_len
                } else {
                    offset.saturating_sub(open_len).clamp(start, inner_end)
                }
            };
            state.set_selection(Selection::new(
                unshift(selection.anchor),
                unshift(selection.head),
            ));
        } else {
            let wrapped = format!("{open}{text}{close}");
            state.replace(start..end, &wrapped);
            // Offsets past the last wrapped line also move over the closing delimiter.
            let shift = |offset: usize| {
                if offset > end {
                    offset + delimiters_len
                } else {
                    offset + open_len
                }
            };
            state.set_selection(Selection::new(
                shift(selection.anchor),
                shift(selection.head),
            ));
        }
    });
    tracing::trace!(lines = ?lines, "toggled comment");
    Ok(Value::Bool(true))
}

/// Delete every line touched by the selection, terminators included.
fn delete_line(state: &mut EditorState, _: CommandArgs) -> CommandResult {
    let lines = state.selected_lines();
    let mut start = line_start(state, lines.start);
    let end = line_start(state, lines.end);
    let last_has_terminator = end > start && state.char_at(end - 1) == Some('\n');
    if !last_has_terminator && start > 0 {
        // Last line of the document: take the newline before it instead.
        start -= 1;
    }

    state.transact(|state| {
        state.delete(start..end);
        let line = state.line_of(start.min(state.len_chars()));
        let cursor = if last_has_terminator || start == 0 {
            start
        } else {
            state.line_range(line).start
        };
        state.set_selection(Selection::collapsed(cursor));
    });
    Ok(Value::Bool(true))
}

fn duplicate_line(state: &mut EditorState, _: CommandArgs) -> CommandResult {
    let lines = state.selected_lines();
    let start = line_start(state, lines.start);
    let end = state.line_range(lines.end - 1).end;
    let text = state.slice(start..end).unwrap_or_default();
    let selection = state.selection();
    let shift = text.chars().count() + 1;

    state.transact(|state| {
        state.insert(end, &format!("\n{text}"));
        state.set_selection(Selection::new(
            selection.anchor + shift,
            selection.head + shift,
        ));
    });
    Ok(Value::Bool(true))
}

fn insert_text(state: &mut EditorState, args: CommandArgs) -> CommandResult {
    let text = match &args {
        Value::String(text) => text.as_str(),
        Value::Object(map) => map.get("text").and_then(Value::as_str).ok_or_else(|| {
            EditorError::invalid_arguments(EditorCommandType::InsertText, "missing string field `text`")
        })?,
        other => {
            return Err(EditorError::invalid_arguments(
                EditorCommandType::InsertText,
                format!("expected a string or {{text}}, got {other}"),
            ));
        }
    };
    state.replace_selection(text);
    Ok(Value::Null)
}

fn drop_items(state: &mut EditorState, args: CommandArgs) -> CommandResult {
    let items: DropItems = serde_json::from_value(args)
        .map_err(|e| EditorError::invalid_arguments(EditorCommandType::DropItems, e))?;
    let text = match items {
        DropItems::Notes { markdown_tags } => markdown_tags.join("\n"),
        DropItems::Files {
            paths,
            create_file_url,
        } => paths
            .iter()
            .map(|path| file_link(path, create_file_url))
            .collect::<Vec<_>>()
            .join("\n"),
    };
    if !text.is_empty() {
        state.replace_selection(&text);
    }
    Ok(Value::Null)
}

fn file_link(path: &str, create_file_url: bool) -> String {
    let name = path
        .rsplit(['/', '\\'])
        .find(|part| !part.is_empty())
        .unwrap_or(path);
    let target = path.replace(' ', "%20");
    if create_file_url {
        let target = target.replace('\\', "/");
        let slash = if target.starts_with('/') { "" } else { "/" };
        format!("[{name}](file://{slash}{target})")
    } else {
        format!("[{name}]({target})")
    }
}
