use miette::Diagnostic;
use smol_str::SmolStr;
use thiserror::Error;

/// Errors raised by the editor control and its registries.
#[derive(Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum EditorError {
    #[error("unknown command: {0}")]
    #[diagnostic(
        code(weft::editor::unknown_command),
        help("check supportsCommand before executing, or register a handler first")
    )]
    UnknownCommand(SmolStr),

    #[error("command already registered: {0}")]
    #[diagnostic(
        code(weft::editor::duplicate_command),
        help("use registerCommand to override an existing handler")
    )]
    DuplicateCommand(SmolStr),

    #[error("invalid arguments for {command}: {reason}")]
    #[diagnostic(code(weft::editor::invalid_arguments))]
    InvalidArguments { command: SmolStr, reason: String },

    #[error("invalid key chord {chord:?}: {reason}")]
    #[diagnostic(code(weft::editor::invalid_key_chord))]
    InvalidKeyChord { chord: String, reason: &'static str },

    #[error("command {command} failed: {message}")]
    #[diagnostic(code(weft::editor::command_failed))]
    CommandFailed { command: SmolStr, message: String },
}

impl EditorError {
    pub fn invalid_arguments(command: impl Into<SmolStr>, reason: impl ToString) -> Self {
        Self::InvalidArguments {
            command: command.into(),
            reason: reason.to_string(),
        }
    }

    /// Stable kind name, used when the error crosses the bridge.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownCommand(_) => "UnknownCommand",
            Self::DuplicateCommand(_) => "DuplicateCommand",
            Self::InvalidArguments { .. } => "InvalidArguments",
            Self::InvalidKeyChord { .. } => "InvalidKeyChord",
            Self::CommandFailed { .. } => "CommandFailed",
        }
    }
}
