//! Error types shared across weft crates

use miette::{Diagnostic, NamedSource, SourceOffset, SourceSpan};
use std::borrow::Cow;

/// Main error type for weft plumbing (config, IO, serialization)
#[derive(thiserror::Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum WeftError {
    /// IO error
    #[error(transparent)]
    #[diagnostic(code(weft::io))]
    Io(#[from] std::io::Error),

    /// Parse error with source location
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    /// Serialization/deserialization error
    #[error(transparent)]
    #[diagnostic(transparent)]
    Serde(#[from] SerDeError),

    /// Config file with an extension we can't read or write
    #[error("unsupported config format: {0}")]
    #[diagnostic(
        code(weft::config::format),
        help("use a .json or .toml file")
    )]
    UnsupportedFormat(String),
}

/// Parse error with source code location information
#[derive(thiserror::Error, Debug, Diagnostic)]
#[error("parse error: {}", self.kind)]
#[diagnostic(code(weft::parse))]
pub struct ParseError {
    #[diagnostic_source]
    kind: SerDeError,
    #[source_code]
    src: NamedSource<Cow<'static, str>>,
    #[label("error")]
    err_location: SourceSpan,
    #[help]
    advice: Option<String>,
}

impl ParseError {
    /// Attach the text that failed to parse, pointing the label at `line`/`column` (1-based).
    pub fn json(err: serde_json::Error, name: impl Into<String>, src: String) -> Self {
        let (line, column) = (err.line(), err.column());
        let location = SourceSpan::new(SourceOffset::from_location(&src, line, column), 0);
        Self {
            kind: SerDeError::Json(err),
            src: NamedSource::new(name.into(), Cow::Owned(src)),
            err_location: location,
            advice: None,
        }
    }

    pub fn toml(err: toml::de::Error, name: impl Into<String>, src: String) -> Self {
        let location = match err.span() {
            Some(span) => SourceSpan::new(span.start.into(), span.len()),
            None => SourceSpan::new(0.into(), 0),
        };
        Self {
            kind: SerDeError::TomlDe(err),
            src: NamedSource::new(name.into(), Cow::Owned(src)),
            err_location: location,
            advice: None,
        }
    }

    pub fn with_advice(self, advice: impl Into<String>) -> Self {
        Self {
            advice: Some(advice.into()),
            ..self
        }
    }
}

/// Serialization/deserialization errors
#[derive(thiserror::Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum SerDeError {
    #[error(transparent)]
    #[diagnostic(code(weft::serde::json))]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    #[diagnostic(code(weft::serde::toml))]
    TomlDe(#[from] toml::de::Error),

    #[error(transparent)]
    #[diagnostic(code(weft::serde::toml))]
    TomlSer(#[from] toml::ser::Error),
}
