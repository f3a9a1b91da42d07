//! Editing steps given on the command line, e.g. `cursor:1:0 exec:deleteLine`.

use std::str::FromStr;

use miette::Diagnostic;
use serde_json::Value;
use weft_bridge::{BridgeError, Transport};
use weft_editor_core::KeydownResult;
use weft_editor_webview::{EditorSession, SessionError};
use weft_host::EditorRemote;

#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("invalid step {step:?}: {reason}")]
#[diagnostic(
    code(weft::cli::step),
    help("steps look like insert:TEXT, exec:NAME[:JSON], key:CHORD, cursor:LINE:COL, select:ANCHOR:HEAD, undo, redo, clear-history")
)]
pub struct StepParseError {
    step: String,
    reason: &'static str,
}

#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum StepError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Session(#[from] SessionError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Insert(String),
    Exec { name: String, args: Value },
    Key(String),
    Cursor { line: usize, col: usize },
    Select { anchor: usize, head: usize },
    Undo,
    Redo,
    ClearHistory,
}

impl FromStr for Step {
    type Err = StepParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason| StepParseError {
            step: s.to_owned(),
            reason,
        };
        let (verb, rest) = match s.split_once(':') {
            Some((verb, rest)) => (verb, Some(rest)),
            None => (s, None),
        };
        let pair = |rest: Option<&str>| -> Result<(usize, usize), StepParseError> {
            let (a, b) = rest
                .and_then(|r| r.split_once(':'))
                .ok_or_else(|| err("expected two numbers"))?;
            let a = a.parse().map_err(|_| err("not a number"))?;
            let b = b.parse().map_err(|_| err("not a number"))?;
            Ok((a, b))
        };

        match (verb, rest) {
            ("insert", Some(text)) => Ok(Self::Insert(text.replace("\\n", "\n"))),
            ("exec", Some(rest)) => {
                let (name, args) = match rest.split_once(':') {
                    Some((name, json)) => {
                        (name, serde_json::from_str(json).map_err(|_| err("arguments are not JSON"))?)
                    }
                    None => (rest, Value::Null),
                };
                if name.is_empty() {
                    return Err(err("missing command name"));
                }
                Ok(Self::Exec {
                    name: name.to_owned(),
                    args,
                })
            }
            ("key", Some(chord)) if !chord.is_empty() => Ok(Self::Key(chord.to_owned())),
            ("cursor", rest) => pair(rest).map(|(line, col)| Self::Cursor { line, col }),
            ("select", rest) => pair(rest).map(|(anchor, head)| Self::Select { anchor, head }),
            ("undo", None) => Ok(Self::Undo),
            ("redo", None) => Ok(Self::Redo),
            ("clear-history", None) => Ok(Self::ClearHistory),
            _ => Err(err("unknown step")),
        }
    }
}

impl Step {
    /// Apply the step. Key presses are fed to the editor page directly, as a
    /// keydown listener would; everything else goes over the bridge.
    pub async fn run<T: Transport>(
        &self,
        remote: &EditorRemote<T>,
        page: &EditorSession<T>,
    ) -> Result<(), StepError> {
        match self {
            Self::Insert(text) => remote.insert_text(text).await?,
            Self::Exec { name, args } => {
                let result = remote.exec_command(name, args.clone()).await?;
                if !result.is_null() {
                    tracing::info!(command = %name, %result, "command returned");
                }
            }
            Self::Key(chord) => {
                if page.handle_key(chord)? != KeydownResult::Handled {
                    tracing::info!(%chord, "key not handled");
                }
            }
            Self::Cursor { line, col } => remote.set_cursor(*line, *col).await?,
            Self::Select { anchor, head } => remote.select(*anchor, *head).await?,
            Self::Undo => {
                remote.undo().await?;
            }
            Self::Redo => {
                remote.redo().await?;
            }
            Self::ClearHistory => remote.clear_history().await?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_steps() {
        assert_eq!("insert:a\\nb".parse::<Step>().unwrap(), Step::Insert("a\nb".into()));
        assert_eq!(
            "exec:insertText:{\"text\":\"x:y\"}".parse::<Step>().unwrap(),
            Step::Exec {
                name: "insertText".into(),
                args: json!({"text": "x:y"})
            }
        );
        assert_eq!(
            "exec:selectAll".parse::<Step>().unwrap(),
            Step::Exec {
                name: "selectAll".into(),
                args: Value::Null
            }
        );
        assert_eq!("key:Mod-Shift-z".parse::<Step>().unwrap(), Step::Key("Mod-Shift-z".into()));
        assert_eq!("cursor:1:0".parse::<Step>().unwrap(), Step::Cursor { line: 1, col: 0 });
        assert_eq!("undo".parse::<Step>().unwrap(), Step::Undo);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("cursor:1".parse::<Step>().is_err());
        assert!("select:a:b".parse::<Step>().is_err());
        assert!("exec:".parse::<Step>().is_err());
        assert!("undo:now".parse::<Step>().is_err());
        assert!("frobnicate".parse::<Step>().is_err());
    }
}
