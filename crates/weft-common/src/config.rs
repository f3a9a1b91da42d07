use serde::{Deserialize, Serialize};

use std::future::Future;
use std::path::Path;
use std::path::PathBuf;

use crate::error::{ParseError, SerDeError, WeftError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Editor control behaviour.
    pub editor: EditorConfig,
    /// Host-side webview settings.
    pub webview: WebViewConfig,
    /// Log output settings.
    pub telemetry: TelemetrySettings,
}

/// Settings consumed by the editor control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Resolve `Mod` in key chords to Cmd instead of Ctrl.
    pub mac_keymap: bool,
    /// Maximum number of undo entries kept. Oldest entries are dropped first.
    pub history_depth: usize,
    /// Opening block-comment delimiter used by `toggleComment`.
    pub comment_open: String,
    /// Closing block-comment delimiter used by `toggleComment`.
    pub comment_close: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            mac_keymap: cfg!(target_os = "macos"),
            history_depth: 200,
            comment_open: "<!-- ".to_owned(),
            comment_close: " -->".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebViewConfig {
    /// Name of the per-instance HTML file, without extension.
    pub instance_id: String,
    /// Directory the HTML file is written to. Also the base URL for relative resources.
    pub base_directory: PathBuf,
}

impl Default for WebViewConfig {
    fn default() -> Self {
        Self {
            instance_id: "weft-editor".to_owned(),
            base_directory: std::env::temp_dir().join("weft"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySettings {
    /// Env-filter directive used when `RUST_LOG` is unset, e.g. `"weft=debug"`.
    pub filter: Option<String>,
}

impl Config {
    /// Loads the configuration from the provided loader.
    pub async fn load(loader: &impl Loader) -> Result<Self, WeftError> {
        loader.load().await
    }

    /// Saves the configuration using the provided saver.
    pub async fn save(&self, saver: &impl Saver) -> Result<(), WeftError> {
        saver.save(self).await
    }
}

/// The trait for loading configuration data.
pub trait Loader {
    /// Loads the configuration data.
    fn load(&self) -> impl Future<Output = Result<Config, WeftError>> + Send;
}

/// The trait for saving configuration data.
pub trait Saver {
    /// Saves the configuration data.
    fn save(&self, config: &Config) -> impl Future<Output = Result<(), WeftError>> + Send;
}

/// An implementation of [`Loader`] and [`Saver`] that reads and writes a configuration file.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a new [`FileStore`] with the given path.
    ///
    /// [`Config`] data will be serialized and deserialized according to the
    /// file extension: `.json` or `.toml`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|ext| ext.to_str())
    }

    fn display_name(&self) -> String {
        self.path.display().to_string()
    }
}

impl Loader for FileStore {
    async fn load(&self) -> Result<Config, WeftError> {
        match self.extension() {
            Some("json") => {
                let src = std::fs::read_to_string(&self.path)?;
                serde_json::from_str(&src)
                    .map_err(|e| ParseError::json(e, self.display_name(), src).into())
            }
            Some("toml") => {
                let src = std::fs::read_to_string(&self.path)?;
                toml::from_str(&src)
                    .map_err(|e| ParseError::toml(e, self.display_name(), src).into())
            }
            _ => Err(WeftError::UnsupportedFormat(self.display_name())),
        }
    }
}

impl Saver for FileStore {
    async fn save(&self, config: &Config) -> Result<(), WeftError> {
        let text = match self.extension() {
            Some("json") => serde_json::to_string_pretty(config).map_err(SerDeError::from)?,
            Some("toml") => toml::to_string_pretty(config).map_err(SerDeError::from)?,
            _ => return Err(WeftError::UnsupportedFormat(self.display_name())),
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, text)?;
        tracing::debug!(path = %self.path.display(), "config saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_toml_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.editor.history_depth = 7;
        config.editor.comment_open = "%% ".into();
        config.webview.instance_id = "pane-1".into();

        for name in ["weft.toml", "weft.json"] {
            let store = FileStore::new(dir.path().join(name));
            config.save(&store).await.unwrap();
            let loaded = Config::load(&store).await.unwrap();
            assert_eq!(loaded, config);
        }
    }

    #[tokio::test]
    async fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weft.toml");
        std::fs::write(&path, "[editor]\nmac_keymap = true\n").unwrap();

        let loaded = Config::load(&FileStore::new(&path)).await.unwrap();
        assert!(loaded.editor.mac_keymap);
        assert_eq!(loaded.editor.history_depth, 200);
        assert_eq!(loaded.editor.comment_close, " -->");
    }

    #[tokio::test]
    async fn test_unsupported_extension() {
        let store = FileStore::new("weft.yaml");
        let err = Config::load(&store).await.unwrap_err();
        assert!(matches!(err, WeftError::UnsupportedFormat(_)));
    }

    #[tokio::test]
    async fn test_bad_toml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weft.toml");
        std::fs::write(&path, "[editor\n").unwrap();

        let err = Config::load(&FileStore::new(&path)).await.unwrap_err();
        assert!(matches!(err, WeftError::Parse(_)));
    }
}
