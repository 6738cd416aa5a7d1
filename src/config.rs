use crate::completion::ClientConfig;
use crate::conversation::HistoryWindow;
use crate::workspace::DEFAULT_SCAN_LIMIT;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Default model (optional)
    pub model: Option<String>,

    /// Provider identifier ("groq" or "stub").
    pub provider: Option<String>,

    /// Override for the API base URL, e.g. a proxy.
    pub api_base: Option<String>,

    #[serde(default)]
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChatConfig {
    /// Prior turns replayed per request (default 8).
    pub history_window: Option<usize>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,

    /// Max entries listed from the workspace.
    pub workspace_limit: Option<usize>,
}

impl Config {
    /// Load config if the file exists, otherwise return Ok(None).
    pub fn load_optional(path: impl AsRef<Path>) -> anyhow::Result<Option<Self>> {
        let path = path.as_ref();
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(anyhow::Error::new(e))
                    .with_context(|| format!("failed to read config: {}", path.display()))
            }
        };

        let s = String::from_utf8(bytes).context("config is not valid UTF-8")?;
        let cfg: Config = toml::from_str(&s)
            .with_context(|| format!("failed to parse TOML: {}", path.display()))?;
        Ok(Some(cfg))
    }

    pub fn workspace_limit(&self) -> usize {
        self.chat.workspace_limit.unwrap_or(DEFAULT_SCAN_LIMIT)
    }

    /// Client settings with config values layered over the defaults.
    /// The API key is left unset; it comes from the credential store.
    pub fn client_config(&self, model: String) -> ClientConfig {
        let defaults = ClientConfig::default();
        ClientConfig {
            api_key: None,
            model,
            temperature: self.chat.temperature.unwrap_or(defaults.temperature),
            max_tokens: self.chat.max_tokens.unwrap_or(defaults.max_tokens),
            history_window: self
                .chat
                .history_window
                .map(HistoryWindow)
                .unwrap_or(defaults.history_window),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_optional(dir.path().join("config.toml")).unwrap().is_none());
    }

    #[test]
    fn parses_chat_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
model = "mixtral-8x7b-32768"
provider = "stub"

[chat]
history_window = 4
max_tokens = 256
"#,
        )
        .unwrap();

        let cfg = Config::load_optional(&path).unwrap().unwrap();
        assert_eq!(cfg.model.as_deref(), Some("mixtral-8x7b-32768"));
        let client = cfg.client_config("m".into());
        assert_eq!(client.history_window, HistoryWindow(4));
        assert_eq!(client.max_tokens, 256);
        assert_eq!(client.temperature, 0.7);
        assert_eq!(cfg.workspace_limit(), DEFAULT_SCAN_LIMIT);
    }

    #[test]
    fn bad_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "model = [").unwrap();
        assert!(Config::load_optional(&path).is_err());
    }
}
