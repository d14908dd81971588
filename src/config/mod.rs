//! Configuration management for vidchat

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a professional video content analysis \
assistant. Use the provided tool to look up relevant transcript excerpts for the user's \
question, then give an accurate and helpful answer. When you cite transcript content, \
include the timestamps you are quoting.";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub openai: OpenAiConfig,
    pub transcript: TranscriptConfig,
    pub indexer: IndexerConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// Azure OpenAI resource endpoint, e.g. https://my-resource.openai.azure.com
    pub endpoint: String,
    pub api_key: String,
    pub deployment: String,
    pub api_version: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            deployment: "gpt-4o".to_string(),
            api_version: "2024-10-21".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptConfig {
    pub endpoint: String,
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3001/api/transcription".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct IndexerConfig {
    pub index_endpoint: String,
    pub delete_endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub system_prompt: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl Config {
    /// Load from the default config path, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from an explicit path; missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config at {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config at {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn config_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("vidchat");
        Ok(dir.join("config.toml"))
    }

    /// Write the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(())
    }

    /// Environment variables win over the config file, matching how the
    /// original deployment was configured.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("AZURE_OPENAI_ENDPOINT") {
            self.openai.endpoint = v;
        }
        if let Ok(v) = std::env::var("AZURE_OPENAI_API_KEY") {
            self.openai.api_key = v;
        }
        if let Ok(v) = std::env::var("AZURE_OPENAI_DEPLOYMENT") {
            self.openai.deployment = v;
        }
        if let Ok(v) = std::env::var("VIDCHAT_TRANSCRIPTION_ENDPOINT") {
            self.transcript.endpoint = v;
        }
        if let Ok(v) = std::env::var("VIDCHAT_INDEX_ENDPOINT") {
            self.indexer.index_endpoint = v;
        }
        if let Ok(v) = std::env::var("VIDCHAT_DELETE_ENDPOINT") {
            self.indexer.delete_endpoint = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployment_settings() {
        let config = Config::default();
        assert_eq!(config.openai.deployment, "gpt-4o");
        assert_eq!(config.openai.api_version, "2024-10-21");
        assert_eq!(config.openai.temperature, 0.7);
        assert_eq!(config.openai.max_tokens, 1000);
        assert!(config.chat.system_prompt.contains("timestamps"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.openai.deployment, "gpt-4o");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[openai]\nendpoint = \"https://example.openai.azure.com\"\ndeployment = \"gpt-4.1-mini\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.openai.endpoint, "https://example.openai.azure.com");
        assert_eq!(config.openai.deployment, "gpt-4.1-mini");
        // Untouched sections keep defaults
        assert_eq!(config.openai.max_tokens, 1000);
        assert_eq!(
            config.transcript.endpoint,
            "http://localhost:3001/api/transcription"
        );
    }

    #[test]
    fn round_trips_through_toml() {
        let mut config = Config::default();
        config.openai.api_key = "secret".to_string();
        config.indexer.index_endpoint = "https://fn.example.com/api/index_video".to_string();

        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.openai.api_key, "secret");
        assert_eq!(
            parsed.indexer.index_endpoint,
            "https://fn.example.com/api/index_video"
        );
    }
}
