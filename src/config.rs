use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API key for the completion endpoint
    pub api_key: Option<String>,

    /// Model to request completions from
    pub model: String,

    /// Base URL of an OpenAI-compatible API
    pub base_url: String,

    /// Sampling temperature for completions
    pub temperature: f32,

    /// Upper bound on generated tokens per reply
    pub max_tokens: u32,

    /// Chirp home directory
    pub chirp_home: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));

        Config {
            api_key: None,
            model: "gpt-4.1-nano".to_string(),
            base_url: "https://api.openai.com".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            chirp_home: home.join(".chirp"),
        }
    }
}

impl Config {
    /// Load configuration from `~/.chirp/config.toml`, creating the
    /// directory on first run.
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Self::load_from(home.join(".chirp"))
    }

    /// Load configuration rooted at an explicit home directory.
    pub fn load_from(chirp_home: PathBuf) -> Result<Self> {
        fs::create_dir_all(&chirp_home).context("Failed to create .chirp directory")?;

        let config_path = chirp_home.join("config.toml");
        let mut config = if config_path.exists() {
            let content =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")?
        } else {
            Config::default()
        };

        config.chirp_home = chirp_home;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = self.chirp_home.join("config.toml");
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&config_path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Get API key from config or environment
    pub fn get_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
    }

    /// Update API key
    pub fn set_api_key(&mut self, key: String) {
        self.api_key = Some(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_match_the_documented_knobs() {
        let config = Config::default();
        assert_eq!(config.model, "gpt-4.1-nano");
        assert_eq!(config.base_url, "https://api.openai.com");
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.max_tokens, 1000);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn load_save_round_trip() {
        let dir = tempdir().unwrap();
        let home = dir.path().join(".chirp");

        let mut config = Config::load_from(home.clone()).unwrap();
        config.set_api_key("sk-test".to_string());
        config.model = "gpt-4o-mini".to_string();
        config.save().unwrap();

        let reloaded = Config::load_from(home).unwrap();
        assert_eq!(reloaded.api_key.as_deref(), Some("sk-test"));
        assert_eq!(reloaded.model, "gpt-4o-mini");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(dir.path().join(".chirp")).unwrap();
        assert_eq!(config.model, Config::default().model);
    }
}
