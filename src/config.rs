//! Application configuration management.
//!
//! Configuration is stored at `~/.config/eventdesk/config.json`. The API
//! base URL can be overridden per environment with `EVENTDESK_API_URL`
//! (a `.env` file is honored).

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
const APP_NAME: &str = "eventdesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default platform API endpoint
const DEFAULT_API_BASE_URL: &str = "https://api.eventdesk.app";

/// Environment variable overriding the API base URL
const API_URL_ENV: &str = "EVENTDESK_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub last_event_id: Option<i64>,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if present (silently ignore if not found)
        let _ = dotenvy::dotenv();

        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Effective API base URL: environment override, then config file,
    /// then the default endpoint.
    pub fn api_base_url(&self) -> String {
        std::env::var(API_URL_ENV)
            .ok()
            .or_else(|| self.api_base_url.clone())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
    }

    /// Directory for client-local durable state (persisted drafts).
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_base_url_prefers_configured_value() {
        let config = Config {
            api_base_url: Some("https://staging.eventdesk.app".to_string()),
            last_event_id: None,
        };
        assert_eq!(config.api_base_url(), "https://staging.eventdesk.app");
    }

    #[test]
    fn test_api_base_url_default() {
        let config = Config::default();
        assert_eq!(config.api_base_url(), DEFAULT_API_BASE_URL);
    }
}
