use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result, anyhow};

use crate::theme::Theme;

/// Local development address of the chat backend.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000/api/chat";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub api_url: Option<String>,
    pub theme: Option<String>,
}

/// Settings after merging command line, environment, file and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub theme: Theme,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the user config directory. A missing file gives defaults.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Merge with higher-priority overrides. `api_url` is the command line or
    /// `API_URL` value; `light` is the `--light` flag.
    pub fn resolve(&self, api_url: Option<&str>, light: bool) -> Settings {
        let api_url = non_blank(api_url)
            .or_else(|| non_blank(self.api_url.as_deref()))
            .unwrap_or(DEFAULT_API_URL)
            .to_string();

        let theme = if light {
            Theme::Light
        } else {
            self.theme
                .as_deref()
                .and_then(Theme::from_str)
                .unwrap_or_default()
        };

        Settings { api_url, theme }
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("insight").join("config.json"))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
