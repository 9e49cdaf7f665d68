use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::network::NetworkConfig;

pub const DEFAULT_WEATHER_BASE_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_ICON_BASE_URL: &str = "https://openweathermap.org";
pub const DEFAULT_UNITS: &str = "metric";

/// Environment variable that takes precedence over the stored API key.
pub const API_KEY_ENV: &str = "WEATHER_API_KEY";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// units = "metric"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OpenWeather API key, sent as `appid` on every weather API call.
    pub api_key: Option<String>,

    pub weather_base_url: String,

    /// Host serving condition icons. Needs no key.
    pub icon_base_url: String,

    /// `metric`, `imperial` or `standard`.
    pub units: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            weather_base_url: DEFAULT_WEATHER_BASE_URL.to_string(),
            icon_base_url: DEFAULT_ICON_BASE_URL.to_string(),
            units: DEFAULT_UNITS.to_string(),
        }
    }
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    /// A non-empty `WEATHER_API_KEY` overrides the stored key.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;

        if let Some(key) = env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty()) {
            cfg.api_key = Some(key);
        }

        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-task", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key.trim().to_string());
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Backend config for the weather data API; every call carries the API key.
    pub fn weather_network_config(&self) -> Result<NetworkConfig> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No API key configured.\n\
                     Hint: run `weather configure` or set {API_KEY_ENV}."
                )
            })?;

        Ok(NetworkConfig::new(self.weather_base_url.as_str())
            .with_query_parameter("appid", api_key))
    }

    /// Backend config for the icon host.
    pub fn icon_network_config(&self) -> NetworkConfig {
        NetworkConfig::new(self.icon_base_url.as_str())
    }
}
