use crate::model::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub cookie_url: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query2.finance.yahoo.com".into(),
            cookie_url: "https://fc.yahoo.com".into(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 tickview/0.1".into(),
            timeout_seconds: 30,
        }
    }
}

/// Size of the character canvas charts are drawn on.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChartConfig {
    pub width: usize,
    pub height: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 72,
            height: 20,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub chart: ChartConfig,
}

pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}
