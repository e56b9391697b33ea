//! Server configuration.
//!
//! Supports loading from a YAML file with environment variable overrides.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use snipewatch_core::config::{AlertConfig, OcrConfig, ProcessingConfig, ProxyConfig, TwitchConfig};

/// Server configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub twitch: TwitchConfig,
    pub ocr: OcrConfig,
    pub processing: ProcessingConfig,
    pub alert: AlertConfig,
    pub proxy: ProxyConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            twitch: TwitchConfig::default(),
            ocr: OcrConfig::default(),
            processing: ProcessingConfig::default(),
            alert: AlertConfig::default(),
            proxy: ProxyConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file: {}", path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SNIPEWATCH_GAME_ID") {
            self.twitch.game_id = val;
        }
        if let Ok(val) = std::env::var("SNIPEWATCH_OCR_BASE_URL") {
            self.ocr.base_url = val;
        }
        if let Ok(val) = std::env::var("SNIPEWATCH_ALERT_DRY_RUN") {
            if let Ok(dry_run) = val.parse() {
                self.alert.dry_run = dry_run;
            }
        }
    }

    /// Converts to the core library's `Config` type.
    pub fn to_core_config(&self) -> snipewatch_core::Config {
        snipewatch_core::Config {
            twitch: self.twitch.clone(),
            ocr: self.ocr.clone(),
            processing: self.processing.clone(),
            alert: self.alert.clone(),
            proxy: self.proxy.clone(),
        }
    }
}
