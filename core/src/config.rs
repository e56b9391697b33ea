//! Application configuration.
//!
//! Mirrors `thaumic-core::state::{Config, StreamingConfig}`: grouped
//! sub-configs with `Default` impls and a `validate()` that returns a
//! `Result<(), String>` rather than panicking.

use serde::{Deserialize, Serialize};

use crate::model::AlertEntry;

/// Bounded-parallelism settings for the pipeline coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Number of workers that fetch frames.
    pub fetch_worker_count: usize,
    /// Fetch-frame timeout, in seconds.
    pub fetch_timeout_secs: u64,
    /// Capacity of the intermediate buffer between fetch and process stages.
    pub frame_buffer_size: usize,
    /// Number of workers that process fetched frames.
    pub process_worker_count: usize,
    /// Per-frame processing timeout, in seconds.
    pub process_timeout_secs: u64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            fetch_worker_count: 16,
            fetch_timeout_secs: 60,
            frame_buffer_size: 512,
            process_worker_count: 8,
            process_timeout_secs: 60,
        }
    }
}

impl ProcessingConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.fetch_worker_count == 0 {
            return Err("processing.fetch_worker_count must be >= 1".to_string());
        }
        if self.process_worker_count == 0 {
            return Err("processing.process_worker_count must be >= 1".to_string());
        }
        if self.frame_buffer_size == 0 {
            return Err("processing.frame_buffer_size must be >= 1".to_string());
        }
        if self.fetch_timeout_secs == 0 {
            return Err("processing.fetch_timeout_secs must be >= 1".to_string());
        }
        if self.process_timeout_secs == 0 {
            return Err("processing.process_timeout_secs must be >= 1".to_string());
        }
        Ok(())
    }
}

/// Outbound proxy pool used by frame acquisition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Proxy URLs to pick from uniformly at random. Empty means no proxy.
    pub list: Vec<String>,
}

/// Settings for the watched game / streaming-platform roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitchConfig {
    /// The upstream platform's id for the game being watched.
    pub game_id: String,
    /// Whether to scan playlists for ad markers and skip past them.
    pub ads_check: bool,
    /// Base URL of the roster ("get live streams") endpoint.
    pub roster_base_url: String,
    /// Base URL of the media-playlist-resolution endpoint.
    pub live_media_base_url: String,
    /// Base URL of the chat-send endpoint.
    pub chat_base_url: String,
}

impl Default for TwitchConfig {
    fn default() -> Self {
        Self {
            game_id: String::new(),
            ads_check: false,
            roster_base_url: String::new(),
            live_media_base_url: String::new(),
            chat_base_url: String::new(),
        }
    }
}

/// OCR microservice location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    pub base_url: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
        }
    }
}

/// Alert loop settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Don't actually call the chat collaborator; log instead.
    pub dry_run: bool,
    /// Seconds between alert-loop ticks.
    pub check_interval_secs: u64,
    /// Seconds an alert dedupe entry is suppressed for.
    pub ttl_secs: u64,
    /// Configured streamer/query watch entries.
    pub list: Vec<AlertEntry>,
}

/// Top-level configuration for the core library.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub twitch: TwitchConfig,
    pub ocr: OcrConfig,
    pub processing: ProcessingConfig,
    pub alert: AlertConfig,
    pub proxy: ProxyConfig,
}

impl Config {
    /// Validates the configuration, returning the first violation found.
    pub fn validate(&self) -> Result<(), String> {
        self.processing.validate()?;
        if self.twitch.game_id.is_empty() {
            return Err("twitch.game_id must be set".to_string());
        }
        if self.ocr.base_url.is_empty() {
            return Err("ocr.base_url must be set".to_string());
        }
        if self.alert.check_interval_secs == 0 {
            return Err("alert.check_interval_secs must be >= 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_processing_config_is_valid() {
        assert!(ProcessingConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_worker_count_is_invalid() {
        let mut cfg = ProcessingConfig::default();
        cfg.fetch_worker_count = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn missing_game_id_fails_validation() {
        let cfg = Config {
            alert: AlertConfig {
                check_interval_secs: 10,
                ..Default::default()
            },
            ocr: OcrConfig {
                base_url: "http://localhost:5000".into(),
            },
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
