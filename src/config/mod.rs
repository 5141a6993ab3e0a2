// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for the predictor widget

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    /// Prediction server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Widget behaviour and messages
    #[serde(default)]
    pub widget: WidgetConfig,

    /// Drop-folder settings
    #[serde(default)]
    pub watch: WatchConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_server_url")]
    pub url: String,
    #[serde(default = "default_predict_path")]
    pub predict_path: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// What to do when responses to overlapping requests arrive out of order
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RacePolicy {
    /// Whichever response resolves last is displayed, even if stale
    #[default]
    LastResponseWins,
    /// Completions for anything but the newest request are discarded
    LatestRequestWins,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WidgetConfig {
    #[serde(default)]
    pub race_policy: RacePolicy,
    #[serde(default = "default_analyzing_message")]
    pub analyzing_message: String,
    #[serde(default = "default_connection_error_message")]
    pub connection_error_message: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WatchConfig {
    #[serde(default = "default_watch_dir")]
    pub dir: String,
    #[serde(default = "default_stable_wait")]
    pub stable_wait_secs: u64,
}

// Default value functions
fn default_server_url() -> String { "http://127.0.0.1:5000".to_string() }
fn default_predict_path() -> String { "/predict".to_string() }
fn default_timeout() -> u64 { 30 }
fn default_watch_dir() -> String { "./drop".to_string() }
fn default_stable_wait() -> u64 { 10 }

fn default_analyzing_message() -> String {
    "🔄 Analyzing image, please wait...".to_string()
}

fn default_connection_error_message() -> String {
    "Failed to connect to the server. Please ensure it's running.".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            predict_path: default_predict_path(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            race_policy: RacePolicy::default(),
            analyzing_message: default_analyzing_message(),
            connection_error_message: default_connection_error_message(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            dir: default_watch_dir(),
            stable_wait_secs: default_stable_wait(),
        }
    }
}

impl ServerConfig {
    /// Full URL of the prediction endpoint
    pub fn endpoint(&self) -> String {
        let base = self.url.trim_end_matches('/');
        let path = self.predict_path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| crate::PredictorError::Config(format!("Failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the widget cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if !self.server.url.starts_with("http://") && !self.server.url.starts_with("https://") {
            return Err(crate::PredictorError::Config(format!(
                "server.url must be an http(s) URL, got '{}'",
                self.server.url
            )));
        }
        if self.server.timeout_secs == 0 {
            return Err(crate::PredictorError::Config(
                "server.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_slashes() {
        let mut server = ServerConfig::default();
        assert_eq!(server.endpoint(), "http://127.0.0.1:5000/predict");

        server.url = "http://host:8000/".to_string();
        server.predict_path = "predict".to_string();
        assert_eq!(server.endpoint(), "http://host:8000/predict");
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{ "widget": { "race_policy": "latest_request_wins" } }"#,
        ).unwrap();

        assert_eq!(config.widget.race_policy, RacePolicy::LatestRequestWins);
        assert_eq!(config.server.predict_path, "/predict");
        assert_eq!(config.watch.stable_wait_secs, 10);
        assert!(config.widget.analyzing_message.contains("Analyzing"));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config.server.url, "http://127.0.0.1:5000");
        assert_eq!(config.widget.race_policy, RacePolicy::LastResponseWins);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = AppConfig::default();
        config.server.url = "https://classifier.local".to_string();
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.server.url, "https://classifier.local");
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = AppConfig::default();
        config.server.url = "ftp://nowhere".to_string();
        assert!(matches!(config.validate(), Err(crate::PredictorError::Config(_))));
    }
}
