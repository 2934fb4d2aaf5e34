//! Configuration management.
//!
//! Settings come from, in increasing priority: built-in defaults, a TOML file,
//! and `SOP_MASTER_*` environment variables (`__` separates sections, e.g.
//! `SOP_MASTER_ACCESS__PASSWORD`). The two secrets also fall back to the
//! plain `GEMINI_API_KEY` and `APP_PASSWORD` variables.

mod file_config;

pub use file_config::{default_config_toml, save_config, ConfigFileError};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::generator::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::models::DEFAULT_TITLE;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "SOP_MASTER";

/// File name searched for in the working directory and config dir
pub const CONFIG_FILE_NAME: &str = "sop-master.toml";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// API keys for the generation service
    #[serde(default)]
    pub api_keys: ApiKeys,

    /// Access gate and usage limits
    #[serde(default)]
    pub access: AccessConfig,

    /// Generation backend settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Output document settings
    #[serde(default)]
    pub document: DocumentConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// API keys for external services
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiKeys {
    /// Gemini API key. Falls back to `GEMINI_API_KEY`.
    #[serde(default)]
    pub gemini: Option<String>,
}

/// Access gate and per-session quota
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Shared password; no password means the gate is open.
    /// Falls back to `APP_PASSWORD`.
    #[serde(default)]
    pub password: Option<String>,

    /// Shown to users who fail the password check
    #[serde(default)]
    pub purchase_link: Option<String>,

    /// Successful generations allowed per session
    #[serde(default = "default_max_usage")]
    pub max_usage_per_session: u32,

    /// Disable the per-session quota entirely
    #[serde(default)]
    pub unlimited: bool,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            password: None,
            purchase_link: None,
            max_usage_per_session: default_max_usage(),
            unlimited: false,
        }
    }
}

fn default_max_usage() -> u32 {
    10
}

/// Generation backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Whole-request timeout for the model call
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    120
}

/// Output document configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Title heading at the top of every exported document
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
        }
    }
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Fill unset secrets from `GEMINI_API_KEY` / `APP_PASSWORD`.
    pub fn with_env_fallbacks(mut self) -> Self {
        if self.api_keys.gemini.is_none() {
            self.api_keys.gemini = non_empty_env("GEMINI_API_KEY");
        }
        if self.access.password.is_none() {
            self.access.password = non_empty_env("APP_PASSWORD");
        }
        self
    }

    /// Copy with secrets masked, for display
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.api_keys.gemini = copy.api_keys.gemini.as_deref().map(mask_secret);
        copy.access.password = copy.access.password.as_deref().map(mask_secret);
        copy
    }

    /// Per-session quota, `None` when unlimited
    pub fn max_usage(&self) -> Option<u32> {
        (!self.access.unlimited).then_some(self.access.max_usage_per_session)
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 8 {
        "********".to_string()
    } else {
        format!("{visible}****")
    }
}

/// Load configuration from a file, with environment overrides
pub fn load_config(path: &Path) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let config: Config = settings.try_deserialize()?;
    Ok(config.with_env_fallbacks())
}

/// Get the default configuration (from env vars or defaults)
pub fn get_config() -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let config: Config = settings.try_deserialize()?;
    Ok(config.with_env_fallbacks())
}

/// Look for `sop-master.toml` in the working directory, then the user's
/// config directory (`~/.config/sop-master/` on Linux).
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("sop-master").join(CONFIG_FILE_NAME))
        .filter(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.access.max_usage_per_session, 10);
        assert!(!config.access.unlimited);
        assert_eq!(config.generation.model, "gemini-2.5-flash");
        assert_eq!(config.generation.timeout(), Duration::from_secs(120));
        assert_eq!(config.document.title, DEFAULT_TITLE);
        assert_eq!(config.max_usage(), Some(10));
    }

    #[test]
    fn test_unlimited_disables_quota() {
        let mut config = Config::default();
        config.access.unlimited = true;
        assert_eq!(config.max_usage(), None);
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sop-master.toml");
        std::fs::write(
            &path,
            r#"
[api_keys]
gemini = "file-key"

[access]
password = "vip"
purchase_link = "https://example.com/buy"
max_usage_per_session = 3

[generation]
model = "gemini-2.0-flash"
timeout_seconds = 30

[document]
title = "標準作業程序 (SOP)"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.api_keys.gemini.as_deref(), Some("file-key"));
        assert_eq!(config.access.password.as_deref(), Some("vip"));
        assert_eq!(config.max_usage(), Some(3));
        assert_eq!(config.generation.model, "gemini-2.0-flash");
        assert_eq!(config.generation.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.document.title, "標準作業程序 (SOP)");
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(load_config(Path::new("/nonexistent/sop-master.toml")).is_err());
    }

    #[test]
    fn test_redacted_masks_secrets() {
        let mut config = Config::default();
        config.api_keys.gemini = Some("AIzaSyExampleKey123".into());
        config.access.password = Some("short".into());

        let shown = config.redacted();
        assert_eq!(shown.api_keys.gemini.as_deref(), Some("AIza****"));
        assert_eq!(shown.access.password.as_deref(), Some("********"));
        // Source config untouched
        assert_eq!(config.access.password.as_deref(), Some("short"));
    }
}
