//! Configuration file support for sop-master.
//!
//! # Configuration File Format
//!
//! ```toml
//! [api_keys]
//! gemini = "your-gemini-api-key"
//!
//! [access]
//! password = "shared-secret"
//! purchase_link = "https://example.com/buy"
//! max_usage_per_session = 10
//! unlimited = false
//!
//! [generation]
//! model = "gemini-2.5-flash"
//! base_url = "https://generativelanguage.googleapis.com/v1beta"
//! timeout_seconds = 120
//!
//! [document]
//! title = "Standard Operating Procedure"
//!
//! [logging]
//! level = "info"
//! ```

use std::path::Path;

use super::Config;

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("Config file already exists: {0}")]
    AlreadyExists(String),
}

/// Default configuration rendered as TOML. Secrets are left out so a fresh
/// file never contains credentials.
pub fn default_config_toml() -> Result<String, ConfigFileError> {
    toml::to_string_pretty(&Config::default())
        .map_err(|e| ConfigFileError::Serialize(e.to_string()))
}

/// Save configuration to a TOML file, refusing to overwrite unless `force`.
pub fn save_config(path: &Path, config: &Config, force: bool) -> Result<(), ConfigFileError> {
    if path.exists() && !force {
        return Err(ConfigFileError::AlreadyExists(path.display().to_string()));
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigFileError::Serialize(e.to_string()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConfigFileError::Io(e.to_string()))?;
    }
    std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;
    use tempfile::tempdir;

    #[test]
    fn test_default_toml_has_sections() {
        let toml = default_config_toml().unwrap();
        assert!(toml.contains("[access]"));
        assert!(toml.contains("max_usage_per_session = 10"));
        assert!(toml.contains("[generation]"));
        assert!(!toml.contains("password"));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("sop-master.toml");

        let mut config = Config::default();
        config.access.max_usage_per_session = 4;
        config.document.title = "SOP".into();
        save_config(&path, &config, false).unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.access.max_usage_per_session, 4);
        assert_eq!(loaded.document.title, "SOP");
    }

    #[test]
    fn test_save_refuses_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sop-master.toml");
        std::fs::write(&path, "").unwrap();

        let err = save_config(&path, &Config::default(), false).unwrap_err();
        assert!(matches!(err, ConfigFileError::AlreadyExists(_)));
        assert!(save_config(&path, &Config::default(), true).is_ok());
    }
}
