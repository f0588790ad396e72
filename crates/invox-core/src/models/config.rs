//! Configuration structures for the extraction pipeline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, InvoxError};

/// Main configuration for invox.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoxConfig {
    /// Model API configuration.
    pub api: ApiConfig,

    /// Extraction and validation configuration.
    pub extraction: ExtractionConfig,
}

/// Model API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the generative language API.
    pub endpoint: String,

    /// Transport timeout in seconds.
    pub timeout_secs: u64,

    /// User agent sent with each request.
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_secs: 120,
            user_agent: format!("invox/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Extraction and reconciliation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Absolute tolerance when comparing totals, in currency units.
    #[serde(with = "rust_decimal::serde::float")]
    pub tolerance: Decimal,

    /// Currency code shown when the extracted one is unusable.
    pub default_currency: String,

    /// Largest file accepted for inline upload, in bytes.
    pub max_image_bytes: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            tolerance: Decimal::new(1, 2),
            default_currency: "USD".to_string(),
            max_image_bytes: 20 * 1024 * 1024,
        }
    }
}

impl InvoxConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, InvoxError> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)
            .map_err(|e| ConfigError::Invalid(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: InvoxConfig =
            serde_json::from_str(r#"{"extraction": {"tolerance": 0.05}}"#).unwrap();
        assert_eq!(config.extraction.tolerance, Decimal::new(5, 2));
        assert_eq!(config.extraction.default_currency, "USD");
        assert_eq!(config.api.timeout_secs, 120);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = InvoxConfig::default();
        config.api.timeout_secs = 30;
        config.save(&path).unwrap();

        let loaded = InvoxConfig::from_file(&path).unwrap();
        assert_eq!(loaded.api.timeout_secs, 30);
        assert_eq!(loaded.extraction.tolerance, Decimal::new(1, 2));
    }

    #[test]
    fn test_malformed_file_is_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"api": {"timeout_secs": "soon"}}"#).unwrap();

        let err = InvoxConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, InvoxError::Config(ConfigError::Invalid(_))));

        let missing = InvoxConfig::from_file(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(missing, InvoxError::Io(_)));
    }
}
