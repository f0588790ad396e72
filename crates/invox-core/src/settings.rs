//! Persisted user settings: the API credential and the preferred model.
//!
//! Settings live in a directory with one file per key, under two fixed names.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ConfigError;

/// Storage key for the API credential.
pub const API_KEY_SETTING: &str = "gemini_api_key";

/// Storage key for the preferred model.
pub const MODEL_SETTING: &str = "gemini_model";

/// Models the user can pick from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelChoice {
    /// Fast general-purpose multimodal model.
    #[default]
    #[serde(rename = "gemini-2.5-flash")]
    Flash,
    /// Highest-accuracy model, slower.
    #[serde(rename = "gemini-2.5-pro")]
    Pro,
    /// Cheapest and fastest, less robust on poor scans.
    #[serde(rename = "gemini-2.5-flash-lite")]
    FlashLite,
}

impl ModelChoice {
    /// All supported models, in display order.
    pub const ALL: [ModelChoice; 3] = [ModelChoice::Flash, ModelChoice::Pro, ModelChoice::FlashLite];

    /// Model identifier used in the API path.
    pub fn id(&self) -> &'static str {
        match self {
            ModelChoice::Flash => "gemini-2.5-flash",
            ModelChoice::Pro => "gemini-2.5-pro",
            ModelChoice::FlashLite => "gemini-2.5-flash-lite",
        }
    }

    /// Short description for listings.
    pub fn description(&self) -> &'static str {
        match self {
            ModelChoice::Flash => "balanced speed and accuracy",
            ModelChoice::Pro => "best accuracy on dense or messy invoices",
            ModelChoice::FlashLite => "fastest, cheapest",
        }
    }
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ModelChoice {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "gemini-2.5-flash" | "flash" => Ok(ModelChoice::Flash),
            "gemini-2.5-pro" | "pro" => Ok(ModelChoice::Pro),
            "gemini-2.5-flash-lite" | "flash-lite" | "lite" => Ok(ModelChoice::FlashLite),
            _ => Err(ConfigError::UnknownModel(s)),
        }
    }
}

/// Settings injected into every extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// API credential, if any.
    pub api_key: Option<String>,
    /// Model to call.
    pub model: ModelChoice,
}

impl Settings {
    /// Create settings with a credential and model.
    pub fn new(api_key: Option<String>, model: ModelChoice) -> Self {
        Self { api_key, model }
    }

    /// The credential, if present and not blank.
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Replace the credential when a non-blank `key` is given.
    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
        self
    }

    /// Replace the model when `model` is given.
    pub fn with_model(mut self, model: Option<ModelChoice>) -> Self {
        if let Some(model) = model {
            self.model = model;
        }
        self
    }
}

/// Directory-backed key/value store for settings.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    dir: PathBuf,
}

impl SettingsStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the settings files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    /// Read a raw value. Missing or blank entries read as `None`.
    pub fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path(key))
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Write a raw value.
    pub fn set(&self, key: &str, value: &str) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(key), value.trim())?;
        debug!("Stored setting {}", key);
        Ok(())
    }

    /// Remove a value. Removing an absent key is not an error.
    pub fn remove(&self, key: &str) -> std::io::Result<()> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Load both settings. An unrecognized stored model falls back to the default.
    pub fn load(&self) -> Settings {
        let model = match self.get(MODEL_SETTING) {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                warn!("Ignoring stored model: {}", e);
                ModelChoice::default()
            }),
            None => ModelChoice::default(),
        };

        Settings {
            api_key: self.get(API_KEY_SETTING),
            model,
        }
    }

    /// Persist the API credential.
    pub fn save_api_key(&self, key: &str) -> std::io::Result<()> {
        self.set(API_KEY_SETTING, key)
    }

    /// Forget the API credential.
    pub fn clear_api_key(&self) -> std::io::Result<()> {
        self.remove(API_KEY_SETTING)
    }

    /// Persist the preferred model.
    pub fn save_model(&self, model: ModelChoice) -> std::io::Result<()> {
        self.set(MODEL_SETTING, model.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_model_parsing() {
        assert_eq!("gemini-2.5-pro".parse::<ModelChoice>().unwrap(), ModelChoice::Pro);
        assert_eq!("Flash".parse::<ModelChoice>().unwrap(), ModelChoice::Flash);
        assert_eq!("lite".parse::<ModelChoice>().unwrap(), ModelChoice::FlashLite);
        assert!("gpt-4o".parse::<ModelChoice>().is_err());
    }

    #[test]
    fn test_model_display_roundtrips() {
        for model in ModelChoice::ALL {
            assert_eq!(model.to_string().parse::<ModelChoice>().unwrap(), model);
        }
    }

    #[test]
    fn test_empty_store_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("invox"));

        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn test_store_persists_both_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("invox"));

        store.save_api_key("  secret-key \n").unwrap();
        store.save_model(ModelChoice::Pro).unwrap();

        assert!(dir.path().join("invox").join(API_KEY_SETTING).exists());
        assert!(dir.path().join("invox").join(MODEL_SETTING).exists());

        let settings = SettingsStore::new(dir.path().join("invox")).load();
        assert_eq!(settings.api_key.as_deref(), Some("secret-key"));
        assert_eq!(settings.model, ModelChoice::Pro);

        store.clear_api_key().unwrap();
        store.clear_api_key().unwrap();
        assert_eq!(store.load().api_key, None);
    }

    #[test]
    fn test_unknown_stored_model_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        store.set(MODEL_SETTING, "gemini-1.0-ultra").unwrap();

        assert_eq!(store.load().model, ModelChoice::Flash);
    }

    #[test]
    fn test_blank_credential_is_absent() {
        let settings = Settings::new(Some("   ".to_string()), ModelChoice::Flash);
        assert_eq!(settings.credential(), None);

        let settings = settings.with_api_key(Some("k".to_string()));
        assert_eq!(settings.credential(), Some("k"));
    }

    #[test]
    fn test_blank_override_keeps_stored_key() {
        let stored = Settings::new(Some("stored-key".to_string()), ModelChoice::Flash);

        let settings = stored.clone().with_api_key(Some(String::new()));
        assert_eq!(settings.credential(), Some("stored-key"));

        let settings = stored.with_api_key(Some("  ".to_string()));
        assert_eq!(settings.credential(), Some("stored-key"));
    }
}
