//! Subcommands and the context they share.

pub mod batch;
pub mod config;
pub mod extract;
pub mod key;
pub mod models;
pub mod output;

use std::path::PathBuf;

use tracing::debug;

use invox_core::models::config::InvoxConfig;
use invox_core::settings::{ModelChoice, Settings, SettingsStore};

/// Environment variable consulted for the API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Global options passed down to every command.
pub struct Context {
    /// Explicit config file, if given.
    pub config_path: Option<PathBuf>,
    /// Explicit settings directory, if given.
    pub data_dir: Option<PathBuf>,
}

impl Context {
    /// Path of the config file in effect.
    pub fn config_path(&self) -> PathBuf {
        self.config_path.clone().unwrap_or_else(default_config_path)
    }

    /// Load the config file: the explicit one must exist, the default one may not.
    pub fn load_config(&self) -> anyhow::Result<InvoxConfig> {
        if let Some(path) = &self.config_path {
            return InvoxConfig::from_file(path).map_err(|e| {
                anyhow::anyhow!("Failed to load config {}: {}", path.display(), e)
            });
        }

        let path = default_config_path();
        if path.exists() {
            debug!("Loading config from {}", path.display());
            Ok(InvoxConfig::from_file(&path)?)
        } else {
            Ok(InvoxConfig::default())
        }
    }

    /// Store holding the credential and model preference.
    pub fn settings_store(&self) -> SettingsStore {
        SettingsStore::new(self.data_dir.clone().unwrap_or_else(default_data_dir))
    }

    /// Stored settings overridden by the command line and the environment.
    ///
    /// Credential precedence: flag, then `GEMINI_API_KEY`, then the store.
    pub fn resolve_settings(
        &self,
        api_key: Option<String>,
        model: Option<ModelChoice>,
    ) -> Settings {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty());
        self.settings_store()
            .load()
            .with_api_key(api_key)
            .with_model(model)
    }
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("invox")
        .join("config.json")
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("invox")
}

/// Parse a model name for clap.
pub fn parse_model(s: &str) -> Result<ModelChoice, String> {
    s.parse::<ModelChoice>().map_err(|e| {
        let known: Vec<&str> = ModelChoice::ALL.iter().map(|m| m.id()).collect();
        format!("{} (expected one of: {})", e, known.join(", "))
    })
}
