//! Mixer configuration
//!
//! Loaded from TOML. Missing fields fall back to defaults.

use crate::error::{Error, MixerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Standard configuration paths
pub const CONFIG_DIR: &str = "/etc/hwstate";
pub const CONFIG_FILE: &str = "sound.toml";

/// Environment variable overriding the configured card
pub const CARD_ENV: &str = "HWSTATE_SOUND_CARD";

/// Sound mixer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixerConfig {
    /// ALSA card passed to `amixer -c`
    #[serde(default = "default_card")]
    pub card: String,

    /// Path to `amixer`; searched on `PATH` when unset
    #[serde(default)]
    pub amixer_path: Option<PathBuf>,

    /// Control resolved by `Mixer::default_control`
    #[serde(default = "default_control")]
    pub default_control: String,

    /// Recommended pause between mutating operations on one control (ms)
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
}

fn default_card() -> String {
    "default".to_string()
}

fn default_control() -> String {
    "Master".to_string()
}

fn default_pacing_ms() -> u64 {
    100
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            card: default_card(),
            amixer_path: None,
            default_control: default_control(),
            pacing_ms: default_pacing_ms(),
        }
    }
}

impl MixerConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&contents)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load_default() -> Result<Self> {
        for path in Self::search_paths() {
            if path.exists() {
                tracing::info!("Loading mixer configuration from {}", path.display());
                return Self::load(&path);
            }
        }

        tracing::warn!("No mixer configuration found, using defaults");
        let mut config = Self::default();
        config.apply_env();
        Ok(config)
    }

    /// User config first, then system config
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(home) = std::env::var_os("HOME") {
            paths.push(
                PathBuf::from(home)
                    .join(".config")
                    .join("hwstate")
                    .join(CONFIG_FILE),
            );
        }
        paths.push(Path::new(CONFIG_DIR).join(CONFIG_FILE));
        paths
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::new(MixerError::Config(e.to_string())))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Pause callers should insert between back-to-back writes to one control
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    fn apply_env(&mut self) {
        if let Ok(card) = std::env::var(CARD_ENV) {
            if !card.is_empty() {
                self.card = card;
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.card.trim().is_empty() {
            return Err(MixerError::Config("card must not be empty".into()).into());
        }
        if self.default_control.trim().is_empty() {
            return Err(MixerError::Config("default_control must not be empty".into()).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = MixerConfig::default();
        assert_eq!(config.card, "default");
        assert_eq!(config.default_control, "Master");
        assert_eq!(config.pacing(), Duration::from_millis(100));
        assert!(config.amixer_path.is_none());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: MixerConfig = toml::from_str("default_control = \"PCM\"").unwrap();
        assert_eq!(config.default_control, "PCM");
        assert_eq!(config.card, "default");
        assert_eq!(config.pacing_ms, 100);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let config = MixerConfig {
            card: "hw:1".into(),
            amixer_path: Some("/usr/bin/amixer".into()),
            default_control: "Speaker".into(),
            pacing_ms: 250,
        };
        config.save(&path).unwrap();

        let loaded = MixerConfig::load(&path).unwrap();
        assert_eq!(loaded.amixer_path, config.amixer_path);
        assert_eq!(loaded.default_control, "Speaker");
        assert_eq!(loaded.pacing(), Duration::from_millis(250));
    }

    #[test]
    fn test_empty_control_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "default_control = \"\"").unwrap();

        let err = MixerConfig::load(&path).unwrap_err();
        assert!(matches!(err.kind(), MixerError::Config(_)));
    }

    #[test]
    fn test_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "pacing_ms = \"soon\"").unwrap();

        let err = MixerConfig::load(&path).unwrap_err();
        assert!(matches!(err.kind(), MixerError::TomlParse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = MixerConfig::load(Path::new("/nonexistent/sound.toml")).unwrap_err();
        assert!(matches!(err.kind(), MixerError::Io(_)));
    }

    #[test]
    fn test_search_paths_end_with_system_config() {
        let paths = MixerConfig::search_paths();
        assert_eq!(paths.last().unwrap(), &Path::new(CONFIG_DIR).join(CONFIG_FILE));
    }
}
