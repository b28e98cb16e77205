//! TOML configuration for the analyzer, recorder, player and view
//!
//! Every section and field is optional; anything missing takes its default.

use crate::audio::{PlayerConfig, RecorderConfig};
use crate::spectrum::{AnalyzerConfig, ConfigError};
use crate::view::BarStyle;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigFileError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub analyzer: AnalyzerConfig,
    pub recorder: RecorderConfig,
    pub player: PlayerConfig,
    pub view: BarStyle,
}

impl AppConfig {
    /// Parse and validate a config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigFileError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml(&contents)?;
        log::info!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Load `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigFileError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigFileError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigFileError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the config, creating parent directories as needed
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigFileError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_toml()?)?;
        log::info!("Saved config to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analyzer.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::Align;
    use tempfile::tempdir;

    #[test]
    fn test_empty_file_gives_defaults() {
        assert_eq!(AppConfig::from_toml("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = AppConfig::from_toml(
            r#"
            [analyzer]
            frequency_bands = 40
            window_type = "blackman"

            [recorder]
            channels = 2

            [view]
            align = "bottom"
            "#,
        )
        .unwrap();

        assert_eq!(config.analyzer.frequency_bands, 40);
        assert_eq!(config.analyzer.fft_size, 2048);
        assert_eq!(config.recorder.channels, 2);
        assert_eq!(config.recorder.file_name, "recording");
        assert_eq!(config.view.align, Align::Bottom);
        assert_eq!(config.player.progress_interval_ms, 100);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = AppConfig::from_toml("[analyzer]\nstart_frequency = 20000.0\n").unwrap_err();
        assert!(matches!(err, ConfigFileError::Invalid(_)));

        let err = AppConfig::from_toml("[analyzer\n").unwrap_err();
        assert!(matches!(err, ConfigFileError::Parse(_)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conf").join("record-spectrum.toml");

        let mut config = AppConfig::default();
        config.analyzer.smoothing = 0.25;
        config.player.sample_rate = Some(44100);
        config.save(&path).unwrap();

        assert_eq!(AppConfig::load(&path).unwrap(), config);
        assert!(AppConfig::load(dir.path().join("missing.toml")).is_err());
        assert_eq!(AppConfig::load_or_default(None).unwrap(), AppConfig::default());
    }
}
