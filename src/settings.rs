//! Editor settings with persistence
//!
//! Settings are saved to `~/.config/ember/settings.toml`

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use ember_import::ModelImportSettings;
use serde::{Deserialize, Serialize};
use tracing::{info, warn, Level};

/// All editor settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub logging: LoggingSettings,
    /// Defaults for model imports without a `.meta` file
    pub model: ModelImportSettings,
}

impl EditorSettings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ember"))
    }

    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.toml"))
    }

    /// Load settings from the config directory, or return defaults
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => {
                warn!("Could not determine config directory");
                Self::default()
            }
        }
    }

    /// Load settings from `path`, falling back to defaults if the file is
    /// missing or invalid
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("No settings file found, using defaults");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(settings) => {
                    info!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse settings: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read settings file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Save settings to the config directory
    pub fn save(&self) -> anyhow::Result<()> {
        let Some(path) = Self::settings_path() else {
            anyhow::bail!("Could not determine config directory");
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("Failed to create config directory")?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, content).context("Failed to write settings file")?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Maximum level: trace, debug, info, warn or error
    pub level: String,
    /// Include the module path in each line
    pub show_target: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            show_target: false,
        }
    }
}

impl LoggingSettings {
    /// The configured level, `INFO` if it doesn't parse
    pub fn max_level(&self) -> Level {
        self.level.parse().unwrap_or(Level::INFO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = EditorSettings::load_from(&dir.path().join("settings.toml"));
        assert_eq!(settings, EditorSettings::default());
    }

    #[test]
    fn invalid_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[logging\nlevel = ").unwrap();
        assert_eq!(EditorSettings::load_from(&path), EditorSettings::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[model]\nflip_uvs = true\n").unwrap();

        let settings = EditorSettings::load_from(&path);
        assert!(settings.model.flip_uvs);
        assert!(settings.model.generate_normals);
        assert_eq!(settings.logging, LoggingSettings::default());
    }

    #[test]
    fn saved_settings_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");
        let mut settings = EditorSettings::default();
        settings.logging.level = "debug".into();
        settings.model.unit_scale = 0.01;
        settings.save_to(&path).unwrap();

        let loaded = EditorSettings::load_from(&path);
        assert_eq!(loaded, settings);
        assert_eq!(loaded.logging.max_level(), Level::DEBUG);
    }

    #[test]
    fn unknown_level_falls_back_to_info() {
        let logging = LoggingSettings {
            level: "chatty".into(),
            ..Default::default()
        };
        assert_eq!(logging.max_level(), Level::INFO);
    }
}
