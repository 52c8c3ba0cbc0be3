use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::planner::DEFAULT_SEQUENCE_DIGITS;

/// User defaults, loaded from the platform config directory. Every field has
/// a default so a partial file is fine and a missing file means defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Naming scheme used when `rename` is run without `--scheme`.
    pub scheme: String,
    pub sequence_digits: u8,
    /// Whether `build` descends into subdirectories by default.
    pub recursive: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scheme: "{date}_{camera_model}_{basename}".to_string(),
            sequence_digits: DEFAULT_SEQUENCE_DIGITS,
            recursive: true,
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "shotgroup").map(|dirs| dirs.config_dir().join("config.toml"))
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("failed to parse config: {}", path.display()))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create config directory: {}", parent.display())
            })?;
        }
        let text = toml::to_string_pretty(self).context("failed to serialize config")?;
        fs::write(path, text)
            .with_context(|| format!("failed to write config: {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::AppConfig;
    use tempfile::tempdir;

    #[test]
    fn defaults_are_sensible() {
        let config = AppConfig::default();
        assert_eq!(config.scheme, "{date}_{camera_model}_{basename}");
        assert_eq!(config.sequence_digits, 3);
        assert!(config.recursive);
    }

    #[test]
    fn save_and_load_round_trip() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("conf/config.toml");

        let config = AppConfig {
            scheme: "{datetime}_{sequence}".to_string(),
            sequence_digits: 4,
            recursive: false,
        };
        config.save_to(&path).expect("save");
        assert_eq!(AppConfig::load_from(&path).expect("load"), config);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "sequence_digits = 2\n").expect("write");

        let config = AppConfig::load_from(&path).expect("load");
        assert_eq!(config.sequence_digits, 2);
        assert_eq!(config.scheme, AppConfig::default().scheme);
    }
}
