// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor configuration, persisted as RON.

use serde::{Deserialize, Serialize};
use shaderpatch_browser::TreeModelConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Config file used when none is given on the command line
pub const DEFAULT_CONFIG_FILE: &str = "shaderpatch.ron";

/// Errors from loading or saving the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the file failed
    #[error("IO error on {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
    /// The file is not valid RON for [`EditorConfig`]
    #[error("Invalid config {path}: {source}")]
    Parse {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: ron::error::SpannedError,
    },
    /// The config could not be serialized
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
}

/// Host settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Directory the archive tree starts at
    pub archive_root: String,
    /// Shader source extensions shown in the tree (case-insensitive)
    pub extensions: Vec<String>,
    /// RON manifest of shader declarations
    pub manifest: PathBuf,
    /// File watcher debounce, in milliseconds
    pub debounce_ms: u64,
    /// Watch the archive root and manifest for changes
    pub watch: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        let tree = TreeModelConfig::default();
        Self {
            archive_root: tree.root,
            extensions: tree.extensions,
            manifest: PathBuf::from("shaderpatch_manifest.ron"),
            debounce_ms: 250,
            watch: false,
        }
    }
}

impl EditorConfig {
    /// Load the config at `path`. A missing file yields the defaults, which
    /// are written out so they can be edited.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config at {}; writing defaults", path.display());
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = ron::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write the config to `path`
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let pretty = ron::ser::PrettyConfig::default().struct_names(true);
        let content = ron::ser::to_string_pretty(self, pretty)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Settings for the archive tree
    pub fn tree_config(&self) -> TreeModelConfig {
        TreeModelConfig {
            root: self.archive_root.clone(),
            extensions: self.extensions.clone(),
        }
    }

    /// Watcher debounce as a duration
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("shaderpatch-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.archive_root, "game/xleres/");
        assert_eq!(config.extensions.len(), 6);
        assert_eq!(config.debounce(), Duration::from_millis(250));
        assert_eq!(config.tree_config(), TreeModelConfig::default());
    }

    #[test]
    fn test_missing_file_writes_defaults() {
        let dir = temp_dir();
        let path = dir.join(DEFAULT_CONFIG_FILE);

        let config = EditorConfig::load_or_create(&path).unwrap();
        assert_eq!(config, EditorConfig::default());
        assert!(path.exists());

        let reloaded = EditorConfig::load_or_create(&path).unwrap();
        assert_eq!(reloaded, config);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = temp_dir();
        let path = dir.join("partial.ron");
        std::fs::write(&path, "(archive_root: \"shaders/\", watch: true)").unwrap();

        let config = EditorConfig::load_or_create(&path).unwrap();
        assert_eq!(config.archive_root, "shaders/");
        assert!(config.watch);
        assert_eq!(config.debounce_ms, 250);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = temp_dir();
        let path = dir.join("broken.ron");
        std::fs::write(&path, "(archive_root: ").unwrap();

        let err = EditorConfig::load_or_create(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
