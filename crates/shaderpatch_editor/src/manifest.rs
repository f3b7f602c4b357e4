// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shader declarations loaded from a RON manifest.
//!
//! The manifest stands in for a shader parser: it maps each source path to
//! the functions and parameter structs it declares, plus any standalone
//! parameters owned by the document.

use serde::{Deserialize, Serialize};
use shaderpatch_graph::{Fragment, MemoryArchive, Parameter};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from loading a manifest
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Reading the file failed
    #[error("Failed to read manifest {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
    /// The file is not a valid manifest
    #[error("Invalid manifest {path}: {source}")]
    Parse {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: ron::error::SpannedError,
    },
}

/// Contents of a manifest file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderManifest {
    /// Declarations keyed by source path
    pub fragments: BTreeMap<String, Fragment>,
    /// Standalone parameters, keyed by their own archive name
    pub parameters: Vec<Parameter>,
}

impl ShaderManifest {
    /// Read and parse a manifest file
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse manifest text
    pub fn parse(content: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(content)
    }

    /// Load every declaration into `archive`. Each source published as changed.
    pub fn install(&self, archive: &MemoryArchive) {
        for (path, fragment) in &self.fragments {
            archive.insert_fragment(path.clone(), fragment.clone());
        }
        for parameter in &self.parameters {
            archive.insert_parameter(parameter.clone());
        }
        tracing::info!(
            "Installed {} shader source(s) and {} standalone parameter(s)",
            self.fragments.len(),
            self.parameters.len()
        );
    }
}
