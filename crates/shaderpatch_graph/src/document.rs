// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shader document state shared with the property grid.

use crate::type_rules::ParamValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A material parameter exposed for preview editing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialParameter {
    /// Name shown in the property grid
    pub display_name: String,
    /// Current value
    pub value: ParamValue,
}

/// Per-document editing state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShaderDocument {
    /// Material parameters keyed by archive name
    pub preview_material_state: IndexMap<String, MaterialParameter>,
    /// Unsaved changes
    pub dirty: bool,
}

impl ShaderDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a material parameter by archive name
    pub fn material_value(&self, archive_name: &str) -> Option<&ParamValue> {
        self.preview_material_state.get(archive_name).map(|p| &p.value)
    }

    /// Overwrite a material parameter's value. Returns false for unknown keys.
    pub fn set_material_value(&mut self, archive_name: &str, value: ParamValue) -> bool {
        match self.preview_material_state.get_mut(archive_name) {
            Some(p) => {
                p.value = value;
                self.dirty = true;
                true
            }
            None => false,
        }
    }
}
