// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shader fragment archive: the registry of function and parameter declarations.
//!
//! The archive itself is an external collaborator (it parses shader sources).
//! This module defines the descriptors it hands out, the [`FragmentArchive`]
//! trait the graph consumes, and [`MemoryArchive`], an in-memory registry used
//! by hosts that load declarations from elsewhere and by tests.

use crate::events::{ArchiveChange, ChangeHub};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Prefix of keys for parameters that live in the document, not a shader file
pub const LOCAL_ARCHIVE_PREFIX: &str = "LocalArchive";

/// Where a parameter node's values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SourceType {
    /// Per-material value, editable in the preview
    #[default]
    Material,
    /// Interpolated into the vertex shader
    InterpolatorIntoVertex,
    /// Interpolated into the pixel shader
    InterpolatorIntoPixel,
    /// Supplied by the engine
    System,
    /// Graph output
    Output,
    /// Literal constant
    Constant,
}

impl SourceType {
    /// All source types in declaration order
    pub const ALL: [SourceType; 6] = [
        SourceType::Material,
        SourceType::InterpolatorIntoVertex,
        SourceType::InterpolatorIntoPixel,
        SourceType::System,
        SourceType::Output,
        SourceType::Constant,
    ];

    /// Human-readable label shown in the role selector
    pub fn label(&self) -> &'static str {
        match self {
            SourceType::Material => "Material Parameter",
            SourceType::InterpolatorIntoVertex => "Interpolator Into Vertex Shader",
            SourceType::InterpolatorIntoPixel => "Interpolator Into Pixel Shader",
            SourceType::System => "System Parameter",
            SourceType::Output => "Output",
            SourceType::Constant => "Constant",
        }
    }

    /// Parse a label back; unrecognized labels map to `Material`
    pub fn from_label(label: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|s| s.label() == label)
            .unwrap_or(SourceType::Material)
    }

    /// Position in [`SourceType::ALL`]
    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or(0)
    }
}

/// A declared parameter (function argument, function output or struct member)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Declared type, e.g. `float3`
    #[serde(rename = "type")]
    pub type_name: String,
    /// Default value literal
    #[serde(default)]
    pub default: Option<String>,
    /// Archive-qualified key
    #[serde(default)]
    pub archive_name: String,
    /// Declared source
    #[serde(default)]
    pub source: SourceType,
}

impl Parameter {
    /// Create a parameter with no default
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            default: None,
            archive_name: String::new(),
            source: SourceType::Material,
        }
    }

    /// Set the default literal
    pub fn with_default(mut self, literal: impl Into<String>) -> Self {
        self.default = Some(literal.into());
        self
    }

    /// Set the archive key
    pub fn with_archive_name(mut self, archive_name: impl Into<String>) -> Self {
        self.archive_name = archive_name.into();
        self
    }

    /// Set the source
    pub fn with_source(mut self, source: SourceType) -> Self {
        self.source = source;
        self
    }
}

/// A shader function declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    /// Function name
    pub name: String,
    /// Input parameters
    #[serde(default)]
    pub inputs: Vec<Parameter>,
    /// Outputs (return value first, then out parameters)
    #[serde(default)]
    pub outputs: Vec<Parameter>,
}

impl Function {
    /// Parameter list summary, e.g. `(float3 normal, float roughness)`
    pub fn parameters_string(&self) -> String {
        let params: Vec<String> = self
            .inputs
            .iter()
            .map(|p| format!("{} {}", p.type_name, p.name))
            .collect();
        format!("({})", params.join(", "))
    }

    /// Type of the first output, empty when the function returns nothing
    pub fn return_type(&self) -> &str {
        self.outputs.first().map_or("", |p| p.type_name.as_str())
    }
}

/// A struct whose members are exposed as parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterStruct {
    /// Struct name
    pub name: String,
    /// Members
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl ParameterStruct {
    /// Body summary, e.g. `{ float3 color; float intensity; }`
    pub fn body_string(&self) -> String {
        if self.parameters.is_empty() {
            return "{ }".to_string();
        }
        let members: Vec<String> = self
            .parameters
            .iter()
            .map(|p| format!("{} {};", p.type_name, p.name))
            .collect();
        format!("{{ {} }}", members.join(" "))
    }
}

/// Everything the archive found in one shader source file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// Function declarations
    #[serde(default)]
    pub functions: Vec<Function>,
    /// Parameter struct declarations
    #[serde(default)]
    pub parameter_structs: Vec<ParameterStruct>,
    /// Parse failure message, if any
    #[serde(default)]
    pub exception_string: Option<String>,
}

impl Fragment {
    /// Placeholder for a source the archive could not load
    pub fn missing(path: &str) -> Self {
        Self {
            exception_string: Some(format!("Shader source not found: {path}")),
            ..Self::default()
        }
    }

    /// Find a function by name
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Find a parameter struct by name
    pub fn parameter_struct(&self, name: &str) -> Option<&ParameterStruct> {
        self.parameter_structs.iter().find(|s| s.name == name)
    }
}

/// Split `path:owner` into its parts at the last separator
pub fn split_archive_name(archive_name: &str) -> Option<(&str, &str)> {
    archive_name.rsplit_once(':')
}

/// The parameter name a key refers to: the bracketed name of a local key,
/// otherwise the part after the last separator
pub fn member_name(archive_name: &str) -> &str {
    if let Some(inner) = archive_name
        .strip_prefix(LOCAL_ARCHIVE_PREFIX)
        .and_then(|rest| rest.strip_prefix('['))
        .and_then(|rest| rest.strip_suffix(']'))
    {
        return inner;
    }
    split_archive_name(archive_name).map_or(archive_name, |(_, member)| member)
}

/// Registry of shader function and parameter declarations
pub trait FragmentArchive: Send + Sync {
    /// Declarations in the shader source at `path`. Never fails; a source that
    /// cannot be loaded yields an empty fragment carrying an exception string.
    fn fragment(&self, path: &str) -> Arc<Fragment>;

    /// Resolve an archive-qualified key to its declaration
    fn parameter(&self, archive_name: &str) -> Option<Parameter> {
        resolve_member(self, archive_name)
    }

    /// Move a parameter to a new key. Archives that cannot be edited return false.
    fn rename_parameter(&self, _old: &str, _new: &str) -> bool {
        false
    }

    /// Change notifications for this archive
    fn changes(&self) -> &ChangeHub;
}

/// Resolve `path:Owner:member` through the fragment at `path`.
///
/// `Owner` may be a parameter struct (member lookup) or a function (inputs,
/// then outputs). The returned parameter carries the full key.
pub fn resolve_member<A: FragmentArchive + ?Sized>(
    archive: &A,
    archive_name: &str,
) -> Option<Parameter> {
    let (owner, member) = split_archive_name(archive_name)?;
    let (path, owner_name) = split_archive_name(owner)?;
    let fragment = archive.fragment(path);

    let found = if let Some(s) = fragment.parameter_struct(owner_name) {
        s.parameters.iter().find(|p| p.name == member)
    } else if let Some(f) = fragment.function(owner_name) {
        f.inputs
            .iter()
            .chain(f.outputs.iter())
            .find(|p| p.name == member)
    } else {
        None
    };

    found.map(|p| p.clone().with_archive_name(archive_name))
}

/// Convert a display name into a valid shader identifier
pub fn identifier_safe_name(input: &str) -> String {
    let mut safe: String = input
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if !safe.chars().next().is_some_and(char::is_alphabetic) {
        safe.insert(0, '_');
    }
    safe
}

/// In-memory archive
#[derive(Debug, Default)]
pub struct MemoryArchive {
    fragments: RwLock<HashMap<String, Arc<Fragment>>>,
    /// Parameters keyed directly by archive name (document-local parameters)
    parameters: RwLock<HashMap<String, Parameter>>,
    changes: ChangeHub,
}

impl MemoryArchive {
    /// Create an empty archive
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the declarations for a shader source, notifying subscribers
    pub fn insert_fragment(&self, path: impl Into<String>, fragment: Fragment) {
        let path = path.into();
        self.fragments.write().insert(path.clone(), Arc::new(fragment));
        self.changes.publish(ArchiveChange::FragmentChanged(path));
    }

    /// Add a standalone parameter under its own archive name
    pub fn insert_parameter(&self, parameter: Parameter) {
        self.parameters
            .write()
            .insert(parameter.archive_name.clone(), parameter);
    }

    /// Paths of all loaded sources
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.fragments.read().keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Whether a source is loaded
    pub fn contains(&self, path: &str) -> bool {
        self.fragments.read().contains_key(path)
    }
}

impl FragmentArchive for MemoryArchive {
    fn fragment(&self, path: &str) -> Arc<Fragment> {
        self.fragments
            .read()
            .get(path)
            .cloned()
            .unwrap_or_else(|| Arc::new(Fragment::missing(path)))
    }

    fn parameter(&self, archive_name: &str) -> Option<Parameter> {
        if let Some(p) = self.parameters.read().get(archive_name) {
            return Some(p.clone());
        }
        resolve_member(self, archive_name)
    }

    fn rename_parameter(&self, old: &str, new: &str) -> bool {
        let renamed = {
            let mut parameters = self.parameters.write();
            match parameters.remove(old) {
                Some(mut p) => {
                    p.archive_name = new.to_string();
                    p.name = member_name(new).to_string();
                    parameters.insert(new.to_string(), p);
                    true
                }
                None => false,
            }
        };

        if renamed {
            self.changes.publish(ArchiveChange::ParameterRenamed {
                old: old.to_string(),
                new: new.to_string(),
            });
        }
        renamed
    }

    fn changes(&self) -> &ChangeHub {
        &self.changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lighting() -> Fragment {
        Fragment {
            functions: vec![Function {
                name: "Lambert".to_string(),
                inputs: vec![
                    Parameter::new("normal", "float3"),
                    Parameter::new("lightDir", "float3"),
                ],
                outputs: vec![Parameter::new("result", "float")],
            }],
            parameter_structs: vec![ParameterStruct {
                name: "Surface".to_string(),
                parameters: vec![
                    Parameter::new("color", "float3").with_default("{1, 1, 1}"),
                    Parameter::new("roughness", "float"),
                ],
            }],
            exception_string: None,
        }
    }

    #[test]
    fn test_source_type_labels_round_trip() {
        for source in SourceType::ALL {
            assert_eq!(SourceType::from_label(source.label()), source);
        }
        assert_eq!(SourceType::from_label("nonsense"), SourceType::Material);
        assert_eq!(SourceType::Output.index(), 4);
    }

    #[test]
    fn test_summaries() {
        let fragment = lighting();
        let f = fragment.function("Lambert").unwrap();
        assert_eq!(f.parameters_string(), "(float3 normal, float3 lightDir)");
        assert_eq!(f.return_type(), "float");

        let s = fragment.parameter_struct("Surface").unwrap();
        assert_eq!(s.body_string(), "{ float3 color; float roughness; }");
    }

    #[test]
    fn test_resolve_struct_and_function_members() {
        let archive = MemoryArchive::new();
        archive.insert_fragment("lighting.h", lighting());

        let color = archive.parameter("lighting.h:Surface:color").unwrap();
        assert_eq!(color.type_name, "float3");
        assert_eq!(color.archive_name, "lighting.h:Surface:color");

        let result = archive.parameter("lighting.h:Lambert:result").unwrap();
        assert_eq!(result.type_name, "float");

        assert!(archive.parameter("lighting.h:Surface:missing").is_none());
        assert!(archive.parameter("other.h:Surface:color").is_none());
        assert!(archive.parameter("no-separator").is_none());
    }

    #[test]
    fn test_missing_fragment_reports_exception() {
        let archive = MemoryArchive::new();
        let fragment = archive.fragment("nowhere.h");
        assert!(fragment.functions.is_empty());
        assert!(fragment.exception_string.is_some());
    }

    #[test]
    fn test_rename_standalone_parameter_notifies() {
        let archive = MemoryArchive::new();
        let changes = archive.changes().subscribe();
        archive.insert_parameter(
            Parameter::new("Tint", "float3").with_archive_name("LocalArchive[Tint]"),
        );

        assert!(archive.rename_parameter("LocalArchive[Tint]", "LocalArchive[Shade]"));
        assert!(archive.parameter("LocalArchive[Tint]").is_none());
        assert_eq!(archive.parameter("LocalArchive[Shade]").unwrap().name, "Shade");
        assert!(!archive.rename_parameter("LocalArchive[Tint]", "x"));

        assert_eq!(
            changes.poll(),
            vec![ArchiveChange::ParameterRenamed {
                old: "LocalArchive[Tint]".to_string(),
                new: "LocalArchive[Shade]".to_string(),
            }]
        );
    }

    #[test]
    fn test_member_name() {
        assert_eq!(member_name("LocalArchive[Tint]"), "Tint");
        assert_eq!(member_name("lighting.h:Surface:color"), "color");
        assert_eq!(member_name("plain"), "plain");
    }

    #[test]
    fn test_identifier_safe_name() {
        assert_eq!(identifier_safe_name("Base Color"), "Base_Color");
        assert_eq!(identifier_safe_name("2ndLayer"), "_2ndLayer");
        assert_eq!(identifier_safe_name("roughness"), "roughness");
        assert_eq!(identifier_safe_name(""), "_");
    }
}
