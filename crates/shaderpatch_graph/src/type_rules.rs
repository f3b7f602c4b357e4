// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shader type rules: automatic conversions and typed parameter values.

use serde::{Deserialize, Serialize};

/// Scalar base of a shader type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseType {
    /// `bool`
    Bool,
    /// `int`
    Int,
    /// `uint` / `dword`
    UInt,
    /// `half`
    Half,
    /// `float`
    Float,
    /// `double`
    Double,
}

impl BaseType {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "bool" => Some(Self::Bool),
            "int" => Some(Self::Int),
            "uint" | "dword" => Some(Self::UInt),
            "half" => Some(Self::Half),
            "float" => Some(Self::Float),
            "double" => Some(Self::Double),
            _ => None,
        }
    }

    /// Whether values of this base convert numerically
    pub fn is_numeric(self) -> bool {
        !matches!(self, Self::Bool)
    }
}

/// A parsed scalar, vector or matrix type such as `float`, `float3` or `float3x3`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShaderType {
    /// Scalar base
    pub base: BaseType,
    /// Row count (1 for scalars and vectors)
    pub rows: u8,
    /// Column count (component count for vectors)
    pub columns: u8,
}

impl ShaderType {
    /// Parse a type name; `None` for anything that is not a numeric/bool type
    pub fn parse(type_name: &str) -> Option<Self> {
        let name = type_name.trim().to_ascii_lowercase();
        let split = name
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(name.len());
        let (base_name, dims) = name.split_at(split);
        let base = BaseType::parse(base_name)?;

        let (rows, columns) = match dims.split_once('x') {
            Some((r, c)) => (parse_dimension(r)?, parse_dimension(c)?),
            None if dims.is_empty() => (1, 1),
            None => (1, parse_dimension(dims)?),
        };
        Some(Self { base, rows, columns })
    }

    /// Total component count
    pub fn components(&self) -> usize {
        usize::from(self.rows) * usize::from(self.columns)
    }

    /// Single component
    pub fn is_scalar(&self) -> bool {
        self.rows == 1 && self.columns == 1
    }

    /// One row of two or more components
    pub fn is_vector(&self) -> bool {
        self.rows == 1 && self.columns > 1
    }
}

fn parse_dimension(text: &str) -> Option<u8> {
    match text.parse::<u8>() {
        Ok(n @ 1..=4) => Some(n),
        _ => None,
    }
}

/// A typed parameter value, as held by the preview material state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    /// No value (unknown type)
    None,
    /// Boolean components
    Bool(Vec<bool>),
    /// Signed integer components
    Int(Vec<i32>),
    /// Unsigned integer components
    UInt(Vec<u32>),
    /// Floating point components, row-major for matrices
    Float(Vec<f32>),
}

impl ParamValue {
    /// Number of components
    pub fn len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Bool(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::UInt(v) => v.len(),
            Self::Float(v) => v.len(),
        }
    }

    /// Whether there are no components
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Type rules consulted by the compatibility checker and the synchronizer
pub trait TypeRules: Send + Sync {
    /// Whether `from` converts to `to` without an explicit cast
    fn has_automatic_conversion(&self, from: &str, to: &str) -> bool;

    /// Parse a default-value literal for a type
    fn create_from_string(&self, literal: &str, type_name: &str) -> Option<ParamValue>;

    /// Zero value for a type
    fn create_default_object(&self, type_name: &str) -> ParamValue;
}

/// HLSL-style type rules.
///
/// Automatic conversions: numeric base changes at the same shape, scalar
/// broadcast to any shape, and vector truncation to a narrower vector.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShaderTypeRules;

impl ShaderTypeRules {
    /// Create the rules
    pub fn new() -> Self {
        Self
    }
}

impl TypeRules for ShaderTypeRules {
    fn has_automatic_conversion(&self, from: &str, to: &str) -> bool {
        let (Some(from), Some(to)) = (ShaderType::parse(from), ShaderType::parse(to)) else {
            return false;
        };
        if from == to {
            return true;
        }
        let bases_convert = from.base == to.base || (from.base.is_numeric() && to.base.is_numeric());
        if !bases_convert {
            return false;
        }

        if from.rows == to.rows && from.columns == to.columns {
            return true;
        }
        if from.is_scalar() {
            return true;
        }
        from.is_vector() && to.is_vector() && to.columns < from.columns
    }

    fn create_from_string(&self, literal: &str, type_name: &str) -> Option<ParamValue> {
        let ty = ShaderType::parse(type_name)?;
        let body = strip_constructor(literal.trim());
        let parts: Vec<&str> = body
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect();

        let count = ty.components();
        let parts: Vec<&str> = match parts.len() {
            1 => vec![parts[0]; count],
            n if n == count => parts,
            _ => return None,
        };

        match ty.base {
            BaseType::Bool => parts
                .iter()
                .map(|s| parse_bool(s))
                .collect::<Option<Vec<_>>>()
                .map(ParamValue::Bool),
            BaseType::Int => parts
                .iter()
                .map(|s| s.parse::<i32>().ok())
                .collect::<Option<Vec<_>>>()
                .map(ParamValue::Int),
            BaseType::UInt => parts
                .iter()
                .map(|s| s.trim_end_matches(['u', 'U']).parse::<u32>().ok())
                .collect::<Option<Vec<_>>>()
                .map(ParamValue::UInt),
            BaseType::Half | BaseType::Float | BaseType::Double => parts
                .iter()
                .map(|s| s.trim_end_matches(['f', 'F', 'h', 'H']).parse::<f32>().ok())
                .collect::<Option<Vec<_>>>()
                .map(ParamValue::Float),
        }
    }

    fn create_default_object(&self, type_name: &str) -> ParamValue {
        let Some(ty) = ShaderType::parse(type_name) else {
            return ParamValue::None;
        };
        let count = ty.components();
        match ty.base {
            BaseType::Bool => ParamValue::Bool(vec![false; count]),
            BaseType::Int => ParamValue::Int(vec![0; count]),
            BaseType::UInt => ParamValue::UInt(vec![0; count]),
            BaseType::Half | BaseType::Float | BaseType::Double => {
                ParamValue::Float(vec![0.0; count])
            }
        }
    }
}

/// `float3(1, 2, 3)` and `{1, 2, 3}` both become `1, 2, 3`
fn strip_constructor(literal: &str) -> &str {
    if let Some(inner) = literal.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
        return inner;
    }
    if let (Some(open), true) = (literal.find('('), literal.ends_with(')')) {
        return &literal[open + 1..literal.len() - 1];
    }
    literal
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_types() {
        let t = ShaderType::parse("float3x3").unwrap();
        assert_eq!((t.base, t.rows, t.columns), (BaseType::Float, 3, 3));
        assert!(ShaderType::parse("float3").unwrap().is_vector());
        assert!(ShaderType::parse("uint").unwrap().is_scalar());
        assert!(ShaderType::parse("Texture2D").is_none());
        assert!(ShaderType::parse("float5").is_none());
        assert!(ShaderType::parse("<<unknown>>").is_none());
    }

    #[test]
    fn test_automatic_conversions() {
        let rules = ShaderTypeRules::new();
        assert!(rules.has_automatic_conversion("int", "float"));
        assert!(rules.has_automatic_conversion("float", "float3"));
        assert!(rules.has_automatic_conversion("float4", "float3"));
        assert!(rules.has_automatic_conversion("int3", "float3"));
        assert!(!rules.has_automatic_conversion("float3", "float4"));
        assert!(!rules.has_automatic_conversion("float3x3", "float3"));
        assert!(!rules.has_automatic_conversion("bool", "float"));
        assert!(!rules.has_automatic_conversion("Texture2D", "float"));
    }

    #[test]
    fn test_create_from_string() {
        let rules = ShaderTypeRules::new();
        assert_eq!(
            rules.create_from_string("{1, 0.5, 0}", "float3"),
            Some(ParamValue::Float(vec![1.0, 0.5, 0.0]))
        );
        assert_eq!(
            rules.create_from_string("float2(0.25f, 1)", "float2"),
            Some(ParamValue::Float(vec![0.25, 1.0]))
        );
        assert_eq!(
            rules.create_from_string("2", "int3"),
            Some(ParamValue::Int(vec![2, 2, 2]))
        );
        assert_eq!(
            rules.create_from_string("true", "bool"),
            Some(ParamValue::Bool(vec![true]))
        );
        assert_eq!(rules.create_from_string("1, 2", "float3"), None);
        assert_eq!(rules.create_from_string("abc", "float"), None);
    }

    #[test]
    fn test_default_objects() {
        let rules = ShaderTypeRules::new();
        assert_eq!(
            rules.create_default_object("float4x4"),
            ParamValue::Float(vec![0.0; 16])
        );
        assert_eq!(rules.create_default_object("uint2"), ParamValue::UInt(vec![0, 0]));
        assert_eq!(rules.create_default_object("<<unknown>>"), ParamValue::None);
    }
}
