// SPDX-License-Identifier: MIT OR Apache-2.0
//! Type compatibility checks for connecting ports.

use crate::port::FragmentPort;
use crate::type_rules::TypeRules;
use serde::{Deserialize, Serialize};

/// Outcome of a compatibility check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionType {
    /// Types match
    Compatible,
    /// Connectable through an automatic conversion
    Conversion,
    /// Not connectable
    Incompatible,
}

impl ConnectionType {
    /// Whether a connection may be made
    pub fn is_connectable(self) -> bool {
        !matches!(self, Self::Incompatible)
    }
}

/// Checks port tags against each other and the type rules.
///
/// Read-only; shareable across threads when the rules are.
#[derive(Debug, Clone, Copy)]
pub struct FragmentCompatibility<'a, R: TypeRules + ?Sized> {
    rules: &'a R,
}

impl<'a, R: TypeRules + ?Sized> FragmentCompatibility<'a, R> {
    /// Create a checker over the given rules
    pub fn new(rules: &'a R) -> Self {
        Self { rules }
    }

    /// Whether an output tagged `from` may feed an input tagged `to`
    pub fn can_connect_tags(&self, from: Option<&str>, to: Option<&str>) -> ConnectionType {
        let (from, to) = match (from, to) {
            (None, None) => return ConnectionType::Compatible,
            (Some(from), Some(to)) => (from, to),
            _ => return ConnectionType::Incompatible,
        };

        if from.eq_ignore_ascii_case(to) {
            ConnectionType::Compatible
        } else if self.rules.has_automatic_conversion(from, to) {
            ConnectionType::Conversion
        } else {
            ConnectionType::Incompatible
        }
    }

    /// Whether output port `from` may feed input port `to`
    pub fn can_connect(&self, from: &FragmentPort, to: &FragmentPort) -> ConnectionType {
        self.can_connect_tags(from.tag(), to.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::PortDirections;
    use crate::type_rules::ShaderTypeRules;

    struct NoConversions;

    impl TypeRules for NoConversions {
        fn has_automatic_conversion(&self, _from: &str, _to: &str) -> bool {
            false
        }
        fn create_from_string(&self, _literal: &str, _type_name: &str) -> Option<crate::type_rules::ParamValue> {
            None
        }
        fn create_default_object(&self, _type_name: &str) -> crate::type_rules::ParamValue {
            crate::type_rules::ParamValue::None
        }
    }

    #[test]
    fn test_untyped_and_half_typed() {
        let rules = ShaderTypeRules::new();
        let compat = FragmentCompatibility::new(&rules);
        assert_eq!(compat.can_connect_tags(None, None), ConnectionType::Compatible);
        assert_eq!(compat.can_connect_tags(Some("float3"), None), ConnectionType::Incompatible);
        assert_eq!(compat.can_connect_tags(None, Some("float3")), ConnectionType::Incompatible);
    }

    #[test]
    fn test_exact_match_ignores_case() {
        let rules = NoConversions;
        let compat = FragmentCompatibility::new(&rules);
        assert_eq!(compat.can_connect_tags(Some("float3"), Some("float3")), ConnectionType::Compatible);
        assert_eq!(compat.can_connect_tags(Some("Float3"), Some("FLOAT3")), ConnectionType::Compatible);
    }

    #[test]
    fn test_conversion_depends_on_rules() {
        let shader_rules = ShaderTypeRules::new();
        let with_rules = FragmentCompatibility::new(&shader_rules);
        assert_eq!(with_rules.can_connect_tags(Some("int"), Some("float")), ConnectionType::Conversion);

        let strict = FragmentCompatibility::new(&NoConversions);
        assert_eq!(strict.can_connect_tags(Some("int"), Some("float")), ConnectionType::Incompatible);
    }

    #[test]
    fn test_ports() {
        let rules = ShaderTypeRules::new();
        let compat = FragmentCompatibility::new(&rules);
        let out = FragmentPort::output("result", "float", "a.h:F:result");
        let input = FragmentPort::input("color", "float4", "a.h:G:color");
        let untyped = FragmentPort::untyped("any", PortDirections::INPUT);

        assert_eq!(compat.can_connect(&out, &input), ConnectionType::Conversion);
        assert_eq!(compat.can_connect(&out, &untyped), ConnectionType::Incompatible);
        assert!(!ConnectionType::Incompatible.is_connectable());
    }
}
