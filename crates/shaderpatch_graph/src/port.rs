// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port definitions for shader fragment node inputs/outputs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sentinel used for names and types that could not be resolved from the archive
pub const UNKNOWN: &str = "<<unknown>>";

/// Unique identifier for an item on a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub Uuid);

impl ItemId {
    /// Create a new random item ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortDirection {
    /// Input port
    Input,
    /// Output port
    Output,
}

impl PortDirection {
    /// The direction a connection partner must have
    pub fn opposite(self) -> Self {
        match self {
            Self::Input => Self::Output,
            Self::Output => Self::Input,
        }
    }
}

/// Independent enabled flags for the input and output connectors of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PortDirections {
    /// Input connector enabled
    pub input: bool,
    /// Output connector enabled
    pub output: bool,
}

impl PortDirections {
    /// Only the input connector enabled
    pub const INPUT: Self = Self { input: true, output: false };
    /// Only the output connector enabled
    pub const OUTPUT: Self = Self { input: false, output: true };

    /// Flags for a single direction
    pub fn only(direction: PortDirection) -> Self {
        match direction {
            PortDirection::Input => Self::INPUT,
            PortDirection::Output => Self::OUTPUT,
        }
    }

    /// The single enabled direction, or `None` when both or neither are enabled
    pub fn exclusive(self) -> Option<PortDirection> {
        match (self.input, self.output) {
            (true, false) => Some(PortDirection::Input),
            (false, true) => Some(PortDirection::Output),
            _ => None,
        }
    }

    /// Whether the given direction is enabled
    pub fn allows(self, direction: PortDirection) -> bool {
        match direction {
            PortDirection::Input => self.input,
            PortDirection::Output => self.output,
        }
    }
}

/// Abbreviated type name for compact port labels.
///
/// `float3x3` becomes `f3x3`, `float3` becomes `f3`, `float` becomes `f`.
pub fn short_type(type_name: &str) -> String {
    let chars: Vec<char> = type_name.chars().collect();
    let Some(&first) = chars.first() else {
        return String::new();
    };

    let mut short = String::from(first);
    let n = chars.len();
    if chars[n - 1].is_ascii_digit() {
        if n > 2 && chars[n - 2] == 'x' && chars[n - 3].is_ascii_digit() {
            short.extend(&chars[n - 3..]);
        } else {
            short.push(chars[n - 1]);
        }
    }
    short
}

/// A typed port on a shader fragment node.
///
/// The archive name (`archive:param`) is the stable key used to cross-reference
/// the port against the fragment archive. Name and type are cached copies of
/// what the archive said when the port was built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FragmentPort {
    /// Unique item ID
    pub id: ItemId,
    /// Display name
    pub name: String,
    type_name: String,
    short_type: String,
    tag: Option<String>,
    /// Archive-qualified key
    pub archive_name: String,
    /// Enabled connectors
    pub directions: PortDirections,
}

impl FragmentPort {
    /// Create a new port
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        archive_name: impl Into<String>,
        directions: PortDirections,
    ) -> Self {
        let type_name = type_name.into();
        Self {
            id: ItemId::new(),
            name: name.into(),
            short_type: short_type(&type_name),
            tag: Some(type_name.clone()),
            type_name,
            archive_name: archive_name.into(),
            directions,
        }
    }

    /// Create a new input port
    pub fn input(
        name: impl Into<String>,
        type_name: impl Into<String>,
        archive_name: impl Into<String>,
    ) -> Self {
        Self::new(name, type_name, archive_name, PortDirections::INPUT)
    }

    /// Create a new output port
    pub fn output(
        name: impl Into<String>,
        type_name: impl Into<String>,
        archive_name: impl Into<String>,
    ) -> Self {
        Self::new(name, type_name, archive_name, PortDirections::OUTPUT)
    }

    /// Create an untyped port. Untyped ports only connect to other untyped ports.
    pub fn untyped(name: impl Into<String>, directions: PortDirections) -> Self {
        Self {
            id: ItemId::new(),
            name: name.into(),
            type_name: String::new(),
            short_type: String::new(),
            tag: None,
            archive_name: String::new(),
            directions,
        }
    }

    /// Declared type
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Reassign the declared type; the short type and compatibility tag follow it.
    pub fn set_type(&mut self, type_name: impl Into<String>) {
        let type_name = type_name.into();
        self.short_type = short_type(&type_name);
        self.tag = Some(type_name.clone());
        self.type_name = type_name;
    }

    /// Abbreviated type for labels
    pub fn short_type(&self) -> &str {
        &self.short_type
    }

    /// Type tag used for compatibility checks
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Label as drawn next to the connector, e.g. `Normal (f3)`
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.short_type)
    }

    /// Same name, type and key with the connector flags replaced, under a fresh ID.
    pub fn rebuilt_with(&self, directions: PortDirections) -> Self {
        Self::new(
            self.name.clone(),
            self.type_name.clone(),
            self.archive_name.clone(),
            directions,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_type_matrix() {
        assert_eq!(short_type("float3x3"), "f3x3");
        assert_eq!(short_type("float4x4"), "f4x4");
        assert_eq!(short_type("int2x3"), "i2x3");
    }

    #[test]
    fn test_short_type_vector_and_scalar() {
        assert_eq!(short_type("float3"), "f3");
        assert_eq!(short_type("uint2"), "u2");
        assert_eq!(short_type("float"), "f");
        assert_eq!(short_type("x3"), "x3");
        assert_eq!(short_type(""), "");
    }

    #[test]
    fn test_set_type_recomputes_short_type() {
        let mut port = FragmentPort::input("Normal", "float3", "lighting.h:Light:Normal");
        assert_eq!(port.short_type(), "f3");
        assert_eq!(port.label(), "Normal (f3)");

        port.set_type("float4x4");
        assert_eq!(port.short_type(), "f4x4");
        assert_eq!(port.tag(), Some("float4x4"));

        port.set_type("");
        assert_eq!(port.short_type(), "");
    }

    #[test]
    fn test_exclusive_direction() {
        assert_eq!(PortDirections::INPUT.exclusive(), Some(PortDirection::Input));
        assert_eq!(PortDirections::OUTPUT.exclusive(), Some(PortDirection::Output));
        assert_eq!(PortDirections::default().exclusive(), None);
        assert_eq!(
            PortDirections { input: true, output: true }.exclusive(),
            None
        );
    }

    #[test]
    fn test_rebuilt_port_gets_new_id() {
        let port = FragmentPort::output("Color", "float4", "a.h:S:Color");
        let rebuilt = port.rebuilt_with(PortDirections::INPUT);
        assert_ne!(port.id, rebuilt.id);
        assert_eq!(rebuilt.name, "Color");
        assert_eq!(rebuilt.type_name(), "float4");
        assert_eq!(rebuilt.archive_name, "a.h:S:Color");
        assert_eq!(rebuilt.directions, PortDirections::INPUT);
    }
}
