// SPDX-License-Identifier: MIT OR Apache-2.0
//! Building procedure and parameter nodes from archive declarations.
//!
//! Procedure nodes get a preview item, one input port per function input and
//! one output port per function output. Parameter nodes get a role selector
//! and one port per struct member, pointing in the direction the role demands:
//! inputs for `Output` nodes, outputs for everything else.

use crate::archive::{split_archive_name, FragmentArchive, Function, ParameterStruct, SourceType};
use crate::node::{DropdownItem, FragmentNode, FragmentTag, NodeItem, NodeTag, PreviewItem};
use crate::port::{FragmentPort, ItemId, PortDirection, PortDirections, UNKNOWN};

/// Port direction a parameter node with this role must use
pub fn parameter_port_direction(source: SourceType) -> PortDirection {
    if source == SourceType::Output {
        PortDirection::Input
    } else {
        PortDirection::Output
    }
}

/// Build a procedure node for `function`, declared under `archive_name`
pub fn create_procedure_node(function: &Function, archive_name: &str) -> FragmentNode {
    let mut node = FragmentNode::new(
        function.name.clone(),
        NodeTag::Procedure(FragmentTag::new(archive_name)),
    );
    node.add_item(NodeItem::Preview(PreviewItem::new()));
    for param in &function.inputs {
        node.add_item(NodeItem::Port(FragmentPort::input(
            param.name.clone(),
            param.type_name.clone(),
            format!("{archive_name}:{}", param.name),
        )));
    }
    for output in &function.outputs {
        node.add_item(NodeItem::Port(FragmentPort::output(
            output.name.clone(),
            output.type_name.clone(),
            format!("{archive_name}:{}", output.name),
        )));
    }
    node
}

/// Build a parameter node holding only its role selector
pub fn create_empty_parameter_node(
    source: SourceType,
    archive_name: &str,
    title: impl Into<String>,
) -> FragmentNode {
    let mut node = FragmentNode::new(title, NodeTag::Parameter(FragmentTag::new(archive_name)));
    node.add_item(NodeItem::Dropdown(DropdownItem::role_selector(source)));
    node
}

/// Build a parameter node exposing every member of `parameters`
pub fn create_parameter_node(
    parameters: &ParameterStruct,
    archive_name: &str,
    source: SourceType,
) -> FragmentNode {
    let mut node = create_empty_parameter_node(source, archive_name, parameters.name.clone());
    let directions = PortDirections::only(parameter_port_direction(source));
    for param in &parameters.parameters {
        node.add_item(NodeItem::Port(FragmentPort::new(
            param.name.clone(),
            param.type_name.clone(),
            format!("{archive_name}:{}", param.name),
            directions,
        )));
    }
    node
}

/// Build a procedure node for the function at `path:Function`.
///
/// An unresolvable name yields a node titled [`UNKNOWN`] with no ports.
pub fn procedure_from_archive<A: FragmentArchive + ?Sized>(
    archive: &A,
    archive_name: &str,
) -> FragmentNode {
    let resolved = split_archive_name(archive_name).and_then(|(path, name)| {
        archive
            .fragment(path)
            .function(name)
            .map(|f| create_procedure_node(f, archive_name))
    });
    resolved.unwrap_or_else(|| {
        tracing::debug!("Unresolved function {archive_name}");
        let mut node = FragmentNode::new(UNKNOWN, NodeTag::Procedure(FragmentTag::new(archive_name)));
        node.add_item(NodeItem::Preview(PreviewItem::new()));
        node
    })
}

/// Build a parameter node for the struct at `path:Struct`.
///
/// An unresolvable name yields an empty parameter node titled [`UNKNOWN`].
pub fn parameter_from_archive<A: FragmentArchive + ?Sized>(
    archive: &A,
    archive_name: &str,
    source: SourceType,
) -> FragmentNode {
    let resolved = split_archive_name(archive_name).and_then(|(path, name)| {
        archive
            .fragment(path)
            .parameter_struct(name)
            .map(|s| create_parameter_node(s, archive_name, source))
    });
    resolved.unwrap_or_else(|| {
        tracing::debug!("Unresolved parameter struct {archive_name}");
        create_empty_parameter_node(source, archive_name, UNKNOWN)
    })
}

/// What a role change did to a node's ports
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleChange {
    /// Rebuilt ports as (old ID, new ID)
    pub replaced: Vec<(ItemId, ItemId)>,
    /// Ports with both connectors enabled, left as they were
    pub ambiguous: Vec<ItemId>,
}

/// Set a parameter node's role and rebuild the ports pointing the wrong way.
///
/// Ports with exactly one connector enabled that disagrees with the role are
/// removed and re-added (same name, type and key, new ID, flipped connector).
/// Ports with no connector or both connectors are left alone. Procedure nodes
/// have no role and come back unchanged.
pub fn change_parameter_role(node: &mut FragmentNode, source: SourceType) -> RoleChange {
    if !node.is_parameter() {
        tracing::warn!("Ignoring role change on procedure node {:?}", node.id());
        return RoleChange::default();
    }

    if let Some(selector) = node.dropdown_mut() {
        selector.selected = source.index();
    }

    let required = parameter_port_direction(source);
    let mut change = RoleChange::default();

    let mismatched: Vec<FragmentPort> = node
        .ports()
        .filter(|port| {
            if port.directions.input && port.directions.output {
                tracing::warn!(
                    "Port {} on node {:?} has both connectors enabled; leaving it unchanged",
                    port.name,
                    node.id()
                );
                change.ambiguous.push(port.id);
            }
            port.directions.exclusive().is_some_and(|d| d != required)
        })
        .cloned()
        .collect();

    for old in mismatched {
        let rebuilt = old.rebuilt_with(PortDirections::only(required));
        node.remove_item(old.id);
        let new_id = node.add_item(NodeItem::Port(rebuilt));
        change.replaced.push((old.id, new_id));
    }

    if !change.replaced.is_empty() {
        tracing::debug!(
            "Rebuilt {} port(s) on node {:?} for role {}",
            change.replaced.len(),
            node.id(),
            source.label()
        );
    }
    change
}

/// Apply a role-selector pick by option index, as the drop-down does
pub fn select_parameter_role(node: &mut FragmentNode, index: usize) -> Option<RoleChange> {
    let label = node.dropdown()?.options.get(index)?.clone();
    Some(change_parameter_role(node, SourceType::from_label(&label)))
}
