// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shader graph containing fragment nodes and connections.

use crate::archive::SourceType;
use crate::compatibility::FragmentCompatibility;
use crate::connection::{Connection, ConnectionId};
use crate::factory::{self, RoleChange};
use crate::node::{FragmentNode, NodeId, NodeItem};
use crate::port::{ItemId, PortDirection};
use crate::type_rules::TypeRules;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A shader node graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShaderGraph {
    /// Graph name
    pub name: String,
    /// Nodes in the graph, keyed by their tag ID
    nodes: IndexMap<NodeId, FragmentNode>,
    /// Connections between ports
    connections: IndexMap<ConnectionId, Connection>,
}

impl ShaderGraph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: IndexMap::new(),
            connections: IndexMap::new(),
        }
    }

    /// Add a node to the graph
    pub fn add_node(&mut self, node: FragmentNode) -> NodeId {
        let id = node.id();
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node and its connections
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<FragmentNode> {
        self.connections.retain(|_, c| !c.involves_node(node_id));
        self.nodes.shift_remove(&node_id)
    }

    /// Find the node whose tag carries `node_id`
    pub fn fragment_node(&self, node_id: NodeId) -> Option<&FragmentNode> {
        self.nodes.get(&node_id)
    }

    /// Find the node whose tag carries `node_id`, mutably
    pub fn fragment_node_mut(&mut self, node_id: NodeId) -> Option<&mut FragmentNode> {
        self.nodes.get_mut(&node_id)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &FragmentNode> {
        self.nodes.values()
    }

    /// Get all nodes, mutably
    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut FragmentNode> {
        self.nodes.values_mut()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Add an item to a node
    pub fn add_item(&mut self, node_id: NodeId, item: NodeItem) -> Option<ItemId> {
        self.nodes.get_mut(&node_id).map(|n| n.add_item(item))
    }

    /// Remove an item from a node, dropping connections to it
    pub fn remove_item(&mut self, node_id: NodeId, item_id: ItemId) -> Option<NodeItem> {
        let removed = self.nodes.get_mut(&node_id)?.remove_item(item_id)?;
        self.connections.retain(|_, c| !c.involves_port(item_id));
        Some(removed)
    }

    /// Connect output port `from_port` to input port `to_port`.
    ///
    /// A port holds at most one connection: any connection already attached
    /// to either endpoint is removed first, so an output feeds a single input.
    pub fn connect<R: TypeRules + ?Sized>(
        &mut self,
        from_node: NodeId,
        from_port: ItemId,
        to_node: NodeId,
        to_port: ItemId,
        compatibility: &FragmentCompatibility<'_, R>,
    ) -> Result<ConnectionId, ConnectionError> {
        if from_node == to_node {
            return Err(ConnectionError::SelfLoop);
        }

        let source_node = self.nodes.get(&from_node)
            .ok_or(ConnectionError::NodeNotFound(from_node))?;
        let target_node = self.nodes.get(&to_node)
            .ok_or(ConnectionError::NodeNotFound(to_node))?;

        let source_port = source_node.port(from_port)
            .ok_or(ConnectionError::PortNotFound(from_port))?;
        let target_port = target_node.port(to_port)
            .ok_or(ConnectionError::PortNotFound(to_port))?;

        if !source_port.directions.allows(PortDirection::Output) {
            return Err(ConnectionError::WrongDirection(from_port));
        }
        if !target_port.directions.allows(PortDirection::Input) {
            return Err(ConnectionError::WrongDirection(to_port));
        }

        let kind = compatibility.can_connect(source_port, target_port);
        if !kind.is_connectable() {
            return Err(ConnectionError::IncompatiblePorts {
                from: source_port.type_name().to_string(),
                to: target_port.type_name().to_string(),
            });
        }

        self.connections
            .retain(|_, c| !c.involves_port(from_port) && !c.involves_port(to_port));

        let connection = Connection::new(from_node, from_port, to_node, to_port, kind);
        let id = connection.id;
        self.connections.insert(id, connection);
        Ok(id)
    }

    /// Remove a connection
    pub fn disconnect(&mut self, connection_id: ConnectionId) -> Option<Connection> {
        self.connections.shift_remove(&connection_id)
    }

    /// Get a connection by ID
    pub fn connection(&self, connection_id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&connection_id)
    }

    /// Get all connections
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Get the connection attached to a port, if any
    pub fn connection_for_port(&self, port_id: ItemId) -> Option<&Connection> {
        self.connections.values().find(|c| c.involves_port(port_id))
    }

    /// Get the number of connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Switch a parameter node's role, rebuilding ports whose direction
    /// conflicts. Connections to rebuilt ports are dropped. `None` when the
    /// node is missing or is not a parameter node.
    pub fn set_parameter_role(&mut self, node_id: NodeId, source: SourceType) -> Option<RoleChange> {
        let node = self.nodes.get_mut(&node_id).filter(|n| n.is_parameter())?;
        let change = factory::change_parameter_role(node, source);
        if !change.replaced.is_empty() {
            self.connections.retain(|_, c| {
                !change.replaced.iter().any(|(old, _)| c.involves_port(*old))
            });
        }
        Some(change)
    }

    /// The graph structure changed; every preview shader must be regenerated
    pub fn invalidate_shader_structure(&mut self) {
        for preview in self.nodes.values_mut().flat_map(FragmentNode::previews_mut) {
            preview.invalidate_shader_structure();
        }
    }

    /// Parameter values changed; every preview must be re-rendered
    pub fn invalidate_parameters(&mut self) {
        for preview in self.nodes.values_mut().flat_map(FragmentNode::previews_mut) {
            preview.invalidate_parameters();
        }
    }

    /// Attached constants changed; every preview shader must be regenerated
    pub fn invalidate_attached_constants(&mut self) {
        for preview in self.nodes.values_mut().flat_map(FragmentNode::previews_mut) {
            preview.invalidate_attached_constants();
        }
    }
}

impl Default for ShaderGraph {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Error when creating a connection
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// Node not found
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Port not found
    #[error("Port not found: {0:?}")]
    PortNotFound(ItemId),

    /// Port does not have the connector needed on this end
    #[error("Port {0:?} has no connector in the required direction")]
    WrongDirection(ItemId),

    /// Incompatible port types
    #[error("Incompatible port types: {from} -> {to}")]
    IncompatiblePorts {
        /// Output type
        from: String,
        /// Input type
        to: String,
    },

    /// Self-loop not allowed
    #[error("Self-loop not allowed")]
    SelfLoop,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compatibility::ConnectionType;
    use crate::node::{FragmentTag, NodeTag, PreviewItem, PreviewState};
    use crate::archive::{Parameter, ParameterStruct};
    use crate::port::{FragmentPort, PortDirections};
    use crate::type_rules::ShaderTypeRules;

    fn procedure(name: &str, inputs: &[(&str, &str)], outputs: &[(&str, &str)]) -> FragmentNode {
        let archive = format!("test.h:{name}");
        let mut node = FragmentNode::new(name, NodeTag::Procedure(FragmentTag::new(archive.clone())));
        node.add_item(NodeItem::Preview(PreviewItem::new()));
        for (n, t) in inputs {
            node.add_item(NodeItem::Port(FragmentPort::input(*n, *t, format!("{archive}:{n}"))));
        }
        for (n, t) in outputs {
            node.add_item(NodeItem::Port(FragmentPort::output(*n, *t, format!("{archive}:{n}"))));
        }
        node
    }

    fn port_id(graph: &ShaderGraph, node: NodeId, name: &str) -> ItemId {
        graph.fragment_node(node).unwrap().ports().find(|p| p.name == name).unwrap().id
    }

    #[test]
    fn test_lookup_by_tag_id() {
        let mut graph = ShaderGraph::new("Lookup");
        let node = procedure("A", &[], &[("out", "float")]);
        let id = node.tag.id();
        graph.add_node(node);
        graph.add_node(procedure("B", &[], &[]));

        assert_eq!(graph.fragment_node(id).unwrap().title, "A");
        assert!(graph.fragment_node(NodeId(u64::MAX)).is_none());
    }

    #[test]
    fn test_connect_records_conversion() {
        let rules = ShaderTypeRules::new();
        let compat = FragmentCompatibility::new(&rules);
        let mut graph = ShaderGraph::new("Connect");
        let a = graph.add_node(procedure("A", &[], &[("out", "int")]));
        let b = graph.add_node(procedure("B", &[("in", "float")], &[]));

        let id = graph
            .connect(a, port_id(&graph, a, "out"), b, port_id(&graph, b, "in"), &compat)
            .unwrap();
        assert_eq!(graph.connection(id).unwrap().kind, ConnectionType::Conversion);
        assert!(graph.connection(id).unwrap().is_conversion());
    }

    #[test]
    fn test_connect_rejections() {
        let rules = ShaderTypeRules::new();
        let compat = FragmentCompatibility::new(&rules);
        let mut graph = ShaderGraph::new("Reject");
        let a = graph.add_node(procedure("A", &[("in", "float3")], &[("out", "float3")]));
        let b = graph.add_node(procedure("B", &[("in", "float3x3")], &[]));

        let a_out = port_id(&graph, a, "out");
        let a_in = port_id(&graph, a, "in");
        let b_in = port_id(&graph, b, "in");

        assert!(matches!(graph.connect(a, a_out, a, a_in, &compat), Err(ConnectionError::SelfLoop)));
        assert!(matches!(
            graph.connect(a, a_out, b, b_in, &compat),
            Err(ConnectionError::IncompatiblePorts { .. })
        ));
        assert!(matches!(
            graph.connect(b, b_in, a, a_in, &compat),
            Err(ConnectionError::WrongDirection(_))
        ));
        assert!(matches!(
            graph.connect(a, ItemId::new(), b, b_in, &compat),
            Err(ConnectionError::PortNotFound(_))
        ));
        assert_eq!(graph.connection_count(), 0);
    }

    #[test]
    fn test_new_connection_replaces_old() {
        let rules = ShaderTypeRules::new();
        let compat = FragmentCompatibility::new(&rules);
        let mut graph = ShaderGraph::new("Replace");
        let a = graph.add_node(procedure("A", &[], &[("out", "float")]));
        let b = graph.add_node(procedure("B", &[], &[("out", "float")]));
        let c = graph.add_node(procedure("C", &[("in", "float")], &[]));
        let c_in = port_id(&graph, c, "in");

        graph.connect(a, port_id(&graph, a, "out"), c, c_in, &compat).unwrap();
        let second = graph.connect(b, port_id(&graph, b, "out"), c, c_in, &compat).unwrap();

        assert_eq!(graph.connection_count(), 1);
        assert_eq!(graph.connection_for_port(c_in).unwrap().id, second);
    }

    #[test]
    fn test_remove_item_and_node_drop_connections() {
        let rules = ShaderTypeRules::new();
        let compat = FragmentCompatibility::new(&rules);
        let mut graph = ShaderGraph::new("Remove");
        let a = graph.add_node(procedure("A", &[], &[("out", "float")]));
        let b = graph.add_node(procedure("B", &[("in", "float")], &[]));
        let a_out = port_id(&graph, a, "out");
        graph.connect(a, a_out, b, port_id(&graph, b, "in"), &compat).unwrap();

        graph.remove_item(a, a_out).unwrap();
        assert_eq!(graph.connection_count(), 0);

        graph.remove_node(b);
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_output_feeds_one_input() {
        let rules = ShaderTypeRules::new();
        let compat = FragmentCompatibility::new(&rules);
        let mut graph = ShaderGraph::new("Fanout");
        let a = graph.add_node(procedure("A", &[], &[("out", "float")]));
        let b = graph.add_node(procedure("B", &[("in", "float")], &[]));
        let c = graph.add_node(procedure("C", &[("in", "float")], &[]));
        let a_out = port_id(&graph, a, "out");
        let b_in = port_id(&graph, b, "in");

        graph.connect(a, a_out, b, b_in, &compat).unwrap();
        graph.connect(a, a_out, c, port_id(&graph, c, "in"), &compat).unwrap();

        assert_eq!(graph.connection_count(), 1);
        assert!(graph.connection_for_port(b_in).is_none());
    }

    #[test]
    fn test_role_change_on_procedure_node_is_refused() {
        let mut graph = ShaderGraph::new("Roles");
        let a = graph.add_node(procedure("A", &[("in", "float")], &[("out", "float")]));
        let before: Vec<PortDirections> = graph
            .fragment_node(a)
            .unwrap()
            .ports()
            .map(|p| p.directions)
            .collect();

        assert!(graph.set_parameter_role(a, SourceType::Output).is_none());
        let after: Vec<PortDirections> = graph
            .fragment_node(a)
            .unwrap()
            .ports()
            .map(|p| p.directions)
            .collect();
        assert_eq!(after, before);
        assert!(graph.set_parameter_role(NodeId(u64::MAX), SourceType::Output).is_none());
    }

    #[test]
    fn test_role_change_drops_connections_to_rebuilt_ports() {
        let rules = ShaderTypeRules::new();
        let compat = FragmentCompatibility::new(&rules);
        let mut graph = ShaderGraph::new("Prune");
        let surface = ParameterStruct {
            name: "Surface".to_string(),
            parameters: vec![Parameter::new("roughness", "float")],
        };
        let param = graph.add_node(factory::create_parameter_node(
            &surface,
            "s.h:Surface",
            SourceType::Material,
        ));
        let consumer = graph.add_node(procedure("Shade", &[("roughness", "float")], &[]));
        let old_port = port_id(&graph, param, "roughness");
        graph
            .connect(param, old_port, consumer, port_id(&graph, consumer, "roughness"), &compat)
            .unwrap();
        assert_eq!(graph.connection_count(), 1);

        let change = graph.set_parameter_role(param, SourceType::Output).unwrap();
        assert_eq!(change.replaced.len(), 1);
        assert_eq!(change.replaced[0].0, old_port);
        assert_eq!(graph.connection_count(), 0);
        assert!(graph.connection_for_port(old_port).is_none());
        assert!(graph.fragment_node(param).unwrap().port(old_port).is_none());
    }

    #[test]
    fn test_graph_wide_preview_invalidation() {
        let mut graph = ShaderGraph::new("Preview");
        let a = graph.add_node(procedure("A", &[], &[]));
        let b = graph.add_node(procedure("B", &[], &[]));
        for node in graph.nodes_mut() {
            node.previews_mut().for_each(PreviewItem::mark_current);
        }

        graph.invalidate_parameters();
        let states: Vec<PreviewState> = [a, b]
            .iter()
            .flat_map(|id| graph.fragment_node_mut(*id).unwrap().previews_mut().map(|p| p.state).collect::<Vec<_>>())
            .collect();
        assert_eq!(states, vec![PreviewState::Stale, PreviewState::Stale]);

        graph.invalidate_shader_structure();
        assert!(graph
            .nodes_mut()
            .flat_map(FragmentNode::previews_mut)
            .all(|p| p.state == PreviewState::Missing));
    }
}
