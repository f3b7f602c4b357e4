// SPDX-License-Identifier: MIT OR Apache-2.0
//! Links between an output port and an input port.

use crate::compatibility::ConnectionType;
use crate::node::NodeId;
use crate::port::ItemId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a link in a [`ShaderGraph`](crate::ShaderGraph)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Fresh random ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// A link carrying a value from an output port into an input port
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    /// Link ID
    pub id: ConnectionId,
    /// Node owning the output
    pub from_node: NodeId,
    /// Output port
    pub from_port: ItemId,
    /// Node owning the input
    pub to_node: NodeId,
    /// Input port
    pub to_port: ItemId,
    /// `Compatible` or `Conversion`; conversions are drawn differently
    pub kind: ConnectionType,
}

impl Connection {
    /// Link two ports under a fresh ID
    pub fn new(
        from_node: NodeId,
        from_port: ItemId,
        to_node: NodeId,
        to_port: ItemId,
        kind: ConnectionType,
    ) -> Self {
        Self {
            id: ConnectionId::new(),
            from_node,
            from_port,
            to_node,
            to_port,
            kind,
        }
    }

    /// Whether either end sits on `node_id`
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.from_node == node_id || self.to_node == node_id
    }

    /// Whether either end is `port_id`
    pub fn involves_port(&self, port_id: ItemId) -> bool {
        self.from_port == port_id || self.to_port == port_id
    }

    /// Whether the connection goes through an automatic type conversion
    pub fn is_conversion(&self) -> bool {
        self.kind == ConnectionType::Conversion
    }
}
