// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shader fragment node graph.
//!
//! This crate models the graph edited by the shader patcher:
//! - Typed ports with archive-qualified keys
//! - Procedure nodes (shader functions) and parameter nodes (material,
//!   interpolator, system, output and constant values)
//! - Connection validation against shader type rules
//! - Synchronization with the fragment archive when declarations change
//!
//! ## Architecture
//!
//! The fragment archive and the type rules are collaborators behind the
//! [`FragmentArchive`] and [`TypeRules`] traits. Nodes are built by the
//! [`factory`] functions, checked by [`FragmentCompatibility`] on connect,
//! and kept consistent with the archive by [`GraphSynchronizer`].

pub mod archive;
pub mod compatibility;
pub mod connection;
pub mod document;
pub mod events;
pub mod factory;
pub mod graph;
pub mod node;
pub mod port;
pub mod sync;
pub mod type_rules;

pub use archive::{Fragment, FragmentArchive, Function, MemoryArchive, Parameter, ParameterStruct, SourceType};
pub use compatibility::{ConnectionType, FragmentCompatibility};
pub use connection::{Connection, ConnectionId};
pub use document::{MaterialParameter, ShaderDocument};
pub use events::{ArchiveChange, ChangeHub, ChangeSubscription};
pub use graph::{ConnectionError, ShaderGraph};
pub use node::{FragmentNode, NodeId, NodeItem, NodeTag};
pub use port::{FragmentPort, ItemId, PortDirection, PortDirections, UNKNOWN};
pub use sync::GraphSynchronizer;
pub use type_rules::{ParamValue, ShaderTypeRules, TypeRules};
