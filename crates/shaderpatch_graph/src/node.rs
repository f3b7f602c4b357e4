// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the shader fragment graph.

use crate::archive::SourceType;
use crate::port::{FragmentPort, ItemId};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique node identifier. Allocated in increasing order, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Allocate the next ID
    pub fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Archive name and ID shared by every node role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentTag {
    /// Archive name of the function or parameter struct the node was built from
    pub archive_name: String,
    /// Node ID
    pub id: NodeId,
}

impl FragmentTag {
    /// Tag with a freshly allocated ID
    pub fn new(archive_name: impl Into<String>) -> Self {
        Self {
            archive_name: archive_name.into(),
            id: NodeId::next(),
        }
    }
}

/// Role of a node in the shader graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeTag {
    /// Calls a shader function
    Procedure(FragmentTag),
    /// Supplies or receives parameter values
    Parameter(FragmentTag),
}

impl NodeTag {
    /// Tag shared by both roles
    pub fn fragment(&self) -> &FragmentTag {
        match self {
            Self::Procedure(tag) | Self::Parameter(tag) => tag,
        }
    }

    /// Node ID
    pub fn id(&self) -> NodeId {
        self.fragment().id
    }

    /// Archive name
    pub fn archive_name(&self) -> &str {
        &self.fragment().archive_name
    }
}

/// Drop-down selector item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropdownItem {
    /// Unique item ID
    pub id: ItemId,
    /// Option labels
    pub options: Vec<String>,
    /// Selected option index
    pub selected: usize,
}

impl DropdownItem {
    /// Role selector listing every [`SourceType`] label, with `source` selected
    pub fn role_selector(source: SourceType) -> Self {
        Self {
            id: ItemId::new(),
            options: SourceType::ALL.iter().map(|s| s.label().to_string()).collect(),
            selected: source.index(),
        }
    }

    /// Label of the selected option
    pub fn selected_label(&self) -> Option<&str> {
        self.options.get(self.selected).map(String::as_str)
    }

    /// Source type named by the selected option
    pub fn selected_source(&self) -> Option<SourceType> {
        self.selected_label().map(SourceType::from_label)
    }
}

/// Build state of a preview image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PreviewState {
    /// No preview shader built; the next draw rebuilds it
    #[default]
    Missing,
    /// Shader built but parameter values changed; the next draw re-renders
    Stale,
    /// Up to date
    Current,
}

/// Preview image shown on procedure nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewItem {
    /// Unique item ID
    pub id: ItemId,
    /// Build state
    pub state: PreviewState,
}

impl PreviewItem {
    /// Create a preview with no build
    pub fn new() -> Self {
        Self {
            id: ItemId::new(),
            state: PreviewState::Missing,
        }
    }

    /// The graph structure changed; the preview shader must be regenerated
    pub fn invalidate_shader_structure(&mut self) {
        self.state = PreviewState::Missing;
    }

    /// Parameter values changed; an existing build only needs re-rendering
    pub fn invalidate_parameters(&mut self) {
        if self.state == PreviewState::Current {
            self.state = PreviewState::Stale;
        }
    }

    /// Constants baked into the shader changed; requires a complete rebuild
    pub fn invalidate_attached_constants(&mut self) {
        self.state = PreviewState::Missing;
    }

    /// Record that the preview was rendered
    pub fn mark_current(&mut self) {
        self.state = PreviewState::Current;
    }
}

impl Default for PreviewItem {
    fn default() -> Self {
        Self::new()
    }
}

/// An item on a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NodeItem {
    /// Typed connection point
    Port(FragmentPort),
    /// Drop-down selector
    Dropdown(DropdownItem),
    /// Preview image
    Preview(PreviewItem),
}

impl NodeItem {
    /// Item ID
    pub fn id(&self) -> ItemId {
        match self {
            Self::Port(p) => p.id,
            Self::Dropdown(d) => d.id,
            Self::Preview(p) => p.id,
        }
    }

    /// The port, if this item is one
    pub fn as_port(&self) -> Option<&FragmentPort> {
        match self {
            Self::Port(p) => Some(p),
            _ => None,
        }
    }
}

/// A node instance in the shader graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FragmentNode {
    /// Role and ID
    pub tag: NodeTag,
    /// Title shown in the header
    pub title: String,
    /// Position in the graph UI
    pub position: [f32; 2],
    items: Vec<NodeItem>,
}

impl FragmentNode {
    /// Create a node with no items
    pub fn new(title: impl Into<String>, tag: NodeTag) -> Self {
        Self {
            tag,
            title: title.into(),
            position: [0.0, 0.0],
            items: Vec::new(),
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = [x, y];
        self
    }

    /// Node ID
    pub fn id(&self) -> NodeId {
        self.tag.id()
    }

    /// Append an item
    pub fn add_item(&mut self, item: NodeItem) -> ItemId {
        let id = item.id();
        self.items.push(item);
        id
    }

    /// Remove an item by ID
    pub fn remove_item(&mut self, id: ItemId) -> Option<NodeItem> {
        let index = self.items.iter().position(|i| i.id() == id)?;
        Some(self.items.remove(index))
    }

    /// All items in display order
    pub fn items(&self) -> &[NodeItem] {
        &self.items
    }

    /// Item by ID
    pub fn item(&self, id: ItemId) -> Option<&NodeItem> {
        self.items.iter().find(|i| i.id() == id)
    }

    /// Port by ID
    pub fn port(&self, id: ItemId) -> Option<&FragmentPort> {
        self.item(id).and_then(NodeItem::as_port)
    }

    /// All ports in display order
    pub fn ports(&self) -> impl Iterator<Item = &FragmentPort> {
        self.items.iter().filter_map(NodeItem::as_port)
    }

    /// All ports, mutably
    pub fn ports_mut(&mut self) -> impl Iterator<Item = &mut FragmentPort> {
        self.items.iter_mut().filter_map(|i| match i {
            NodeItem::Port(p) => Some(p),
            _ => None,
        })
    }

    /// First drop-down on the node
    pub fn dropdown(&self) -> Option<&DropdownItem> {
        self.items.iter().find_map(|i| match i {
            NodeItem::Dropdown(d) => Some(d),
            _ => None,
        })
    }

    /// First drop-down on the node, mutably
    pub fn dropdown_mut(&mut self) -> Option<&mut DropdownItem> {
        self.items.iter_mut().find_map(|i| match i {
            NodeItem::Dropdown(d) => Some(d),
            _ => None,
        })
    }

    /// Preview items, mutably
    pub fn previews_mut(&mut self) -> impl Iterator<Item = &mut PreviewItem> {
        self.items.iter_mut().filter_map(|i| match i {
            NodeItem::Preview(p) => Some(p),
            _ => None,
        })
    }

    /// Whether this is a parameter node
    pub fn is_parameter(&self) -> bool {
        matches!(self.tag, NodeTag::Parameter(_))
    }

    /// Source type of a parameter node as chosen in its role selector.
    ///
    /// `None` for procedure nodes; `System` for a parameter node without a selector.
    pub fn parameter_source(&self) -> Option<SourceType> {
        match self.tag {
            NodeTag::Parameter(_) => Some(
                self.dropdown()
                    .and_then(DropdownItem::selected_source)
                    .unwrap_or(SourceType::System),
            ),
            NodeTag::Procedure(_) => None,
        }
    }
}
