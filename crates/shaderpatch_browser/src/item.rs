// SPDX-License-Identifier: MIT OR Apache-2.0
//! Items shown in the archive tree.

use std::path::Path;
use std::time::SystemTime;

/// Handle to an item in the tree model's arena.
///
/// Handles are invalidated wholesale when the model's cache is cleared; a
/// stale handle resolves to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemHandle {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

/// Position in the tree passed to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreePath {
    /// The archive root
    Root,
    /// An item previously returned by the model
    Item(ItemHandle),
}

/// Icon drawn next to an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    /// Folder (triangle)
    Folder,
    /// Shader source file (paper)
    ShaderFile,
    /// Function (circle)
    ShaderFragment,
    /// Parameter struct (hexagon)
    Parameter,
}

/// What an item represents
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    /// Directory
    Folder {
        /// Directory name
        name: String,
    },
    /// Shader source file
    ShaderFile {
        /// File name
        file_name: String,
        /// Parse failure reported by the archive, once the file was expanded
        exception_string: Option<String>,
    },
    /// Function declared in a shader file
    ShaderFragment {
        /// Function name
        function_name: String,
        /// Type of the first output
        return_type: String,
        /// Parameter list summary
        parameters: String,
        /// `path:function`
        archive_name: String,
    },
    /// Parameter struct declared in a shader file
    ParameterStruct {
        /// Struct name
        struct_name: String,
        /// Body summary
        parameters: String,
        /// `path:struct`
        archive_name: String,
    },
}

/// An entry in the archive tree
#[derive(Debug, Clone)]
pub struct TreeItem {
    /// Cache key for this item's children
    pub path: String,
    /// What the item represents
    pub kind: ItemKind,
    /// Icon, if any
    pub icon: Option<Icon>,
    /// Size in bytes, filled in by the background worker
    pub size: u64,
    /// Modification time, filled in by the background worker
    pub modified: Option<SystemTime>,
    /// Owning item; `None` for root-level items
    pub parent: Option<ItemHandle>,
    /// Check box state
    pub checked: bool,
}

impl TreeItem {
    fn new(path: String, kind: ItemKind, icon: Icon, parent: Option<ItemHandle>) -> Self {
        Self {
            path,
            kind,
            icon: Some(icon),
            size: 0,
            modified: None,
            parent,
            checked: false,
        }
    }

    /// Folder item for a directory path
    pub fn folder(path: String, parent: Option<ItemHandle>) -> Self {
        let name = file_name(&path);
        Self::new(path, ItemKind::Folder { name }, Icon::Folder, parent)
    }

    /// File item for a shader source path
    pub fn shader_file(path: String, parent: Option<ItemHandle>) -> Self {
        let file_name = file_name(&path);
        let kind = ItemKind::ShaderFile {
            file_name,
            exception_string: None,
        };
        Self::new(path, kind, Icon::ShaderFile, parent)
    }

    /// Function item
    pub fn shader_fragment(
        function_name: String,
        return_type: String,
        parameters: String,
        archive_name: String,
        parent: Option<ItemHandle>,
    ) -> Self {
        let path = archive_name.clone();
        let kind = ItemKind::ShaderFragment {
            function_name,
            return_type,
            parameters,
            archive_name,
        };
        Self::new(path, kind, Icon::ShaderFragment, parent)
    }

    /// Parameter struct item
    pub fn parameter_struct(
        struct_name: String,
        parameters: String,
        archive_name: String,
        parent: Option<ItemHandle>,
    ) -> Self {
        let path = archive_name.clone();
        let kind = ItemKind::ParameterStruct {
            struct_name,
            parameters,
            archive_name,
        };
        Self::new(path, kind, Icon::Parameter, parent)
    }

    /// Display name
    pub fn name(&self) -> &str {
        match &self.kind {
            ItemKind::Folder { name } => name,
            ItemKind::ShaderFile { file_name, .. } => file_name,
            ItemKind::ShaderFragment { function_name, .. } => function_name,
            ItemKind::ParameterStruct { struct_name, .. } => struct_name,
        }
    }

    /// Functions and parameter structs have no children
    pub fn is_leaf(&self) -> bool {
        matches!(
            self.kind,
            ItemKind::ShaderFragment { .. } | ItemKind::ParameterStruct { .. }
        )
    }

    /// Archive name of a function or parameter struct
    pub fn archive_name(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::ShaderFragment { archive_name, .. }
            | ItemKind::ParameterStruct { archive_name, .. } => Some(archive_name),
            ItemKind::Folder { .. } | ItemKind::ShaderFile { .. } => None,
        }
    }
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map_or_else(|| path.to_string(), |n| n.to_string_lossy().into_owned())
}

impl std::fmt::Display for TreeItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}
