// SPDX-License-Identifier: MIT OR Apache-2.0
//! Console rendering of the archive tree.

use shaderpatch_browser::{ArchiveTreeModel, Icon, ItemKind, TreeItem, TreePath};
use std::fmt::Write;

/// Render the whole tree, expanding every level
pub fn render_tree(model: &mut ArchiveTreeModel) -> String {
    let mut out = String::new();
    render_level(model, &TreePath::Root, 0, &mut out);
    out
}

fn render_level(model: &mut ArchiveTreeModel, path: &TreePath, depth: usize, out: &mut String) {
    let children = model.get_children(path);
    for &handle in children.iter() {
        let Some(item) = model.item(handle) else {
            continue;
        };
        let _ = writeln!(out, "{}{}", "  ".repeat(depth), describe(item));
        if !model.is_leaf(&TreePath::Item(handle)) {
            render_level(model, &TreePath::Item(handle), depth + 1, out);
        }
    }
}

fn describe(item: &TreeItem) -> String {
    let icon = match item.icon {
        Some(Icon::Folder) => "▸",
        Some(Icon::ShaderFile) => "▤",
        Some(Icon::ShaderFragment) => "●",
        Some(Icon::Parameter) => "⬡",
        None => " ",
    };
    let check = if item.checked { "[x] " } else { "" };

    match &item.kind {
        ItemKind::Folder { name } => format!("{icon} {check}{name}/"),
        ItemKind::ShaderFile {
            file_name,
            exception_string,
        } => match exception_string {
            Some(error) => format!("{icon} {check}{file_name} ({} bytes) !! {error}", item.size),
            None => format!("{icon} {check}{file_name} ({} bytes)", item.size),
        },
        ItemKind::ShaderFragment {
            function_name,
            return_type,
            parameters,
            ..
        } => format!("{icon} {check}{return_type} {function_name}{parameters}"),
        ItemKind::ParameterStruct {
            struct_name,
            parameters,
            ..
        } => format!("{icon} {check}struct {struct_name} {parameters}"),
    }
}
