// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keeping graph metadata and document state in step with the archive.

use crate::archive::{
    identifier_safe_name, split_archive_name, FragmentArchive, SourceType, LOCAL_ARCHIVE_PREFIX,
};
use crate::document::{MaterialParameter, ShaderDocument};
use crate::events::{ArchiveChange, ChangeSubscription};
use crate::graph::ShaderGraph;
use crate::port::UNKNOWN;
use crate::type_rules::TypeRules;
use indexmap::IndexMap;

/// Applies archive changes to a graph and its document
pub struct GraphSynchronizer<'a, A: FragmentArchive + ?Sized, R: TypeRules + ?Sized> {
    archive: &'a A,
    rules: &'a R,
}

impl<'a, A: FragmentArchive + ?Sized, R: TypeRules + ?Sized> GraphSynchronizer<'a, A, R> {
    /// Create a synchronizer over an archive and type rules
    pub fn new(archive: &'a A, rules: &'a R) -> Self {
        Self { archive, rules }
    }

    /// Point every port keyed `old` at `new` and refresh its cached name and
    /// type from the archive (the [`UNKNOWN`] sentinel when `new` does not
    /// resolve). Returns the number of ports updated.
    pub fn update_graph_connections_for_parameter(
        &self,
        graph: &mut ShaderGraph,
        old: &str,
        new: &str,
    ) -> usize {
        let resolved = self.archive.parameter(new);
        let (name, type_name) = match &resolved {
            Some(p) => (p.name.as_str(), p.type_name.as_str()),
            None => (UNKNOWN, UNKNOWN),
        };

        let mut updated = 0;
        for port in graph.nodes_mut().flat_map(|n| n.ports_mut()) {
            if port.archive_name == old {
                port.archive_name = new.to_string();
                port.name = name.to_string();
                port.set_type(type_name);
                updated += 1;
            }
        }

        tracing::debug!("Renamed {updated} port(s) from {old} to {new}");
        updated
    }

    /// Bring the document's material parameters in line with the graph.
    ///
    /// The resulting key set is exactly the archive names of output ports on
    /// parameter nodes whose role is `Material`. Stale entries are removed;
    /// new ones get the archive default, or the type's zero value. Returns
    /// whether anything was added or removed.
    pub fn fill_in_material_parameters(
        &self,
        document: &mut ShaderDocument,
        graph: &ShaderGraph,
    ) -> bool {
        let mut wanted: IndexMap<String, String> = IndexMap::new();
        for node in graph.nodes() {
            if !node.is_parameter() || node.items().is_empty() {
                continue;
            }
            if node.parameter_source() != Some(SourceType::Material) {
                continue;
            }
            for port in node.ports().filter(|p| p.directions.output) {
                if wanted.contains_key(&port.archive_name) {
                    continue;
                }
                let type_name = self
                    .archive
                    .parameter(&port.archive_name)
                    .map_or_else(|| UNKNOWN.to_string(), |p| p.type_name);
                wanted.insert(port.archive_name.clone(), type_name);
            }
        }

        let state = &mut document.preview_material_state;
        let before = state.len();
        state.retain(|key, _| wanted.contains_key(key));
        let mut changed = state.len() != before;

        for (key, type_name) in &wanted {
            if state.contains_key(key) {
                continue;
            }
            let parameter = self.archive.parameter(key);
            let default = parameter
                .as_ref()
                .and_then(|p| p.default.as_deref().filter(|d| !d.is_empty()).map(|d| (d, &p.type_name)))
                .and_then(|(literal, ty)| self.rules.create_from_string(literal, ty));
            let value = default.unwrap_or_else(|| self.rules.create_default_object(type_name));
            let display_name = parameter.map_or_else(|| key.clone(), |p| p.name);

            state.insert(key.clone(), MaterialParameter { display_name, value });
            changed = true;
        }

        if changed {
            tracing::debug!("Material parameters now {}", state.len());
        }
        changed
    }

    /// Rename a parameter in the archive to an identifier-safe form of
    /// `new_name`, then repoint the graph. Returns the new key, or `None` if
    /// the archive refused the rename.
    pub fn edit_parameter_name(
        &self,
        graph: &mut ShaderGraph,
        old: &str,
        new_name: &str,
    ) -> Option<String> {
        let safe = identifier_safe_name(new_name);
        let new = if old.starts_with(LOCAL_ARCHIVE_PREFIX) {
            format!("{LOCAL_ARCHIVE_PREFIX}[{safe}]")
        } else {
            match split_archive_name(old) {
                Some((owner, _)) => format!("{owner}:{safe}"),
                None => safe,
            }
        };

        if !self.archive.rename_parameter(old, &new) {
            tracing::warn!("Archive refused to rename {old}");
            return None;
        }
        self.update_graph_connections_for_parameter(graph, old, &new);
        Some(new)
    }

    /// Drain pending archive changes and apply them. Renames are propagated
    /// to ports, edited sources invalidate every preview shader, and the
    /// material parameters are refreshed. Returns whether the document changed.
    pub fn apply_archive_changes(
        &self,
        subscription: &ChangeSubscription,
        document: &mut ShaderDocument,
        graph: &mut ShaderGraph,
    ) -> bool {
        let changes = subscription.poll();
        if changes.is_empty() {
            return false;
        }

        for change in &changes {
            match change {
                ArchiveChange::ParameterRenamed { old, new } => {
                    self.update_graph_connections_for_parameter(graph, old, new);
                }
                ArchiveChange::FragmentChanged(path) => {
                    tracing::debug!("Fragment {path} changed; invalidating previews");
                    graph.invalidate_shader_structure();
                }
            }
        }

        self.fill_in_material_parameters(document, graph)
    }
}
