// SPDX-License-Identifier: MIT OR Apache-2.0
//! Preview session: a graph built from the archive and kept in sync with it.

use shaderpatch_graph::factory::{parameter_from_archive, procedure_from_archive};
use shaderpatch_graph::{
    ChangeSubscription, FragmentArchive, GraphSynchronizer, MemoryArchive, ShaderDocument,
    ShaderGraph, ShaderTypeRules, SourceType,
};
use std::sync::Arc;

/// A graph holding one node per archive declaration, with its document
pub struct PreviewSession {
    archive: Arc<MemoryArchive>,
    rules: ShaderTypeRules,
    subscription: ChangeSubscription,
    /// The preview graph
    pub graph: ShaderGraph,
    /// Material parameter state
    pub document: ShaderDocument,
}

impl PreviewSession {
    /// Build a procedure node for every function and a material parameter
    /// node for every parameter struct in the archive
    pub fn new(archive: Arc<MemoryArchive>) -> Self {
        let subscription = archive.changes().subscribe();
        let mut graph = ShaderGraph::new("preview");

        for path in archive.paths() {
            let fragment = archive.fragment(&path);
            for function in &fragment.functions {
                let key = format!("{path}:{}", function.name);
                graph.add_node(procedure_from_archive(archive.as_ref(), &key));
            }
            for parameters in &fragment.parameter_structs {
                let key = format!("{path}:{}", parameters.name);
                graph.add_node(parameter_from_archive(
                    archive.as_ref(),
                    &key,
                    SourceType::Material,
                ));
            }
        }

        let mut session = Self {
            archive,
            rules: ShaderTypeRules::new(),
            subscription,
            graph,
            document: ShaderDocument::new(),
        };
        let rules = &session.rules;
        GraphSynchronizer::new(session.archive.as_ref(), rules)
            .fill_in_material_parameters(&mut session.document, &session.graph);
        tracing::info!(
            "Preview graph has {} node(s), {} material parameter(s)",
            session.graph.node_count(),
            session.document.preview_material_state.len()
        );
        session
    }

    /// Apply pending archive changes. Returns whether the document changed.
    pub fn sync(&mut self) -> bool {
        GraphSynchronizer::new(self.archive.as_ref(), &self.rules).apply_archive_changes(
            &self.subscription,
            &mut self.document,
            &mut self.graph,
        )
    }
}
