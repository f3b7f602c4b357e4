// SPDX-License-Identifier: MIT OR Apache-2.0
//! File system watcher that turns shader source edits into archive changes.
//!
//! Debounced events for files with a shader extension are published as
//! [`ArchiveChange::FragmentChanged`] through the archive's change hub, which
//! the tree model and the synchronizer both subscribe to. Changes to the
//! manifest are reported separately so the host can reload it.

use notify_debouncer_full::{
    new_debouncer,
    notify::{self, EventKind, RecommendedWatcher, RecursiveMode},
    DebounceEventResult, Debouncer, RecommendedCache,
};
use shaderpatch_graph::{ArchiveChange, FragmentArchive};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// What the watcher looks at
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Debounce duration for events
    pub debounce: Duration,
    /// Shader source extensions (case-insensitive)
    pub extensions: Vec<String>,
    /// Manifest file to report separately
    pub manifest: Option<PathBuf>,
}

/// Debounced watcher over the archive root
pub struct ArchiveWatcher {
    debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
    manifest_changed: Arc<AtomicBool>,
}

impl ArchiveWatcher {
    /// Start a watcher publishing to `archive`'s change hub
    pub fn new(config: WatchConfig, archive: Arc<dyn FragmentArchive>) -> Result<Self, notify::Error> {
        let manifest_changed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&manifest_changed);
        let manifest = config.manifest.clone();
        let extensions = config.extensions;

        let debouncer = new_debouncer(config.debounce, None, move |result: DebounceEventResult| {
            let events = match result {
                Ok(events) => events,
                Err(errors) => {
                    for error in errors {
                        tracing::warn!("File watcher error: {error}");
                    }
                    return;
                }
            };

            for event in events {
                if matches!(event.kind, EventKind::Any | EventKind::Access(_) | EventKind::Other) {
                    continue;
                }
                for path in &event.paths {
                    if manifest.as_deref().is_some_and(|m| same_file(m, path)) {
                        flag.store(true, Ordering::Release);
                    } else if is_shader_source(path, &extensions) {
                        tracing::debug!("Shader source changed: {}", path.display());
                        archive
                            .changes()
                            .publish(ArchiveChange::FragmentChanged(path.to_string_lossy().into_owned()));
                    }
                }
            }
        })?;

        Ok(Self {
            debouncer,
            manifest_changed,
        })
    }

    /// Watch a directory tree
    pub fn watch_dir(&mut self, path: &Path) -> Result<(), notify::Error> {
        self.debouncer.watch(path, RecursiveMode::Recursive)?;
        tracing::info!("Watching directory for changes: {}", path.display());
        Ok(())
    }

    /// Watch a single file
    pub fn watch_file(&mut self, path: &Path) -> Result<(), notify::Error> {
        self.debouncer.watch(path, RecursiveMode::NonRecursive)?;
        tracing::info!("Watching file for changes: {}", path.display());
        Ok(())
    }

    /// Whether the manifest changed since the last call
    pub fn take_manifest_changed(&self) -> bool {
        self.manifest_changed.swap(false, Ordering::AcqRel)
    }
}

/// Whether `path` has one of the shader extensions
pub fn is_shader_source(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)))
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => b.ends_with(a),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_source_filter() {
        let extensions: Vec<String> = ["sh", "psh"].into_iter().map(String::from).collect();
        assert!(is_shader_source(Path::new("/x/lighting.sh"), &extensions));
        assert!(is_shader_source(Path::new("/x/Basic.PSH"), &extensions));
        assert!(!is_shader_source(Path::new("/x/notes.txt"), &extensions));
        assert!(!is_shader_source(Path::new("/x/Makefile"), &extensions));
    }

    #[test]
    fn test_same_file_matches_relative_manifest() {
        assert!(same_file(
            Path::new("shaderpatch_manifest.ron"),
            Path::new("/work/missing/shaderpatch_manifest.ron")
        ));
        assert!(!same_file(Path::new("a.ron"), Path::new("/work/b.ron")));
    }
}
