// SPDX-License-Identifier: MIT OR Apache-2.0
//! Lazily populated tree of the shader archive.
//!
//! Children of a path are computed on first request and then cached under the
//! path key until the structure changes, at which point the whole cache is
//! dropped. Newly created items are handed to the [`EnrichmentWorker`] so that
//! size and timestamp arrive later without blocking the caller.

use crate::fs::FileSystem;
use crate::item::{ItemHandle, ItemKind, TreeItem, TreePath};
use crate::worker::{EnrichRequest, EnrichResult, EnrichmentWorker, Probe};
use shaderpatch_graph::{ArchiveChange, ChangeSubscription, FragmentArchive};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Where the tree starts and which files it shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeModelConfig {
    /// Archive root directory
    pub root: String,
    /// Shader source extensions, matched case-insensitively
    pub extensions: Vec<String>,
}

impl Default for TreeModelConfig {
    fn default() -> Self {
        Self {
            root: "game/xleres/".to_string(),
            extensions: ["shader", "h", "vsh", "psh", "gsh", "sh"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl TreeModelConfig {
    /// Whether a file belongs in the tree
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)))
    }
}

/// Notification for the view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeEvent {
    /// An item's attributes changed
    NodesChanged {
        /// Owner of the item, `None` at root level
        parent: Option<ItemHandle>,
        /// The item
        item: ItemHandle,
    },
    /// The cache was cleared; every handle is invalid
    StructureChanged,
}

/// Cached, lazily expanded view over folders, shader files, functions and
/// parameter structs
pub struct ArchiveTreeModel {
    config: TreeModelConfig,
    fs: Arc<dyn FileSystem>,
    archive: Arc<dyn FragmentArchive>,
    subscription: ChangeSubscription,
    items: Vec<TreeItem>,
    generation: u32,
    children: HashMap<String, Arc<[ItemHandle]>>,
    worker: EnrichmentWorker,
    events: Vec<TreeEvent>,
}

impl ArchiveTreeModel {
    /// Create a model and start its enrichment worker
    pub fn new(
        config: TreeModelConfig,
        fs: Arc<dyn FileSystem>,
        archive: Arc<dyn FragmentArchive>,
    ) -> Self {
        let subscription = archive.changes().subscribe();
        let worker = EnrichmentWorker::spawn(Arc::clone(&fs));
        tracing::info!("Archive tree rooted at {}", config.root);
        Self {
            config,
            fs,
            archive,
            subscription,
            items: Vec::new(),
            generation: 0,
            children: HashMap::new(),
            worker,
            events: Vec::new(),
        }
    }

    /// Model configuration
    pub fn config(&self) -> &TreeModelConfig {
        &self.config
    }

    /// Children of `path`, computed on first request and cached afterwards.
    ///
    /// A directory that cannot be listed yields no children and is retried on
    /// the next request. Leaves and stale handles yield no children.
    pub fn get_children(&mut self, path: &TreePath) -> Arc<[ItemHandle]> {
        let (key, parent) = match path {
            TreePath::Root => (self.config.root.clone(), None),
            TreePath::Item(handle) => match self.item(*handle) {
                Some(item) if !item.is_leaf() => (item.path.clone(), Some(*handle)),
                _ => return Arc::from([]),
            },
        };

        if let Some(cached) = self.children.get(&key) {
            tracing::debug!("Tree cache hit for {key}");
            return Arc::clone(cached);
        }
        tracing::debug!("Tree cache miss for {key}");

        let is_file = parent
            .and_then(|h| self.item(h))
            .is_some_and(|item| matches!(item.kind, ItemKind::ShaderFile { .. }));
        let created = match parent {
            Some(handle) if is_file => Some(self.expand_file(&key, handle)),
            _ => self.list_directory(&key, parent),
        };
        let Some(created) = created else {
            return Arc::from([]);
        };

        let handles: Vec<ItemHandle> = created.into_iter().map(|item| self.push_item(item)).collect();
        let requests: Vec<EnrichRequest> = handles
            .iter()
            .filter_map(|&handle| self.enrich_request(handle))
            .collect();
        self.worker.enqueue(requests);

        let handles: Arc<[ItemHandle]> = handles.into();
        self.children.insert(key, Arc::clone(&handles));
        handles
    }

    /// Whether `path` can never have children
    pub fn is_leaf(&self, path: &TreePath) -> bool {
        match path {
            TreePath::Root => false,
            TreePath::Item(handle) => self.item(*handle).is_some_and(TreeItem::is_leaf),
        }
    }

    /// Resolve a handle; stale handles resolve to nothing
    pub fn item(&self, handle: ItemHandle) -> Option<&TreeItem> {
        if handle.generation != self.generation {
            return None;
        }
        self.items.get(handle.index as usize)
    }

    /// Set an item's check box, raising a nodes-changed event
    pub fn set_checked(&mut self, handle: ItemHandle, checked: bool) -> bool {
        let Some(item) = self.item_mut(handle) else {
            return false;
        };
        item.checked = checked;
        let parent = item.parent;
        self.events.push(TreeEvent::NodesChanged { parent, item: handle });
        true
    }

    /// Drop every cached listing and item and raise a structure-changed event
    pub fn notify_structure_changed(&mut self) {
        tracing::info!(
            "Archive structure changed; dropping {} cached listing(s)",
            self.children.len()
        );
        self.children.clear();
        self.items.clear();
        self.generation = self.generation.wrapping_add(1);
        self.events.push(TreeEvent::StructureChanged);
    }

    /// Apply archive changes and finished enrichment, then hand out all
    /// pending events in the order they were raised
    pub fn poll_events(&mut self) -> Vec<TreeEvent> {
        let changes = self.subscription.poll();
        if changes
            .iter()
            .any(|c| matches!(c, ArchiveChange::FragmentChanged(_)))
        {
            self.notify_structure_changed();
        }
        self.apply_enrichment();
        std::mem::take(&mut self.events)
    }

    /// Enrichment requests not yet applied
    pub fn pending_count(&self) -> usize {
        self.worker.pending()
    }

    /// Apply enrichment results until the queue is empty or `timeout` passes.
    /// Returns whether the queue emptied.
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.apply_enrichment();
            if self.worker.pending() == 0 {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    fn item_mut(&mut self, handle: ItemHandle) -> Option<&mut TreeItem> {
        if handle.generation != self.generation {
            return None;
        }
        self.items.get_mut(handle.index as usize)
    }

    fn push_item(&mut self, item: TreeItem) -> ItemHandle {
        let handle = ItemHandle {
            index: self.items.len() as u32,
            generation: self.generation,
        };
        self.items.push(item);
        handle
    }

    fn list_directory(&self, dir: &str, parent: Option<ItemHandle>) -> Option<Vec<TreeItem>> {
        let listing = match self.fs.read_dir(Path::new(dir)) {
            Ok(listing) => listing,
            Err(e) => {
                tracing::warn!("Failed to list {dir}: {e}");
                return None;
            }
        };

        let folders = listing
            .directories
            .iter()
            .map(|d| TreeItem::folder(d.to_string_lossy().into_owned(), parent));
        let files = listing
            .files
            .iter()
            .filter(|f| self.config.accepts(f))
            .map(|f| TreeItem::shader_file(f.to_string_lossy().into_owned(), parent));
        Some(folders.chain(files).collect())
    }

    fn expand_file(&mut self, path: &str, handle: ItemHandle) -> Vec<TreeItem> {
        let fragment = self.archive.fragment(path);
        if let Some(ItemKind::ShaderFile {
            exception_string, ..
        }) = self.item_mut(handle).map(|item| &mut item.kind)
        {
            exception_string.clone_from(&fragment.exception_string);
        }

        let functions = fragment.functions.iter().map(|f| {
            TreeItem::shader_fragment(
                f.name.clone(),
                f.return_type().to_string(),
                f.parameters_string(),
                format!("{path}:{}", f.name),
                Some(handle),
            )
        });
        let structs = fragment.parameter_structs.iter().map(|s| {
            TreeItem::parameter_struct(
                s.name.clone(),
                s.body_string(),
                format!("{path}:{}", s.name),
                Some(handle),
            )
        });
        functions.chain(structs).collect()
    }

    fn enrich_request(&self, handle: ItemHandle) -> Option<EnrichRequest> {
        let item = self.item(handle)?;
        let probe = match item.kind {
            ItemKind::Folder { .. } => Probe::Folder,
            ItemKind::ShaderFile { .. } => Probe::File,
            ItemKind::ShaderFragment { .. } | ItemKind::ParameterStruct { .. } => Probe::Nothing,
        };
        Some(EnrichRequest {
            handle,
            path: PathBuf::from(&item.path),
            probe,
        })
    }

    fn apply_enrichment(&mut self) {
        for result in self.worker.drain() {
            self.apply_result(result);
        }
    }

    fn apply_result(&mut self, result: EnrichResult) {
        let Some(item) = self.item_mut(result.handle) else {
            tracing::debug!("Discarding enrichment for a cleared item");
            return;
        };
        if let Some(size) = result.size {
            item.size = size;
        }
        if result.modified.is_some() {
            item.modified = result.modified;
        }
        let parent = item.parent;
        self.events.push(TreeEvent::NodesChanged {
            parent,
            item: result.handle,
        });
    }
}
