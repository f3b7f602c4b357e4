// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shader patcher host shell.
//!
//! Loads the editor configuration and the shader manifest, then prints the
//! archive tree and a summary of the preview graph built from it. With
//! watching enabled, it keeps running: edited shader sources invalidate the
//! tree and the previews, and an edited manifest is reloaded.
//!
//! Usage: `shaderpatch_editor [config.ron]`

mod config;
mod manifest;
mod render;
mod session;
mod watcher;

use config::{ConfigError, EditorConfig, DEFAULT_CONFIG_FILE};
use manifest::{ManifestError, ShaderManifest};
use session::PreviewSession;
use shaderpatch_browser::{ArchiveTreeModel, FileSystem, OsFileSystem, TreeEvent};
use shaderpatch_graph::{FragmentArchive, MemoryArchive};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use watcher::{ArchiveWatcher, WatchConfig};

/// Time allowed for size and timestamp lookups before the first print
const ENRICH_WAIT: Duration = Duration::from_secs(2);

/// Interval between polls in watch mode
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Top-level failures
#[derive(Debug, Error)]
enum EditorError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),
}

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(
            "shaderpatch_editor=debug,shaderpatch_browser=info,shaderpatch_graph=info",
        )
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting shader patcher v{}", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from);

    if let Err(e) = run(&config_path) {
        tracing::error!("Shader patcher failed: {e}");
        std::process::exit(1);
    }
}

fn run(config_path: &Path) -> Result<(), EditorError> {
    let config = EditorConfig::load_or_create(config_path)?;

    let archive = Arc::new(MemoryArchive::new());
    load_manifest(&config.manifest, &archive)?;

    let fs: Arc<dyn FileSystem> = Arc::new(OsFileSystem);
    let mut tree = ArchiveTreeModel::new(
        config.tree_config(),
        fs,
        Arc::clone(&archive) as Arc<dyn FragmentArchive>,
    );
    let mut session = PreviewSession::new(Arc::clone(&archive));

    print_tree(&mut tree);
    println!(
        "preview graph: {} node(s), {} material parameter(s)",
        session.graph.node_count(),
        session.document.preview_material_state.len()
    );

    if !config.watch {
        return Ok(());
    }

    let mut watcher = ArchiveWatcher::new(
        WatchConfig {
            debounce: config.debounce(),
            extensions: config.extensions.clone(),
            manifest: Some(config.manifest.clone()),
        },
        Arc::clone(&archive) as Arc<dyn FragmentArchive>,
    )?;
    watcher.watch_dir(Path::new(&config.archive_root))?;
    if config.manifest.exists() {
        watcher.watch_file(&config.manifest)?;
    }

    loop {
        if watcher.take_manifest_changed() {
            if let Err(e) = load_manifest(&config.manifest, &archive) {
                tracing::warn!("Keeping previous declarations: {e}");
            }
        }

        if session.sync() {
            tracing::info!(
                "Material parameters updated ({} total)",
                session.document.preview_material_state.len()
            );
        }

        let events = tree.poll_events();
        if events.contains(&TreeEvent::StructureChanged) {
            print_tree(&mut tree);
        }

        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Install the manifest into `archive`; a missing manifest leaves it empty
fn load_manifest(path: &Path, archive: &MemoryArchive) -> Result<(), ManifestError> {
    if !path.exists() {
        tracing::warn!("No manifest at {}; archive is empty", path.display());
        return Ok(());
    }
    ShaderManifest::load(path)?.install(archive);
    Ok(())
}

fn print_tree(tree: &mut ArchiveTreeModel) {
    // First pass creates the items, the second shows their attributes.
    render::render_tree(tree);
    if !tree.wait_idle(ENRICH_WAIT) {
        tracing::debug!("{} attribute lookup(s) still pending", tree.pending_count());
    }
    println!("{}", tree.config().root);
    print!("{}", render::render_tree(tree));
}
