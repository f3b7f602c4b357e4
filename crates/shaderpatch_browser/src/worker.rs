// SPDX-License-Identifier: MIT OR Apache-2.0
//! Background enrichment of tree items with size and timestamp.
//!
//! Requests are processed strictly in the order they were queued, one at a
//! time, by a single worker thread. Requests queued while the worker is busy
//! simply wait their turn. Results flow back over a second channel and are
//! applied by the model's owner when it polls.

use crate::fs::FileSystem;
use crate::item::ItemHandle;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::mpsc;

/// Which attributes to look up for an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// Directory: timestamp only
    Folder,
    /// File: size and timestamp
    File,
    /// Nothing on disk to read (functions, parameter structs)
    Nothing,
}

/// An item waiting for enrichment
#[derive(Debug, Clone)]
pub struct EnrichRequest {
    /// Item to update
    pub handle: ItemHandle,
    /// Path on disk
    pub path: PathBuf,
    /// What to read
    pub probe: Probe,
}

/// Attributes read for an item
#[derive(Debug, Clone)]
pub struct EnrichResult {
    /// Item to update
    pub handle: ItemHandle,
    /// Size in bytes, when read
    pub size: Option<u64>,
    /// Modification time, when read
    pub modified: Option<SystemTime>,
}

/// Owner of the worker thread and both channel ends the model uses
pub struct EnrichmentWorker {
    request_tx: mpsc::UnboundedSender<EnrichRequest>,
    result_rx: mpsc::UnboundedReceiver<EnrichResult>,
    pending: usize,
}

impl EnrichmentWorker {
    /// Spawn the worker thread
    pub fn spawn(fs: Arc<dyn FileSystem>) -> Self {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (result_tx, result_rx) = mpsc::unbounded_channel();

        let spawned = std::thread::Builder::new()
            .name("shaderpatch-enrich".to_string())
            .spawn(move || enrichment_worker(fs, request_rx, result_tx));
        if let Err(e) = spawned {
            tracing::error!("Failed to spawn enrichment worker: {e}");
        }

        Self {
            request_tx,
            result_rx,
            pending: 0,
        }
    }

    /// Queue items behind whatever is already waiting
    pub fn enqueue(&mut self, requests: impl IntoIterator<Item = EnrichRequest>) {
        for request in requests {
            if self.request_tx.send(request).is_err() {
                tracing::warn!("Enrichment worker is gone; dropping request");
                continue;
            }
            self.pending += 1;
        }
    }

    /// Take every finished result (non-blocking)
    pub fn drain(&mut self) -> Vec<EnrichResult> {
        let mut results = Vec::new();
        while let Ok(result) = self.result_rx.try_recv() {
            self.pending = self.pending.saturating_sub(1);
            results.push(result);
        }
        results
    }

    /// Requests queued but not yet drained
    pub fn pending(&self) -> usize {
        self.pending
    }
}

/// Worker thread loop; exits once the model drops its sender
fn enrichment_worker(
    fs: Arc<dyn FileSystem>,
    mut request_rx: mpsc::UnboundedReceiver<EnrichRequest>,
    result_tx: mpsc::UnboundedSender<EnrichResult>,
) {
    while let Some(request) = request_rx.blocking_recv() {
        let result = enrich(fs.as_ref(), &request);
        if result_tx.send(result).is_err() {
            break;
        }
    }
    tracing::debug!("Enrichment worker finished");
}

fn enrich(fs: &dyn FileSystem, request: &EnrichRequest) -> EnrichResult {
    let mut result = EnrichResult {
        handle: request.handle,
        size: None,
        modified: None,
    };
    if request.probe == Probe::Nothing {
        return result;
    }

    match fs.metadata(&request.path) {
        Ok(meta) => {
            result.modified = meta.modified;
            if request.probe == Probe::File {
                result.size = Some(meta.size);
            }
        }
        Err(e) => {
            tracing::debug!("Could not read attributes of {}: {e}", request.path.display());
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;
    use std::time::{Duration, Instant};

    fn handle(index: u32) -> ItemHandle {
        ItemHandle { index, generation: 0 }
    }

    #[test]
    fn test_results_arrive_in_queue_order() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.add_file("root/a.h", 10);
        fs.add_file("root/b.h", 20);

        let mut worker = EnrichmentWorker::spawn(fs);
        worker.enqueue((0..3).map(|i| EnrichRequest {
            handle: handle(i),
            path: PathBuf::from(["root/a.h", "root/b.h", "root"][i as usize]),
            probe: [Probe::File, Probe::File, Probe::Folder][i as usize],
        }));
        worker.enqueue([EnrichRequest {
            handle: handle(3),
            path: PathBuf::from("root/a.h:Main"),
            probe: Probe::Nothing,
        }]);
        assert_eq!(worker.pending(), 4);

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut results = Vec::new();
        while results.len() < 4 && Instant::now() < deadline {
            results.extend(worker.drain());
            std::thread::sleep(Duration::from_millis(2));
        }

        let order: Vec<u32> = results.iter().map(|r| r.handle.index).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
        assert_eq!(results[0].size, Some(10));
        assert_eq!(results[1].size, Some(20));
        assert_eq!(results[2].size, None);
        assert!(results[3].modified.is_none());
        assert_eq!(worker.pending(), 0);
    }
}
