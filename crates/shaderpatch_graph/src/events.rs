// SPDX-License-Identifier: MIT OR Apache-2.0
//! Change notification between the fragment archive and its consumers.

use parking_lot::Mutex;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

/// A change published by the fragment archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveChange {
    /// The shader source at this path was edited or reparsed
    FragmentChanged(String),
    /// A parameter moved to a new archive-qualified key
    ParameterRenamed {
        /// Previous key
        old: String,
        /// New key
        new: String,
    },
}

/// Fan-out of archive changes to any number of subscribers.
///
/// Every subscriber receives every change published after it subscribed.
#[derive(Debug, Default)]
pub struct ChangeHub {
    subscribers: Mutex<Vec<Sender<ArchiveChange>>>,
}

impl ChangeHub {
    /// Create a hub with no subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber
    pub fn subscribe(&self) -> ChangeSubscription {
        let (tx, rx) = mpsc::channel();
        self.subscribers.lock().push(tx);
        ChangeSubscription { rx }
    }

    /// Deliver a change to all live subscribers, dropping the ones that hung up
    pub fn publish(&self, change: ArchiveChange) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(change.clone()).is_ok());
        tracing::debug!(
            "Published archive change {:?} to {} subscriber(s)",
            change,
            subscribers.len()
        );
    }

    /// Number of live subscribers (as of the last publish)
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

/// Receiving end of a [`ChangeHub`] registration
#[derive(Debug)]
pub struct ChangeSubscription {
    rx: Receiver<ArchiveChange>,
}

impl ChangeSubscription {
    /// Poll for pending changes (non-blocking)
    pub fn poll(&self) -> Vec<ArchiveChange> {
        let mut changes = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(change) => changes.push(change),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::warn!("Archive change channel disconnected");
                    break;
                }
            }
        }
        changes
    }
}
