//! History persistence and replay
//!
//! The hub never awaits the store. General payloads are handed to a
//! dedicated writer task through a bounded queue, in fanout order. Replay
//! comes from a [`ReplayBuffer`] the hub keeps next to its registry, so a
//! joiner sees every payload fanned out before it registered whether or not
//! the append has landed yet.

use hub_core::{MessageStore, Payload, SharedMessageStore};
use std::collections::VecDeque;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

/// Non-blocking hand-off from the hub to the history writer
#[derive(Debug, Clone)]
pub struct HistorySink {
    tx: mpsc::Sender<Payload>,
}

impl HistorySink {
    /// Create a sink and the receiving end a writer drains
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Payload>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Queue a payload for persistence, dropping it if the writer is behind
    pub fn record(&self, payload: Payload) {
        match self.tx.try_send(payload) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!("History queue full, entry not persisted");
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!("History writer stopped, entry not persisted");
            }
        }
    }
}

/// Spawn the task appending queued payloads to `store`
pub fn spawn_history_writer(
    store: SharedMessageStore,
    capacity: usize,
) -> (HistorySink, JoinHandle<()>) {
    let (sink, rx) = HistorySink::channel(capacity);
    let task = tokio::spawn(write_history(store, rx));
    (sink, task)
}

async fn write_history(store: SharedMessageStore, mut rx: mpsc::Receiver<Payload>) {
    while let Some(payload) = rx.recv().await {
        if let Err(e) = store.append(&payload).await {
            tracing::warn!(
                error = %e,
                code = e.code(),
                transient = e.is_transient(),
                "Failed to persist history entry"
            );
        }
    }

    tracing::debug!("History writer stopped");
}

/// The newest General payloads, oldest first
#[derive(Debug, Clone, Default)]
pub struct ReplayBuffer {
    depth: usize,
    entries: VecDeque<Payload>,
}

impl ReplayBuffer {
    /// An empty buffer holding at most `depth` payloads
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            entries: VecDeque::with_capacity(depth),
        }
    }

    /// Seed a buffer with the newest `depth` persisted entries
    ///
    /// A store failure yields an empty buffer; the hub still starts.
    pub async fn load(store: &dyn MessageStore, depth: usize) -> Self {
        let mut buffer = Self::new(depth);
        if depth == 0 {
            return buffer;
        }

        match store.recent_chronological(depth).await {
            Ok(entries) => {
                for entry in entries {
                    buffer.push(Payload::from(entry));
                }
                tracing::debug!(entries = buffer.len(), "Replay buffer seeded from history");
            }
            Err(e) => {
                tracing::warn!(error = %e, code = e.code(), "Failed to load history for replay");
            }
        }

        buffer
    }

    /// Append a payload, evicting the oldest once full
    pub fn push(&mut self, payload: Payload) {
        if self.depth == 0 {
            return;
        }
        if self.entries.len() == self.depth {
            self.entries.pop_front();
        }
        self.entries.push_back(payload);
    }

    /// Payloads, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Payload> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
