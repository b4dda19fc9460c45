//! Hub coordinator
//!
//! A single task owns the registry of live sessions. Session tasks talk to it
//! through a [`HubHandle`]; every registry mutation happens inside
//! [`Hub::run`], one request at a time, in arrival order.

mod handle;
mod history;

pub use handle::{HubError, HubHandle};
pub use history::{spawn_history_writer, HistorySink, ReplayBuffer};

use crate::protocol::offline_notice;
use handle::Command;
use hub_core::{BroadcastMessage, Payload, SessionId};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

/// A registered session as seen by the hub
#[derive(Debug)]
pub struct Member {
    id: SessionId,
    name: Arc<str>,
    outbound: mpsc::Sender<Payload>,
}

impl Member {
    /// Create a registry entry
    ///
    /// `outbound` must be the only sender of the session's queue: dropping the
    /// member is what closes the queue.
    pub fn new(id: SessionId, name: impl Into<Arc<str>>, outbound: mpsc::Sender<Payload>) -> Self {
        Self {
            id,
            name: name.into(),
            outbound,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Outcome of one fanout pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FanoutReport {
    /// Sessions the payload was enqueued for
    pub delivered: usize,
    /// Sessions removed in this pass because their queue was full or closed
    pub dropped: Vec<SessionId>,
}

/// Registry snapshot
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HubStats {
    /// Registered sessions
    pub sessions: usize,
    /// Broadcasts processed since start
    pub broadcasts: u64,
    /// Sessions dropped during fanout since start
    pub dropped: u64,
}

/// The coordinator actor
#[derive(Debug)]
pub struct Hub {
    members: HashMap<SessionId, Member>,
    commands: mpsc::Receiver<Command>,
    history: HistorySink,
    replay: ReplayBuffer,
    broadcasts: u64,
    dropped: u64,
}

impl Hub {
    /// Create a hub and the handle used to reach it
    ///
    /// General payloads are forwarded to `history` after fanout and kept in
    /// `replay` for sessions that register later.
    pub fn new(
        command_buffer: usize,
        history: HistorySink,
        replay: ReplayBuffer,
    ) -> (Self, HubHandle) {
        let (tx, rx) = mpsc::channel(command_buffer);
        let hub = Self {
            members: HashMap::new(),
            commands: rx,
            history,
            replay,
            broadcasts: 0,
            dropped: 0,
        };
        (hub, HubHandle::new(tx))
    }

    /// Run the loop on its own task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Process requests until every [`HubHandle`] is dropped
    pub async fn run(mut self) {
        tracing::info!("Hub started");

        while let Some(command) = self.commands.recv().await {
            self.handle(command);
        }

        tracing::info!(sessions = self.members.len(), "Hub stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Register { member, reply } => {
                let _ = reply.send(self.register(member));
            }
            Command::Unregister { id, reply } => {
                let _ = reply.send(self.unregister(id));
            }
            Command::Broadcast(message) => {
                self.broadcast(message);
            }
            Command::Evict { id, notice, reply } => {
                let _ = reply.send(self.evict(id, notice));
            }
            Command::Stats { reply } => {
                let _ = reply.send(self.stats());
            }
            Command::Contains { id, reply } => {
                let _ = reply.send(self.contains(id));
            }
        }
    }

    /// Replay recent history onto the session's queue, then add it to the
    /// registry; returns how many payloads were replayed
    ///
    /// Replay keeps one queue slot free for the session's own Online notice,
    /// so a small queue gets the newest entries that fit.
    pub fn register(&mut self, member: Member) -> usize {
        let room = member.outbound.max_capacity().saturating_sub(1);
        let skip = self.replay.len().saturating_sub(room);
        let mut replayed = 0;
        for payload in self.replay.iter().skip(skip) {
            if member.outbound.try_send(payload.clone()).is_err() {
                break;
            }
            replayed += 1;
        }

        let id = member.id;
        let name = member.name.clone();
        if self.members.insert(id, member).is_some() {
            tracing::warn!(session_id = %id, "Session registered twice, replacing entry");
        }
        tracing::info!(
            session_id = %id,
            name = %name,
            replayed,
            sessions = self.members.len(),
            "Session registered"
        );
        replayed
    }

    /// Remove a session and close its queue; returns whether it was present
    pub fn unregister(&mut self, id: SessionId) -> bool {
        match self.members.remove(&id) {
            Some(member) => {
                tracing::info!(
                    session_id = %id,
                    name = %member.name,
                    sessions = self.members.len(),
                    "Session unregistered"
                );
                true
            }
            None => false,
        }
    }

    /// Enqueue `message` on every registered session without blocking
    ///
    /// A session whose queue is full or closed is removed in the same pass.
    /// A full queue is a backpressure drop and gets no notice; a closed queue
    /// means the writer failed, and an Offline notice follows the pass.
    /// General payloads are then kept for replay and handed to the history
    /// writer.
    pub fn broadcast(&mut self, message: BroadcastMessage) -> FanoutReport {
        let mut report = FanoutReport::default();
        let mut failed = Vec::new();
        let payload = message.payload();

        self.members
            .retain(|id, member| match member.outbound.try_send(payload.clone()) {
                Ok(()) => {
                    report.delivered += 1;
                    true
                }
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(
                        session_id = %id,
                        name = %member.name,
                        "Outbound queue full, dropping session"
                    );
                    report.dropped.push(*id);
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(session_id = %id, "Outbound queue closed, dropping session");
                    report.dropped.push(*id);
                    failed.push(member.name.clone());
                    false
                }
            });

        self.broadcasts += 1;
        self.dropped += report.dropped.len() as u64;

        tracing::trace!(
            kind = %message.kind(),
            delivered = report.delivered,
            dropped = report.dropped.len(),
            "Broadcast fanned out"
        );

        if message.kind().is_persisted() {
            let payload = message.into_payload();
            self.replay.push(payload.clone());
            self.history.record(payload);
        }

        for name in failed {
            self.broadcast(BroadcastMessage::offline(offline_notice(&name)));
        }

        report
    }

    /// Unregister `id` and, only if it was present, broadcast `notice`
    pub fn evict(&mut self, id: SessionId, notice: BroadcastMessage) -> bool {
        if !self.unregister(id) {
            return false;
        }
        self.broadcast(notice);
        true
    }

    /// Current registry snapshot
    pub fn stats(&self) -> HubStats {
        HubStats {
            sessions: self.members.len(),
            broadcasts: self.broadcasts,
            dropped: self.dropped,
        }
    }

    /// Whether `id` is registered
    pub fn contains(&self, id: SessionId) -> bool {
        self.members.contains_key(&id)
    }

    /// Number of registered sessions
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether no session is registered
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
