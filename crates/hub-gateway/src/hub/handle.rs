//! Client side of the hub loop

use super::{HubStats, Member};
use hub_core::{BroadcastMessage, Payload, SessionId};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Hub errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HubError {
    #[error("Hub is no longer running")]
    Closed,
}

impl<T> From<mpsc::error::SendError<T>> for HubError {
    fn from(_: mpsc::error::SendError<T>) -> Self {
        Self::Closed
    }
}

impl From<oneshot::error::RecvError> for HubError {
    fn from(_: oneshot::error::RecvError) -> Self {
        Self::Closed
    }
}

/// Requests processed by the hub loop
#[derive(Debug)]
pub(super) enum Command {
    Register {
        member: Member,
        reply: oneshot::Sender<usize>,
    },
    Unregister {
        id: SessionId,
        reply: oneshot::Sender<bool>,
    },
    Broadcast(BroadcastMessage),
    Evict {
        id: SessionId,
        notice: BroadcastMessage,
        reply: oneshot::Sender<bool>,
    },
    Stats {
        reply: oneshot::Sender<HubStats>,
    },
    Contains {
        id: SessionId,
        reply: oneshot::Sender<bool>,
    },
}

/// Cloneable handle to a running [`Hub`](super::Hub)
///
/// The hub loop stops once every handle is dropped.
#[derive(Debug, Clone)]
pub struct HubHandle {
    commands: mpsc::Sender<Command>,
}

impl HubHandle {
    pub(super) fn new(commands: mpsc::Sender<Command>) -> Self {
        Self { commands }
    }

    /// Register a session with its outbound queue
    ///
    /// Recent history is queued before the session joins the registry.
    /// Returns how many payloads were replayed.
    ///
    /// # Errors
    /// Returns `HubError::Closed` if the hub loop has stopped.
    pub async fn register(
        &self,
        id: SessionId,
        name: impl Into<Arc<str>>,
        outbound: mpsc::Sender<Payload>,
    ) -> Result<usize, HubError> {
        let member = Member::new(id, name, outbound);
        self.request(|reply| Command::Register { member, reply })
            .await
    }

    /// Unregister a session; `Ok(false)` if it was not registered
    ///
    /// # Errors
    /// Returns `HubError::Closed` if the hub loop has stopped.
    pub async fn unregister(&self, id: SessionId) -> Result<bool, HubError> {
        self.request(|reply| Command::Unregister { id, reply }).await
    }

    /// Submit a message for fanout
    ///
    /// # Errors
    /// Returns `HubError::Closed` if the hub loop has stopped.
    pub async fn broadcast(&self, message: BroadcastMessage) -> Result<(), HubError> {
        self.commands.send(Command::Broadcast(message)).await?;
        Ok(())
    }

    /// Unregister a session and broadcast `notice` if it was registered
    ///
    /// # Errors
    /// Returns `HubError::Closed` if the hub loop has stopped.
    pub async fn evict(&self, id: SessionId, notice: BroadcastMessage) -> Result<bool, HubError> {
        self.request(|reply| Command::Evict { id, notice, reply })
            .await
    }

    /// Registry snapshot
    ///
    /// # Errors
    /// Returns `HubError::Closed` if the hub loop has stopped.
    pub async fn stats(&self) -> Result<HubStats, HubError> {
        self.request(|reply| Command::Stats { reply }).await
    }

    /// Whether `id` is currently registered
    ///
    /// # Errors
    /// Returns `HubError::Closed` if the hub loop has stopped.
    pub async fn is_registered(&self, id: SessionId) -> Result<bool, HubError> {
        self.request(|reply| Command::Contains { id, reply }).await
    }

    /// Whether the hub loop has stopped
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, HubError> {
        let (reply, response) = oneshot::channel();
        self.commands.send(build(reply)).await?;
        Ok(response.await?)
    }
}
