//! Idle-session watchdog

use crate::hub::HubHandle;
use crate::protocol::forced_offline_notice;
use hub_core::{BroadcastMessage, SessionId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// How the monitor ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessExit {
    /// Idle timeout fired and this monitor removed the session
    Evicted,
    /// Idle timeout fired but the session had already left the hub
    AlreadyUnregistered,
    /// The session was torn down by another path first
    SessionEnded,
    /// The hub stopped before the eviction could be requested
    HubClosed,
}

/// Forces a session offline after a period without inbound messages
#[derive(Debug)]
pub struct LivenessMonitor {
    id: SessionId,
    name: Arc<str>,
    hub: HubHandle,
    activity: mpsc::Receiver<()>,
    shutdown: CancellationToken,
    timeout: Duration,
}

impl LivenessMonitor {
    pub fn new(
        id: SessionId,
        name: Arc<str>,
        hub: HubHandle,
        activity: mpsc::Receiver<()>,
        shutdown: CancellationToken,
        timeout: Duration,
    ) -> Self {
        Self {
            id,
            name,
            hub,
            activity,
            shutdown,
            timeout,
        }
    }

    /// Watch until the session ends or stays idle for the full timeout
    pub async fn run(mut self) -> LivenessExit {
        loop {
            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => return LivenessExit::SessionEnded,
                signal = self.activity.recv() => match signal {
                    Some(()) => {}
                    None => return LivenessExit::SessionEnded,
                },
                () = sleep(self.timeout) => break,
            }
        }

        let notice =
            BroadcastMessage::forced_offline(forced_offline_notice(&self.name, self.timeout));
        let exit = match self.hub.evict(self.id, notice).await {
            Ok(true) => {
                tracing::info!(
                    session_id = %self.id,
                    name = %self.name,
                    idle_ms = self.timeout.as_millis() as u64,
                    "Session forced offline for inactivity"
                );
                LivenessExit::Evicted
            }
            Ok(false) => LivenessExit::AlreadyUnregistered,
            Err(_) => LivenessExit::HubClosed,
        };

        self.shutdown.cancel();
        exit
    }
}
