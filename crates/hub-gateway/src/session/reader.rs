//! Inbound pump

use super::SessionError;
use crate::hub::HubHandle;
use crate::protocol::{normalize, offline_notice, stamp};
use axum::extract::ws::Message;
use futures_util::{Stream, StreamExt};
use hub_core::{BroadcastMessage, SessionId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;

/// How the inbound pump ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadExit {
    /// The peer sent a close frame or the stream ended
    PeerClosed,
    /// Another task tore the session down
    Shutdown,
}

/// Reads frames from the peer and submits them to the hub
pub(crate) struct Reader<R> {
    pub(crate) id: SessionId,
    pub(crate) name: Arc<str>,
    pub(crate) stream: R,
    pub(crate) hub: HubHandle,
    pub(crate) activity: mpsc::Sender<()>,
    pub(crate) shutdown: CancellationToken,
    pub(crate) pong_wait: Duration,
    pub(crate) max_message_size: usize,
}

impl<R> Reader<R>
where
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    /// Pump until the peer leaves, then evict the session
    ///
    /// The Offline notice is only broadcast if the session was still
    /// registered, so a session already dropped or forced offline stays quiet.
    pub(crate) async fn run(mut self) -> Result<ReadExit, SessionError> {
        let result = self.pump().await;

        if let Err(e) = &result {
            tracing::debug!(session_id = %self.id, error = %e, code = e.code(), "Read failed");
        }

        let notice = BroadcastMessage::offline(offline_notice(&self.name));
        match self.hub.evict(self.id, notice).await {
            Ok(true) => tracing::info!(session_id = %self.id, name = %self.name, "Session went offline"),
            Ok(false) => {}
            Err(e) => tracing::debug!(session_id = %self.id, error = %e, "Hub gone before eviction"),
        }

        self.shutdown.cancel();
        result
    }

    async fn pump(&mut self) -> Result<ReadExit, SessionError> {
        let mut deadline = Instant::now() + self.pong_wait;

        loop {
            let frame = tokio::select! {
                () = self.shutdown.cancelled() => return Ok(ReadExit::Shutdown),
                frame = timeout_at(deadline, self.stream.next()) => frame,
            };

            let message = match frame {
                Err(_) => return Err(SessionError::ReadTimeout(self.pong_wait)),
                Ok(None) => return Ok(ReadExit::PeerClosed),
                Ok(Some(Err(e))) => return Err(SessionError::Connection(e.to_string())),
                Ok(Some(Ok(message))) => message,
            };

            match message {
                Message::Text(text) => self.accept(text.len(), &text).await?,
                Message::Binary(bytes) => {
                    self.accept(bytes.len(), &String::from_utf8_lossy(&bytes))
                        .await?;
                }
                Message::Pong(_) => {
                    deadline = Instant::now() + self.pong_wait;
                    tracing::trace!(session_id = %self.id, "Pong received");
                }
                Message::Ping(_) => {
                    tracing::trace!(session_id = %self.id, "Ping received");
                }
                Message::Close(_) => {
                    tracing::debug!(session_id = %self.id, "Peer closed connection");
                    return Ok(ReadExit::PeerClosed);
                }
            }
        }
    }

    /// Normalize, stamp and broadcast one application message
    async fn accept(&mut self, size: usize, raw: &str) -> Result<(), SessionError> {
        if size > self.max_message_size {
            return Err(SessionError::ProtocolViolation {
                size,
                limit: self.max_message_size,
            });
        }

        let body = normalize(raw);
        if body.is_empty() {
            tracing::trace!(session_id = %self.id, "Blank message skipped");
        } else {
            let line = stamp(&self.name, chrono::Local::now().time(), &body);
            self.hub.broadcast(BroadcastMessage::general(line)).await?;
        }

        // Best effort: a pending signal already covers this message.
        let _ = self.activity.try_send(());
        Ok(())
    }
}
