//! Per-connection session
//!
//! A session runs three tasks over one established connection:
//!
//! - the inbound pump turns frames into hub broadcasts,
//! - the outbound pump drains the session's queue onto the wire,
//! - the [`LivenessMonitor`] evicts the session after an idle timeout.
//!
//! They share a [`CancellationToken`]; whichever task ends first fires it so
//! the others follow. The hub owns the only sender of the outbound queue, so
//! unregistering closes it and the writer drains and stops.

mod error;
mod liveness;
mod reader;
mod writer;

pub use error::SessionError;
pub use liveness::{LivenessExit, LivenessMonitor};
pub use reader::ReadExit;
pub use writer::WriteExit;

use crate::hub::HubHandle;
use crate::protocol::online_notice;
use axum::extract::ws::Message;
use futures_util::{Sink, Stream};
use hub_common::HubConfig;
use hub_core::{BroadcastMessage, SessionId};
use reader::Reader;
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use writer::Writer;

/// A connection that has not joined the hub yet
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    name: Arc<str>,
    config: Arc<HubConfig>,
}

impl Session {
    /// Create a session with a fresh id
    pub fn new(name: impl Into<Arc<str>>, config: Arc<HubConfig>) -> Self {
        Self {
            id: SessionId::generate(),
            name: name.into(),
            config,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Join the hub and start the session tasks
    ///
    /// The hub queues recent history while registering the session, so it
    /// reaches the peer ahead of any live traffic, including the session's
    /// own Online notice. If the hub is gone, the queue closes and the
    /// already started writer closes the connection.
    ///
    /// # Errors
    /// Returns `SessionError::Hub` if the hub has stopped.
    pub async fn establish<R, W>(
        self,
        hub: &HubHandle,
        stream: R,
        sink: W,
    ) -> Result<SessionTasks, SessionError>
    where
        R: Stream<Item = Result<Message, axum::Error>> + Unpin + Send + 'static,
        W: Sink<Message> + Unpin + Send + 'static,
        W::Error: Display + Send,
    {
        let Self { id, name, config } = self;

        let (outbound_tx, outbound_rx) = mpsc::channel(config.outbound_capacity);
        let shutdown = CancellationToken::new();
        let writer = tokio::spawn(
            Writer {
                id,
                sink,
                outbound: outbound_rx,
                shutdown: shutdown.clone(),
                ping_period: config.ping_period(),
                write_wait: config.write_wait(),
            }
            .run(),
        );

        let replayed = hub.register(id, name.clone(), outbound_tx).await?;
        hub.broadcast(BroadcastMessage::online(online_notice(&name)))
            .await?;

        tracing::info!(session_id = %id, name = %name, replayed, "Session established");

        let (activity_tx, activity_rx) = mpsc::channel(1);
        let reader = tokio::spawn(
            Reader {
                id,
                name: name.clone(),
                stream,
                hub: hub.clone(),
                activity: activity_tx,
                shutdown: shutdown.clone(),
                pong_wait: config.pong_wait(),
                max_message_size: config.max_message_size,
            }
            .run(),
        );

        let monitor = tokio::spawn(
            LivenessMonitor::new(
                id,
                name.clone(),
                hub.clone(),
                activity_rx,
                shutdown.clone(),
                config.liveness_timeout(),
            )
            .run(),
        );

        Ok(SessionTasks {
            id,
            name,
            shutdown,
            reader,
            writer,
            monitor,
        })
    }
}

/// Running tasks of an established session
#[derive(Debug)]
pub struct SessionTasks {
    id: SessionId,
    name: Arc<str>,
    shutdown: CancellationToken,
    reader: JoinHandle<Result<ReadExit, SessionError>>,
    writer: JoinHandle<Result<WriteExit, SessionError>>,
    monitor: JoinHandle<LivenessExit>,
}

/// How each task of a finished session ended
#[derive(Debug)]
pub struct SessionReport {
    pub id: SessionId,
    pub name: Arc<str>,
    pub read: Result<ReadExit, SessionError>,
    pub write: Result<WriteExit, SessionError>,
    pub liveness: Result<LivenessExit, SessionError>,
}

impl SessionTasks {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tear the session down as if the peer had left
    pub fn close(&self) {
        self.shutdown.cancel();
    }

    /// Wait for all three tasks to finish
    pub async fn wait(self) -> SessionReport {
        let (read, write, liveness) = tokio::join!(self.reader, self.writer, self.monitor);

        SessionReport {
            id: self.id,
            name: self.name,
            read: read.unwrap_or_else(|e| Err(e.into())),
            write: write.unwrap_or_else(|e| Err(e.into())),
            liveness: liveness.map_err(SessionError::from),
        }
    }
}
