//! Outbound pump

use super::SessionError;
use crate::protocol::FRAME_SEPARATOR;
use axum::extract::ws::Message;
use futures_util::{Sink, SinkExt};
use hub_core::{Payload, SessionId};
use std::fmt::Display;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// How the outbound pump ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteExit {
    /// The hub closed the queue and everything queued was written
    QueueClosed,
}

/// Drains the outbound queue onto the connection and keeps it alive with pings
pub(crate) struct Writer<W> {
    pub(crate) id: SessionId,
    pub(crate) sink: W,
    pub(crate) outbound: mpsc::Receiver<Payload>,
    pub(crate) shutdown: CancellationToken,
    pub(crate) ping_period: Duration,
    pub(crate) write_wait: Duration,
}

impl<W> Writer<W>
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    /// Pump until the queue closes or a write fails; either way the session
    /// is torn down
    pub(crate) async fn run(mut self) -> Result<WriteExit, SessionError> {
        let result = self.pump().await;

        if let Err(e) = &result {
            tracing::debug!(session_id = %self.id, error = %e, code = e.code(), "Write failed");
        }

        self.shutdown.cancel();
        result
    }

    async fn pump(&mut self) -> Result<WriteExit, SessionError> {
        let mut heartbeat = interval_at(Instant::now() + self.ping_period, self.ping_period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // A due ping goes out even while the queue never drains.
            tokio::select! {
                biased;
                _ = heartbeat.tick() => {
                    self.send(Message::Ping(Vec::new())).await?;
                    tracing::trace!(session_id = %self.id, "Ping sent");
                }
                payload = self.outbound.recv() => match payload {
                    Some(first) => {
                        let frame = self.coalesce(&first);
                        self.send(Message::Text(frame)).await?;
                    }
                    None => {
                        // Peer may already be gone; the close frame is a courtesy.
                        let _ = self.send(Message::Close(None)).await;
                        return Ok(WriteExit::QueueClosed);
                    }
                },
            }
        }
    }

    /// Join `first` with whatever is queued right now, in dequeue order
    fn coalesce(&mut self, first: &str) -> String {
        let pending = self.outbound.len();
        let mut frame = String::from(first);

        for _ in 0..pending {
            match self.outbound.try_recv() {
                Ok(next) => {
                    frame.push(FRAME_SEPARATOR);
                    frame.push_str(&next);
                }
                Err(_) => break,
            }
        }

        frame
    }

    async fn send(&mut self, message: Message) -> Result<(), SessionError> {
        match timeout(self.write_wait, self.sink.send(message)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(SessionError::Connection(e.to_string())),
            Err(_) => Err(SessionError::WriteTimeout(self.write_wait)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc as transport;
    use futures::StreamExt;

    fn writer<W>(sink: W, outbound: mpsc::Receiver<Payload>) -> Writer<W> {
        Writer {
            id: SessionId::generate(),
            sink,
            outbound,
            shutdown: CancellationToken::new(),
            ping_period: Duration::from_secs(54),
            write_wait: Duration::from_secs(10),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_messages_are_coalesced() {
        let (tx, rx) = mpsc::channel(8);
        for line in ["one", "two", "three"] {
            tx.try_send(Payload::from(line)).unwrap();
        }
        drop(tx);

        let (sink, mut frames) = transport::unbounded();
        let exit = writer(sink, rx).run().await.unwrap();

        assert_eq!(exit, WriteExit::QueueClosed);
        assert_eq!(
            frames.next().await,
            Some(Message::Text("one\ntwo\nthree".to_string()))
        );
        assert_eq!(frames.next().await, Some(Message::Close(None)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_message_is_sent_alone() {
        let (tx, rx) = mpsc::channel(8);
        let (sink, mut frames) = transport::unbounded();
        let task = tokio::spawn(writer(sink, rx).run());

        tx.send(Payload::from("solo")).await.unwrap();
        assert_eq!(frames.next().await, Some(Message::Text("solo".to_string())));

        drop(tx);
        assert_eq!(task.await.unwrap().unwrap(), WriteExit::QueueClosed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_pings_idle_connection() {
        let (tx, rx) = mpsc::channel(8);
        let (sink, mut frames) = transport::unbounded();
        let task = tokio::spawn(writer(sink, rx).run());

        let start = Instant::now();
        assert_eq!(frames.next().await, Some(Message::Ping(Vec::new())));
        assert!(start.elapsed() >= Duration::from_secs(54));

        drop(tx);
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_keeps_pace_with_steady_traffic() {
        let (tx, rx) = mpsc::channel(256);
        // Each frame is taken only after the previous one was read, 10ms apart.
        let (sink, mut frames) = transport::channel(0);
        let mut writer = writer(sink, rx);
        writer.ping_period = Duration::from_secs(1);
        let task = tokio::spawn(writer.run());

        // A new message every 5ms keeps the queue from ever draining.
        let producer = tokio::spawn(async move {
            for i in 0..1000 {
                tx.send(Payload::from(format!("m{i}"))).await.unwrap();
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        });

        let (mut texts, mut pings) = (0, 0);
        while let Some(frame) = frames.next().await {
            match frame {
                Message::Text(_) => texts += 1,
                Message::Ping(_) => pings += 1,
                _ => {}
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        producer.await.unwrap();
        assert_eq!(task.await.unwrap().unwrap(), WriteExit::QueueClosed);
        assert!(texts > 0);
        // Five seconds of traffic with a one second period.
        assert!(pings >= 4, "pings={pings} texts={texts}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_write_times_out_and_shuts_down() {
        let (tx, rx) = mpsc::channel(8);
        // A zero-buffer sink never flushes while nobody reads it.
        let (sink, _frames) = transport::channel(0);
        let writer = writer(sink, rx);
        let shutdown = writer.shutdown.clone();
        let task = tokio::spawn(writer.run());

        tx.send(Payload::from("stalls")).await.unwrap();

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, SessionError::WriteTimeout(_)), "{err}");
        assert!(shutdown.is_cancelled());
    }

    #[tokio::test]
    async fn test_failed_send_is_connection_error() {
        let (tx, rx) = mpsc::channel(8);
        let (sink, frames) = transport::unbounded();
        drop(frames);
        tx.send(Payload::from("lost")).await.unwrap();

        let err = writer(sink, rx).run().await.unwrap_err();
        assert!(matches!(err, SessionError::Connection(_)), "{err}");
    }
}
