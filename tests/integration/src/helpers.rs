//! Test helpers for integration tests
//!
//! Provides a test server backed by the in-memory history store and a thin
//! WebSocket client that understands coalesced frames.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use futures_util::{SinkExt, StreamExt};
use hub_common::HubConfig;
use hub_gateway::identity::SequentialNameGenerator;
use hub_gateway::server::{create_app, create_gateway_state, serve};
use hub_store::MemoryHistoryStore;
use reqwest::{Client, Response};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// How long a client waits for the next frame before failing the test
pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Names handed out to connections, in connection order
pub const TEST_NAMES: [&str; 5] = ["alice", "bob", "carol", "dave", "erin"];

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a new test server
    pub async fn start() -> Result<Self> {
        Self::start_with_config(test_hub_config()).await
    }

    /// Start a test server with custom hub tunables
    pub async fn start_with_config(config: HubConfig) -> Result<Self> {
        let store = Arc::new(MemoryHistoryStore::new(config.history_capacity));
        let names = Arc::new(SequentialNameGenerator::new(TEST_NAMES));
        let state = create_gateway_state(config, store, names).await;
        let app = create_app(state);

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            serve(listener, app).await.ok();
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            _handle: handle,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the WebSocket endpoint URL
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Registered sessions as reported by `/health`
    pub async fn sessions(&self) -> Result<u64> {
        let body: serde_json::Value = self.get("/health").await?.json().await?;
        body["sessions"]
            .as_u64()
            .context("health response without a session count")
    }

    /// Poll `/health` until exactly `expected` sessions are registered
    pub async fn wait_for_sessions(&self, expected: u64) -> Result<()> {
        for _ in 0..100 {
            if self.sessions().await? == expected {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        bail!("never reached {expected} sessions")
    }

    /// Open a connection without reading anything from it
    pub async fn connect(&self) -> Result<TestClient> {
        let (ws, _) = connect_async(self.ws_url()).await?;
        Ok(TestClient {
            ws,
            lines: VecDeque::new(),
        })
    }

    /// Connect to an empty history and wait for this connection's own
    /// Online notice
    ///
    /// Returns the client together with the name it was given.
    pub async fn join(&self) -> Result<(TestClient, String)> {
        let mut client = self.connect().await?;

        let line = client.next_line().await?;
        let Some(name) = line
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix("] is online"))
        else {
            bail!("expected own online notice, got {line:?}");
        };
        let name = name.to_string();
        Ok((client, name))
    }
}

/// A connected WebSocket client
pub struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    lines: VecDeque<String>,
}

impl TestClient {
    /// Send one text message
    pub async fn say(&mut self, text: &str) -> Result<()> {
        self.ws.send(Message::Text(text.to_string())).await?;
        Ok(())
    }

    /// Next line from the server, splitting coalesced frames
    pub async fn next_line(&mut self) -> Result<String> {
        loop {
            if let Some(line) = self.lines.pop_front() {
                return Ok(line);
            }

            let frame = tokio::time::timeout(RECV_TIMEOUT, self.ws.next())
                .await
                .context("timed out waiting for a message")?;

            match frame {
                Some(Ok(Message::Text(text))) => {
                    self.lines.extend(text.split('\n').map(str::to_string));
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                Some(Ok(other)) => bail!("unexpected frame: {other:?}"),
                Some(Err(e)) => bail!("connection failed: {e}"),
                None => bail!("connection closed"),
            }
        }
    }

    /// Read until the server closes the connection, returning the lines seen
    pub async fn closed(&mut self) -> Result<Vec<String>> {
        let mut seen: Vec<String> = self.lines.drain(..).collect();

        loop {
            let frame = tokio::time::timeout(RECV_TIMEOUT, self.ws.next())
                .await
                .context("timed out waiting for close")?;

            match frame {
                Some(Ok(Message::Text(text))) => {
                    seen.extend(text.split('\n').map(str::to_string));
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return Ok(seen),
                Some(Ok(_)) => {}
            }
        }
    }

    /// Close the connection from the client side
    pub async fn close(mut self) -> Result<()> {
        self.ws.close(None).await?;
        Ok(())
    }
}

/// Hub tunables for tests: production defaults with a roomy read window
pub fn test_hub_config() -> HubConfig {
    HubConfig {
        pong_wait_ms: 30_000,
        ping_period_ms: 27_000,
        ..HubConfig::default()
    }
}

/// Whether `line` is `body` stamped by `sender`
pub fn is_stamped(line: &str, sender: &str, body: &str) -> bool {
    line.starts_with(&format!("[{sender}][")) && line.ends_with(&format!("] {body}"))
}
