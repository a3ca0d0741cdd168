//! Test helpers for integration tests
//!
//! [`MockGateway`] accepts WebSocket connections on a loopback port and hands each
//! one to the test as a [`MockConnection`] that the test scripts frame by frame.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use shardgate_core::{GatewayInfo, Intents, Token};
use shardgate_gateway::connection::ConnectionConfig;
use shardgate_gateway::handlers::EventDispatcher;
use shardgate_gateway::session::SessionManager;
use shardgate_gateway::GatewayError;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tokio_util::sync::CancellationToken;

/// How long a test waits for any single step
pub const STEP_TIMEOUT: Duration = Duration::from_secs(10);

/// In-process gateway server
pub struct MockGateway {
    pub addr: SocketAddr,
    connections: mpsc::UnboundedReceiver<MockConnection>,
    _handle: JoinHandle<()>,
}

impl MockGateway {
    /// Bind to a free loopback port and start accepting
    pub async fn start() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (tx, connections) = mpsc::unbounded_channel();

        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
                    continue;
                };
                if tx.send(MockConnection { ws }).is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            addr,
            connections,
            _handle: handle,
        })
    }

    /// WebSocket URL clients should connect to
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Gateway info pointing at this server
    pub fn info(&self, shards: u32) -> GatewayInfo {
        GatewayInfo::new(self.url(), shards)
    }

    /// Wait for the next client connection
    pub async fn accept(&mut self) -> Result<MockConnection> {
        tokio::time::timeout(STEP_TIMEOUT, self.connections.recv())
            .await
            .context("timed out waiting for a connection")?
            .ok_or_else(|| anyhow!("mock gateway stopped"))
    }
}

/// One accepted client connection, seen from the server side
pub struct MockConnection {
    ws: WebSocketStream<TcpStream>,
}

impl MockConnection {
    /// Send a JSON frame
    pub async fn send(&mut self, frame: &Value) -> Result<()> {
        self.ws.send(Message::Text(frame.to_string())).await?;
        Ok(())
    }

    /// Receive the next JSON frame from the client
    pub async fn recv(&mut self) -> Result<Value> {
        loop {
            let message = tokio::time::timeout(STEP_TIMEOUT, self.ws.next())
                .await
                .context("timed out waiting for a frame")?
                .ok_or_else(|| anyhow!("client disconnected"))??;
            match message {
                Message::Text(text) => return Ok(serde_json::from_str(&text)?),
                Message::Close(frame) => bail!("client closed the connection: {frame:?}"),
                _ => {}
            }
        }
    }

    /// Receive frames until one with `op`, skipping heartbeats and anything else
    pub async fn recv_op(&mut self, op: u64) -> Result<Value> {
        loop {
            let frame = self.recv().await?;
            if frame["op"].as_u64() == Some(op) {
                return Ok(frame);
            }
        }
    }

    /// Wait for the client to close; returns the close code it sent, if any
    pub async fn closed(&mut self) -> Result<Option<u16>> {
        loop {
            let next = tokio::time::timeout(STEP_TIMEOUT, self.ws.next())
                .await
                .context("timed out waiting for the client to close")?;
            match next {
                Some(Ok(Message::Close(frame))) => return Ok(frame.map(|f| u16::from(f.code))),
                Some(Ok(_)) => {}
                Some(Err(_)) | None => return Ok(None),
            }
        }
    }

    /// Drop the TCP stream without a close handshake
    pub fn drop_transport(self) {
        drop(self.ws);
    }

    /// Close the connection with `code`
    pub async fn close(&mut self, code: u16, reason: &str) -> Result<()> {
        self.ws
            .close(Some(CloseFrame {
                code: CloseCode::from(code),
                reason: reason.to_string().into(),
            }))
            .await?;
        Ok(())
    }
}

/// A session manager running in the background
pub struct RunningManager {
    pub cancel: CancellationToken,
    pub manager: Arc<SessionManager>,
    handle: JoinHandle<Result<(), GatewayError>>,
}

impl RunningManager {
    /// Start every shard in `info` with a one second launch interval
    pub fn start(dispatcher: EventDispatcher, info: GatewayInfo) -> Self {
        let cancel = CancellationToken::new();
        let manager = Arc::new(
            SessionManager::new(Arc::new(dispatcher), ConnectionConfig::default())
                .with_concurrency_window(Duration::from_secs(1))
                .with_cancellation(cancel.clone()),
        );

        let running = Arc::clone(&manager);
        let handle = tokio::spawn(async move {
            running
                .start(&info, test_token(), Intents::GUILDS)
                .await
        });

        Self {
            cancel,
            manager,
            handle,
        }
    }

    /// Wait for `start` to return on its own
    pub async fn finished(self) -> Result<Result<(), GatewayError>> {
        Ok(tokio::time::timeout(STEP_TIMEOUT, self.handle)
            .await
            .context("session manager did not stop")??)
    }

    /// Cancel and wait for `start` to return
    pub async fn shutdown(self) -> Result<Result<(), GatewayError>> {
        self.cancel.cancel();
        self.finished().await
    }
}

/// Credential used by every test
pub fn test_token() -> Token {
    Token::bot(1024, "secret")
}
