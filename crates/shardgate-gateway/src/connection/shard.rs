//! Per-shard gateway connection
//!
//! One connection attempt for one session: open the transport, send Identify or
//! Resume, then listen until something ends it. While listening three activities
//! cooperate:
//!
//! - the reader decodes frames into a bounded queue and blocks when it is full,
//! - the processor drains the queue, applies built-in handling, and dispatches,
//! - the supervisor (the task running [`ShardConnection::run`]) owns the sink and the
//!   heartbeat timer and waits for a termination signal.
//!
//! The connection never retries by itself. It returns a classified [`Disconnect`] and
//! the caller decides what happens to the session.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use parking_lot::{Mutex, RwLock};
use shardgate_common::{panic_message, GatewayConfig};
use shardgate_core::{Session, ShardConfig};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::guard::supervised;
use super::{Disconnect, DisconnectCause, HeartbeatTimer};
use crate::handlers::{handle_frame, EventDispatcher, FrameAction};
use crate::protocol::{
    CloseCode, CloseCodePolicy, GatewayPayload, IdentifyPayload, IdentifyProperties, ProtocolError,
    ReadyPayload, ResumePayload,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

/// Client name reported in Identify properties
pub const CLIENT_NAME: &str = "shardgate";

/// Capacity of the processor-to-supervisor signal queue
const CONTROL_QUEUE_CAPACITY: usize = 10;

/// How long to wait for the close handshake before dropping the transport
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection tuning shared by every shard
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Frames buffered between reader and processor
    pub frame_queue_capacity: usize,
    /// Heartbeat period used until Hello arrives
    pub default_heartbeat: Duration,
    pub connect_timeout: Duration,
    pub close_policy: CloseCodePolicy,
    pub properties: IdentifyProperties,
}

impl ConnectionConfig {
    /// Build from gateway configuration
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            frame_queue_capacity: config.frame_queue_capacity,
            default_heartbeat: config.default_heartbeat(),
            close_policy: CloseCodePolicy::from_config(config),
            ..Self::default()
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            frame_queue_capacity: 2000,
            default_heartbeat: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            close_policy: CloseCodePolicy::default(),
            properties: IdentifyProperties::for_host(CLIENT_NAME),
        }
    }
}

/// Reader to processor
#[derive(Debug)]
enum Inbound {
    Frame(GatewayPayload),
    /// The transport ended; always the last item
    Closed(Disconnect),
}

/// Processor to supervisor
#[derive(Debug)]
enum ControlSignal {
    ResetHeartbeat(Duration),
    Terminate(Disconnect),
}

/// One connection attempt of one shard
pub struct ShardConnection {
    /// Written only by the processor while listening
    session: Arc<Mutex<Session>>,
    ready: Arc<RwLock<Option<ReadyPayload>>>,
    config: Arc<ConnectionConfig>,
    dispatcher: Arc<EventDispatcher>,
}

impl ShardConnection {
    /// Take ownership of `session` for one attempt
    pub fn new(
        session: Session,
        config: Arc<ConnectionConfig>,
        dispatcher: Arc<EventDispatcher>,
    ) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            ready: Arc::new(RwLock::new(None)),
            config,
            dispatcher,
        }
    }

    /// Snapshot of the session in its current state
    pub fn session(&self) -> Session {
        self.session.lock().clone()
    }

    pub fn shard(&self) -> ShardConfig {
        self.session.lock().shard
    }

    /// READY received on this connection, if any
    pub fn ready(&self) -> Option<ReadyPayload> {
        self.ready.read().clone()
    }

    /// Give the session back
    pub fn into_session(self) -> Session {
        self.session()
    }

    /// Run the connection until it ends
    ///
    /// `resume` fires when an operator asks every connection to reconnect and resume.
    pub async fn run(
        &self,
        cancel: CancellationToken,
        resume: watch::Receiver<u64>,
    ) -> Disconnect {
        let span = tracing::info_span!("shard", shard = %self.shard());
        self.run_inner(cancel, resume).instrument(span).await
    }

    async fn run_inner(
        &self,
        cancel: CancellationToken,
        mut resume: watch::Receiver<u64>,
    ) -> Disconnect {
        let url = self.session.lock().url.clone();
        tracing::debug!(url = %url, "Connecting");

        let connect = tokio::time::timeout(
            self.config.connect_timeout,
            tokio_tungstenite::connect_async(url.as_str()),
        );
        let ws = tokio::select! {
            () = cancel.cancelled() => return Disconnect::shutdown(),
            result = connect => match result {
                Ok(Ok((ws, _response))) => ws,
                Ok(Err(e)) => {
                    return Disconnect::resumable(DisconnectCause::ConnectFailed(e.to_string()));
                }
                Err(_) => {
                    return Disconnect::resumable(DisconnectCause::ConnectFailed(
                        "timed out".to_string(),
                    ));
                }
            },
        };
        let (mut sink, stream) = ws.split();

        let session = self.session();
        if let Err(cause) = send_handshake(&mut sink, &session, &self.config.properties).await {
            close_sink(sink).await;
            return Disconnect::resumable(cause);
        }

        let (frame_tx, frame_rx) = mpsc::channel(self.config.frame_queue_capacity);
        let (signal_tx, mut signal_rx) = mpsc::channel(CONTROL_QUEUE_CAPACITY);

        let mut tasks = JoinSet::new();
        tasks.spawn(read_frames(stream, frame_tx, self.config.close_policy.clone()).in_current_span());
        tasks.spawn(
            process_frames(
                frame_rx,
                Arc::clone(&self.session),
                Arc::clone(&self.ready),
                Arc::clone(&self.dispatcher),
                signal_tx,
            )
            .in_current_span(),
        );

        let mut heartbeat = HeartbeatTimer::new(self.config.default_heartbeat);
        let mut resume_open = true;

        let disconnect = loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => break Disconnect::shutdown(),

                changed = resume.changed(), if resume_open => {
                    if changed.is_ok() {
                        break Disconnect::resumable(DisconnectCause::ResumeRequested);
                    }
                    resume_open = false;
                }

                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            let message = panic_message(&*e.into_panic());
                            break Disconnect::resumable(DisconnectCause::Panicked(message));
                        }
                    }
                }

                signal = signal_rx.recv() => match signal {
                    Some(ControlSignal::ResetHeartbeat(period)) => {
                        tracing::debug!(period_ms = period.as_millis(), "Heartbeat interval set by Hello");
                        heartbeat.reset(period);
                    }
                    Some(ControlSignal::Terminate(disconnect)) => break disconnect,
                    None => break Disconnect::resumable(DisconnectCause::StreamEnded),
                },

                _ = heartbeat.tick() => {
                    let seq = self.session.lock().last_sequence;
                    if let Err(cause) = send_heartbeat(&mut sink, seq).await {
                        break Disconnect::resumable(cause);
                    }
                    tracing::trace!(seq, "Heartbeat sent");
                }
            }
        };

        heartbeat.stop();
        tasks.abort_all();
        close_sink(sink).await;

        tracing::debug!(termination = %disconnect.termination, cause = %disconnect.cause, "Connection closed");
        disconnect
    }
}

impl std::fmt::Debug for ShardConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardConnection")
            .field("session", &self.session.lock().to_string())
            .field("ready", &self.ready.read().is_some())
            .finish()
    }
}

/// Identify when the session has no id, Resume otherwise
pub fn handshake_frame(
    session: &Session,
    properties: &IdentifyProperties,
) -> Result<GatewayPayload, ProtocolError> {
    if session.can_resume() {
        GatewayPayload::resume(&ResumePayload::for_session(session))
    } else {
        GatewayPayload::identify(&IdentifyPayload::for_session(session, properties.clone()))
    }
}

async fn send_handshake<S>(
    sink: &mut S,
    session: &Session,
    properties: &IdentifyProperties,
) -> Result<(), DisconnectCause>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let frame = handshake_frame(session, properties)
        .map_err(|e| DisconnectCause::HandshakeFailed(e.to_string()))?;
    tracing::info!(op = %frame.op, session = %session, "Sending handshake");
    send_frame(sink, &frame)
        .await
        .map_err(DisconnectCause::HandshakeFailed)
}

async fn send_heartbeat<S>(sink: &mut S, seq: u64) -> Result<(), DisconnectCause>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let frame =
        GatewayPayload::heartbeat(seq).map_err(|e| DisconnectCause::HeartbeatFailed(e.to_string()))?;
    send_frame(sink, &frame)
        .await
        .map_err(DisconnectCause::HeartbeatFailed)
}

async fn send_frame<S>(sink: &mut S, frame: &GatewayPayload) -> Result<(), String>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let text = frame.encode().map_err(|e| e.to_string())?;
    sink.send(Message::Text(text)).await.map_err(|e| e.to_string())
}

async fn close_sink(mut sink: WsSink) {
    match tokio::time::timeout(CLOSE_TIMEOUT, sink.close()).await {
        Ok(Ok(())) => tracing::trace!("Transport closed"),
        Ok(Err(e)) => tracing::trace!(error = %e, "Transport already closed"),
        Err(_) => tracing::debug!("Timed out closing transport"),
    }
}

/// Decode frames off the transport into the bounded queue
///
/// Blocks on a full queue. Always finishes with an [`Inbound::Closed`] unless the
/// processor is gone.
async fn read_frames<S>(mut stream: S, frames: mpsc::Sender<Inbound>, policy: CloseCodePolicy)
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    let disconnect = loop {
        let text = match stream.next().await {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping non-UTF-8 binary frame");
                    continue;
                }
            },
            Some(Ok(Message::Close(frame))) => {
                let code = frame.as_ref().map(|f| u16::from(f.code));
                let reason = frame.map(|f| f.reason.into_owned()).unwrap_or_default();
                tracing::debug!(
                    code,
                    name = CloseCode::label(code),
                    reason = %reason,
                    "Server closed the connection"
                );
                break Disconnect::new(
                    policy.classify(code),
                    DisconnectCause::Closed { code, reason },
                );
            }
            Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
            Some(Err(e)) => break Disconnect::resumable(DisconnectCause::Transport(e.to_string())),
            None => break Disconnect::resumable(DisconnectCause::StreamEnded),
        };

        match GatewayPayload::decode(text) {
            Ok(frame) => {
                tracing::trace!(op = %frame.op, event_type = frame.event_type(), seq = ?frame.s, "Frame received");
                if frames.send(Inbound::Frame(frame)).await.is_err() {
                    return;
                }
            }
            Err(e) => tracing::warn!(error = %e, "Skipping undecodable frame"),
        }
    };

    let _ = frames.send(Inbound::Closed(disconnect)).await;
}

/// Drain the frame queue in arrival order
async fn process_frames(
    mut frames: mpsc::Receiver<Inbound>,
    session: Arc<Mutex<Session>>,
    ready_slot: Arc<RwLock<Option<ReadyPayload>>>,
    dispatcher: Arc<EventDispatcher>,
    signals: mpsc::Sender<ControlSignal>,
) {
    while let Some(inbound) = frames.recv().await {
        let frame = match inbound {
            Inbound::Frame(frame) => frame,
            Inbound::Closed(disconnect) => {
                let _ = signals.send(ControlSignal::Terminate(disconnect)).await;
                return;
            }
        };

        let action = handle_frame(&frame, &mut session.lock());
        match action {
            FrameAction::Forward => {
                let event_type = frame.event_type().to_string();
                match supervised(dispatcher.dispatch(Arc::new(frame))).await {
                    Ok(Ok(true)) => tracing::trace!(event_type = %event_type, "Event dispatched"),
                    Ok(Ok(false)) => tracing::trace!(event_type = %event_type, "No handler, event dropped"),
                    Ok(Err(e)) => {
                        tracing::warn!(event_type = %event_type, error = %e, "Event handler failed");
                    }
                    Err(panic) => {
                        tracing::error!(event_type = %event_type, panic = %panic, "Event handler panicked");
                        let disconnect = Disconnect::resumable(DisconnectCause::Panicked(panic));
                        let _ = signals.send(ControlSignal::Terminate(disconnect)).await;
                        return;
                    }
                }
            }
            FrameAction::Consumed => tracing::trace!(op = %frame.op, "Control frame handled"),
            FrameAction::ResetHeartbeat(period) => {
                if signals.send(ControlSignal::ResetHeartbeat(period)).await.is_err() {
                    return;
                }
            }
            FrameAction::Ready(ready) => {
                tracing::info!(
                    session_id = %ready.session_id,
                    user = %ready.user,
                    version = ready.version,
                    "Session ready"
                );
                *ready_slot.write() = Some(ready);
            }
            FrameAction::Terminate(disconnect) => {
                let _ = signals.send(ControlSignal::Terminate(disconnect)).await;
                return;
            }
        }
    }

    let _ = signals
        .send(ControlSignal::Terminate(Disconnect::resumable(DisconnectCause::StreamEnded)))
        .await;
}
