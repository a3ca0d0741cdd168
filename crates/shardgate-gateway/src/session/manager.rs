//! Session orchestration
//!
//! [`SessionManager::start`] builds one session per shard and launches connections
//! for them from a single paced loop. A connection that ends and can be retried posts
//! its session back onto the queue and exits; the loop picks it up like any other
//! pending session. Nothing else schedules a launch.

use std::sync::Arc;
use std::time::Duration;

use shardgate_common::GatewayConfig;
use shardgate_core::{GatewayInfo, Intents, Session, ShardConfig, Token};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::pacing::{calc_interval, CONCURRENCY_WINDOW};
use crate::connection::{
    supervised, ConnectionConfig, Disconnect, DisconnectCause, ShardConnection, Termination,
};
use crate::error::GatewayError;
use crate::handlers::EventDispatcher;
use crate::protocol::CloseCode;

/// How long `start` waits for live connections to close on the way out
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

type FatalReport = (ShardConfig, DisconnectCause);

/// Asks every live connection to reconnect and resume
#[derive(Debug, Clone)]
pub struct ResumeTrigger {
    tx: Arc<watch::Sender<u64>>,
}

impl ResumeTrigger {
    pub fn trigger(&self) {
        self.tx.send_modify(|generation| *generation = generation.wrapping_add(1));
        tracing::info!(connections = self.tx.receiver_count(), "Resume requested");
    }
}

/// Paces shard connections under the server's start quota
pub struct SessionManager {
    dispatcher: Arc<EventDispatcher>,
    config: Arc<ConnectionConfig>,
    concurrency_window: Duration,
    cancel: CancellationToken,
    resume: Arc<watch::Sender<u64>>,
}

impl SessionManager {
    pub fn new(dispatcher: Arc<EventDispatcher>, config: ConnectionConfig) -> Self {
        let (resume, _) = watch::channel(0);
        Self {
            dispatcher,
            config: Arc::new(config),
            concurrency_window: CONCURRENCY_WINDOW,
            cancel: CancellationToken::new(),
            resume: Arc::new(resume),
        }
    }

    /// Build from gateway configuration
    pub fn from_config(dispatcher: Arc<EventDispatcher>, config: &GatewayConfig) -> Self {
        Self::new(dispatcher, ConnectionConfig::from_config(config))
            .with_concurrency_window(config.concurrency_window())
    }

    #[must_use]
    pub fn with_concurrency_window(mut self, window: Duration) -> Self {
        self.concurrency_window = window;
        self
    }

    /// Stop when `cancel` fires
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn resume_trigger(&self) -> ResumeTrigger {
        ResumeTrigger {
            tx: Arc::clone(&self.resume),
        }
    }

    /// Run every shard until cancelled or until one terminates fatally
    ///
    /// Returns `Ok(())` on cancellation and `Err(GatewayError::Fatal)` when a shard's
    /// credential can no longer connect. Either way every connection is closed before
    /// this returns.
    pub async fn start(
        &self,
        info: &GatewayInfo,
        token: Token,
        intents: Intents,
    ) -> Result<(), GatewayError> {
        let sessions = build_sessions(info, &token, intents)?;
        let interval = calc_interval(
            self.concurrency_window,
            info.session_start_limit.max_concurrency,
        );
        tracing::info!(
            shards = sessions.len(),
            intents = %intents,
            intent_names = ?intents.list(),
            interval_secs = interval.as_secs(),
            remaining = info.session_start_limit.remaining,
            "Starting sessions"
        );

        let (queue_tx, mut queue_rx) = mpsc::unbounded_channel::<Session>();
        let (fatal_tx, mut fatal_rx) = mpsc::unbounded_channel::<FatalReport>();
        for session in sessions {
            let _ = queue_tx.send(session);
        }

        let connections = self.cancel.child_token();
        let mut tasks = JoinSet::new();

        let result = loop {
            while tasks.try_join_next().is_some() {}

            let session = tokio::select! {
                biased;
                () = self.cancel.cancelled() => break Ok(()),
                Some((shard, cause)) = fatal_rx.recv() => break Err(GatewayError::Fatal { shard, cause }),
                Some(session) = queue_rx.recv() => session,
            };

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break Ok(()),
                Some((shard, cause)) = fatal_rx.recv() => break Err(GatewayError::Fatal { shard, cause }),
                () = tokio::time::sleep(interval) => {}
            }

            self.launch(
                &mut tasks,
                session,
                connections.clone(),
                queue_tx.clone(),
                fatal_tx.clone(),
            );
        };

        connections.cancel();
        let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            tracing::warn!(remaining = tasks.len(), "Connections did not close in time");
        }

        match &result {
            Ok(()) => tracing::info!("Sessions stopped"),
            Err(e) => tracing::error!(error = %e, "Sessions stopped"),
        }
        result
    }

    fn launch(
        &self,
        tasks: &mut JoinSet<()>,
        session: Session,
        cancel: CancellationToken,
        queue: mpsc::UnboundedSender<Session>,
        fatal: mpsc::UnboundedSender<FatalReport>,
    ) {
        tracing::info!(
            shard = %session.shard,
            session = %session,
            resume = session.can_resume(),
            "Launching connection"
        );
        let connection = ShardConnection::new(
            session,
            Arc::clone(&self.config),
            Arc::clone(&self.dispatcher),
        );
        let resume = self.resume.subscribe();

        tasks.spawn(async move {
            let disconnect = match supervised(connection.run(cancel, resume)).await {
                Ok(disconnect) => disconnect,
                Err(panic) => {
                    tracing::error!(shard = %connection.shard(), panic = %panic, "Connection panicked");
                    Disconnect::resumable(DisconnectCause::Panicked(panic))
                }
            };
            if let Some(ready) = connection.ready() {
                tracing::debug!(
                    shard = %connection.shard(),
                    user = %ready.user,
                    version = ready.version,
                    "Authenticated identity released"
                );
            }
            route(connection.into_session(), disconnect, &queue, &fatal);
        });
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("concurrency_window", &self.concurrency_window)
            .field("handlers", &self.dispatcher.len())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

/// One session per shard, in shard order, none resumable yet
pub fn build_sessions(
    info: &GatewayInfo,
    token: &Token,
    intents: Intents,
) -> Result<Vec<Session>, GatewayError> {
    info.validate()?;
    token.validate()?;

    Ok(ShardConfig::all(info.shard_count)?
        .into_iter()
        .map(|shard| Session::new(info.url.clone(), token.clone(), intents, shard))
        .collect())
}

/// Decide what happens to a session after its connection ended
fn route(
    session: Session,
    disconnect: Disconnect,
    queue: &mpsc::UnboundedSender<Session>,
    fatal: &mpsc::UnboundedSender<FatalReport>,
) {
    let Disconnect { termination, cause } = &disconnect;
    let close_code = match cause {
        DisconnectCause::Closed { code, .. } => *code,
        _ => None,
    };

    match termination {
        Termination::Shutdown => {
            tracing::info!(shard = %session.shard, "Connection shut down");
        }
        Termination::Fatal => {
            tracing::error!(
                shard = %session.shard,
                session_id = %session.id,
                close_code,
                close_name = CloseCode::label(close_code),
                classification = %termination,
                cause = %cause,
                "Connection terminated"
            );
            let _ = fatal.send((session.shard, cause.clone()));
        }
        Termination::Resumable | Termination::MustReidentify => {
            tracing::warn!(
                shard = %session.shard,
                session_id = %session.id,
                seq = session.last_sequence,
                close_code,
                close_name = CloseCode::label(close_code),
                classification = %termination,
                cause = %cause,
                "Connection terminated"
            );
            if let Some(next) = disconnect.settle(session) {
                if queue.send(next).is_err() {
                    tracing::debug!("Session queue closed, not requeueing");
                }
            }
        }
    }
}
