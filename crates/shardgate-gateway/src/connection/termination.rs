//! Termination classes
//!
//! Every way a shard connection can end is reduced to a [`Disconnect`]: a
//! [`Termination`] class deciding what happens to the session, and the cause for logs.

use std::fmt;

use shardgate_core::Session;
use thiserror::Error;

/// What happens to a session after its connection ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    /// Requeue the session unchanged; the next attempt resumes if it has an id
    Resumable,
    /// Requeue the session with its id and sequence cleared
    MustReidentify,
    /// The credential can never reconnect; stop everything
    Fatal,
    /// Local shutdown; do not requeue
    Shutdown,
}

impl Termination {
    /// Get the name of this class for logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Resumable => "resumable",
            Self::MustReidentify => "must_reidentify",
            Self::Fatal => "fatal",
            Self::Shutdown => "shutdown",
        }
    }

    /// Check if the session goes back onto the queue
    #[must_use]
    pub const fn requeues(self) -> bool {
        matches!(self, Self::Resumable | Self::MustReidentify)
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a connection ended
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisconnectCause {
    #[error("connect failed: {0}")]
    ConnectFailed(String),

    #[error("handshake send failed: {0}")]
    HandshakeFailed(String),

    #[error("heartbeat send failed: {0}")]
    HeartbeatFailed(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("closed by server (code {code:?}): {reason}")]
    Closed { code: Option<u16>, reason: String },

    #[error("stream ended")]
    StreamEnded,

    #[error("server requested reconnect")]
    ServerReconnect,

    #[error("server declared the session invalid")]
    InvalidSession,

    #[error("protocol fault: {0}")]
    ProtocolFault(String),

    #[error("panicked: {0}")]
    Panicked(String),

    #[error("resume requested")]
    ResumeRequested,

    #[error("cancelled")]
    Cancelled,
}

/// Classified end of a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disconnect {
    pub termination: Termination,
    pub cause: DisconnectCause,
}

impl Disconnect {
    #[must_use]
    pub fn new(termination: Termination, cause: DisconnectCause) -> Self {
        Self { termination, cause }
    }

    /// A transport-level failure; the identity is still valid
    #[must_use]
    pub fn resumable(cause: DisconnectCause) -> Self {
        Self::new(Termination::Resumable, cause)
    }

    /// Local cancellation
    #[must_use]
    pub fn shutdown() -> Self {
        Self::new(Termination::Shutdown, DisconnectCause::Cancelled)
    }

    /// Settle the session according to the termination class
    ///
    /// Returns the session to requeue, or `None` when it must not be retried.
    #[must_use]
    pub fn settle(&self, mut session: Session) -> Option<Session> {
        match self.termination {
            Termination::Resumable => Some(session),
            Termination::MustReidentify => {
                session.discard_identity();
                Some(session)
            }
            Termination::Fatal | Termination::Shutdown => None,
        }
    }
}

impl fmt::Display for Disconnect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.termination, self.cause)
    }
}
