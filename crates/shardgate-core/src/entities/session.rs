//! Session entity - the resumable identity of one shard
//!
//! A session is created once per shard and handed from connection to connection.
//! An empty `id` means the shard has never authenticated (or its identity was discarded)
//! and the next handshake must be a fresh Identify; otherwise it must be a Resume.

use std::fmt;

use crate::error::DomainError;
use crate::value_objects::{Intents, ShardConfig};

/// Credentials used for the gateway handshake and the bootstrap HTTP API
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub app_id: u64,
    pub access_token: String,
    pub token_type: String,
}

impl Token {
    /// Default authorization scheme for bot credentials
    pub const BOT_TYPE: &'static str = "Bot";

    /// Create a bot token
    pub fn bot(app_id: u64, access_token: impl Into<String>) -> Self {
        Self {
            app_id,
            access_token: access_token.into(),
            token_type: Self::BOT_TYPE.to_string(),
        }
    }

    /// Override the authorization scheme
    #[must_use]
    pub fn with_type(mut self, token_type: impl Into<String>) -> Self {
        self.token_type = token_type.into();
        self
    }

    /// `{app_id}.{access_token}`
    pub fn credential(&self) -> String {
        format!("{}.{}", self.app_id, self.access_token)
    }

    /// `{token_type} {app_id}.{access_token}`, used both as the Authorization header
    /// and as the token field of Identify/Resume
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.credential())
    }

    /// Reject tokens that cannot possibly authenticate
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.access_token.trim().is_empty() {
            return Err(DomainError::MissingAccessToken);
        }
        Ok(())
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("app_id", &self.app_id)
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Per-shard session state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Session id assigned by READY; empty until the first successful Identify
    pub id: String,
    /// Gateway WebSocket URL
    pub url: String,
    pub token: Token,
    pub intents: Intents,
    /// Last sequence number received; the resume cursor
    pub last_sequence: u64,
    pub shard: ShardConfig,
}

impl Session {
    /// Create a session that has never authenticated
    pub fn new(url: impl Into<String>, token: Token, intents: Intents, shard: ShardConfig) -> Self {
        Self {
            id: String::new(),
            url: url.into(),
            token,
            intents,
            last_sequence: 0,
            shard,
        }
    }

    /// Whether the next handshake must be a Resume
    #[inline]
    pub fn can_resume(&self) -> bool {
        !self.id.is_empty()
    }

    /// Record the sequence number carried by an inbound frame
    ///
    /// The cursor only moves forward; `discard_identity` is the only reset.
    #[inline]
    pub fn record_sequence(&mut self, sequence: u64) {
        self.last_sequence = self.last_sequence.max(sequence);
    }

    /// Adopt the identity handed out by READY
    pub fn apply_ready(&mut self, session_id: impl Into<String>, shard: ShardConfig) {
        self.id = session_id.into();
        self.shard = shard;
    }

    /// Forget the identity so the next attempt re-identifies
    pub fn discard_identity(&mut self) {
        self.id.clear();
        self.last_sequence = 0;
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = if self.id.is_empty() { "-" } else { &self.id };
        write!(
            f,
            "[shard {} session {} seq {}]",
            self.shard, id, self.last_sequence
        )
    }
}
