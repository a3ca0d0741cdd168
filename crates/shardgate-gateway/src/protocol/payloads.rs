//! Control payload definitions
//!
//! Payloads of the handshake and connection-control frames.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use shardgate_core::{DomainError, GatewayUser, Intents, Session, ShardConfig};

/// Payload for op 10 (Hello)
///
/// Sent by the server immediately after connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloPayload {
    /// Heartbeat interval in milliseconds
    pub heartbeat_interval: u64,
}

impl HelloPayload {
    /// Heartbeat interval as a duration
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval)
    }
}

/// Payload for op 2 (Identify)
///
/// Sent by the client to authenticate a new session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyPayload {
    /// Authorization string (`{type} {app_id}.{token}`)
    pub token: String,

    /// Requested event subscriptions
    pub intents: Intents,

    /// `[shard_id, shard_count]`
    pub shard: [u32; 2],

    /// Client connection properties
    #[serde(default)]
    pub properties: IdentifyProperties,
}

impl IdentifyPayload {
    /// Build the Identify payload for a session
    ///
    /// An empty intent set is replaced by `GUILDS`; the gateway rejects zero.
    pub fn for_session(session: &Session, properties: IdentifyProperties) -> Self {
        Self {
            token: session.token.authorization(),
            intents: session.intents.or_default(),
            shard: session.shard.as_pair(),
            properties,
        }
    }
}

/// Client connection properties
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifyProperties {
    /// Operating system
    #[serde(rename = "$os", skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,

    /// Browser or client name
    #[serde(rename = "$browser", skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,

    /// Device type
    #[serde(rename = "$device", skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

impl IdentifyProperties {
    /// Create empty properties
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Properties describing this host and client
    #[must_use]
    pub fn for_host(client: &str) -> Self {
        Self::new()
            .with_os(std::env::consts::OS)
            .with_browser(client)
            .with_device(client)
    }

    /// Set operating system
    #[must_use]
    pub fn with_os(mut self, os: impl Into<String>) -> Self {
        self.os = Some(os.into());
        self
    }

    /// Set browser
    #[must_use]
    pub fn with_browser(mut self, browser: impl Into<String>) -> Self {
        self.browser = Some(browser.into());
        self
    }

    /// Set device type
    #[must_use]
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }
}

/// Payload for op 6 (Resume)
///
/// Sent by the client to resume a disconnected session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumePayload {
    /// Authorization string
    pub token: String,

    /// Session ID to resume
    pub session_id: String,

    /// Last received sequence number
    pub seq: u64,
}

impl ResumePayload {
    /// Build the Resume payload for a session
    pub fn for_session(session: &Session) -> Self {
        Self {
            token: session.token.authorization(),
            session_id: session.id.clone(),
            seq: session.last_sequence,
        }
    }
}

/// READY dispatch payload
///
/// Sent after a successful Identify.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyPayload {
    /// Gateway protocol version
    #[serde(default)]
    pub version: u32,

    /// Session ID for resuming
    pub session_id: String,

    /// The authenticated bot user
    #[serde(default)]
    pub user: GatewayUser,

    /// `[shard_id, shard_count]`
    #[serde(default)]
    pub shard: Vec<u32>,
}

impl ReadyPayload {
    /// The shard assignment confirmed by the server
    pub fn shard_config(&self) -> Result<ShardConfig, DomainError> {
        ShardConfig::from_pair(&self.shard)
    }
}
