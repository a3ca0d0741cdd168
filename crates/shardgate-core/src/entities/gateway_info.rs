//! Gateway bootstrap information
//!
//! Returned by the HTTP gateway endpoint before any connection is opened.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Connection-start quota reported by the gateway endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStartLimit {
    /// Session starts allowed in the current window
    pub total: u32,
    /// Session starts left in the current window
    pub remaining: u32,
    /// Milliseconds until the window resets
    pub reset_after: u32,
    /// Sessions that may be started per concurrency window
    pub max_concurrency: u32,
}

/// Resolved gateway connection parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayInfo {
    /// WebSocket URL to connect to
    pub url: String,
    /// Recommended shard count
    #[serde(rename = "shards")]
    pub shard_count: u32,
    #[serde(default)]
    pub session_start_limit: SessionStartLimit,
}

impl GatewayInfo {
    /// Create gateway info allowing one session start per concurrency window
    pub fn new(url: impl Into<String>, shard_count: u32) -> Self {
        Self {
            url: url.into(),
            shard_count,
            session_start_limit: SessionStartLimit {
                total: 1000,
                remaining: 1000,
                reset_after: 0,
                max_concurrency: 1,
            },
        }
    }

    /// Use a caller-chosen shard count instead of the recommended one
    #[must_use]
    pub fn with_shard_count(mut self, shard_count: u32) -> Self {
        self.shard_count = shard_count;
        self
    }

    /// Check the parameters can start at least one session
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.url.trim().is_empty() {
            return Err(DomainError::MissingGatewayUrl);
        }
        if self.shard_count == 0 {
            return Err(DomainError::ZeroShardCount);
        }
        Ok(())
    }
}
