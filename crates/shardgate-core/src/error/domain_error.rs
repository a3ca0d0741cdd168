//! Domain errors - error types for the domain layer

use thiserror::Error;

/// Domain layer errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    // =========================================================================
    // Shard Errors
    // =========================================================================
    #[error("Invalid shard: shard_id {shard_id} is not below shard_count {shard_count}")]
    InvalidShard { shard_id: u32, shard_count: u32 },

    #[error("Shard count must be at least 1")]
    ZeroShardCount,

    // =========================================================================
    // Bootstrap Errors
    // =========================================================================
    #[error("Gateway URL is empty")]
    MissingGatewayUrl,

    #[error("Token is missing its access token")]
    MissingAccessToken,

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl DomainError {
    /// Get an error code string for logs
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidShard { .. } => "INVALID_SHARD",
            Self::ZeroShardCount => "ZERO_SHARD_COUNT",
            Self::MissingGatewayUrl => "MISSING_GATEWAY_URL",
            Self::MissingAccessToken => "MISSING_ACCESS_TOKEN",
            Self::ValidationError(_) => "VALIDATION_ERROR",
        }
    }

    /// Check if this error came from shard configuration
    pub fn is_shard_error(&self) -> bool {
        matches!(self, Self::InvalidShard { .. } | Self::ZeroShardCount)
    }
}
