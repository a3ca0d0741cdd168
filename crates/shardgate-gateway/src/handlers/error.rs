//! Handler error types

use thiserror::Error;

use crate::protocol::ProtocolError;

/// Error returned by an event handler
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Event data could not be decoded into the handler's payload type
    #[error("Failed to decode event data: {0}")]
    Decode(#[from] ProtocolError),

    /// The business callback reported a failure
    #[error("Handler failed: {0}")]
    Failed(String),

    /// Outbound API call failed
    #[error("API call failed: {0}")]
    Api(#[from] crate::api::ApiError),
}

impl HandlerError {
    /// Create a failure from any displayable error
    pub fn failed(err: impl std::fmt::Display) -> Self {
        Self::Failed(err.to_string())
    }
}

/// Handler result type
pub type HandlerResult<T> = Result<T, HandlerError>;
