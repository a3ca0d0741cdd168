//! Frame codec errors

use shardgate_core::DomainError;
use thiserror::Error;

use super::OpCode;

/// Errors raised while encoding or decoding gateway frames
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Failed to decode frame: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Failed to encode frame: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Frame {op} carries no data")]
    MissingData { op: OpCode },

    #[error("Failed to decode {op} data: {source}")]
    InvalidData {
        op: OpCode,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed READY: {0}")]
    InvalidReady(#[from] DomainError),

    #[error("Hello carried a zero heartbeat interval")]
    ZeroHeartbeat,
}
