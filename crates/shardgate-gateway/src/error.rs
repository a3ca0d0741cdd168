//! Orchestrator errors

use shardgate_common::AppError;
use shardgate_core::{DomainError, ShardConfig};
use thiserror::Error;

use crate::connection::DisconnectCause;

/// Why [`crate::session::SessionManager::start`] stopped
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Cannot start sessions: {0}")]
    InvalidStart(#[from] DomainError),

    #[error("Shard {shard} terminated fatally: {cause}")]
    Fatal {
        shard: ShardConfig,
        cause: DisconnectCause,
    },
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::InvalidStart(e) => Self::Domain(e),
            fatal @ GatewayError::Fatal { .. } => Self::GatewayFatal(fatal.to_string()),
        }
    }
}
