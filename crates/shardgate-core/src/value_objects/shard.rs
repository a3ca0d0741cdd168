//! Shard configuration
//!
//! A shard is one partition of the event stream, identified by `(shard_id, shard_count)`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Shard assignment of a single connection
///
/// `shard_id` starts at 0 and is always below `shard_count`, which is at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShardConfig {
    pub shard_id: u32,
    pub shard_count: u32,
}

impl ShardConfig {
    /// Create a validated shard configuration
    pub fn new(shard_id: u32, shard_count: u32) -> Result<Self, DomainError> {
        if shard_count == 0 {
            return Err(DomainError::ZeroShardCount);
        }
        if shard_id >= shard_count {
            return Err(DomainError::InvalidShard {
                shard_id,
                shard_count,
            });
        }
        Ok(Self {
            shard_id,
            shard_count,
        })
    }

    /// Build from the `[shard_id, shard_count]` pair used on the wire
    pub fn from_pair(pair: &[u32]) -> Result<Self, DomainError> {
        match pair {
            [shard_id, shard_count] => Self::new(*shard_id, *shard_count),
            _ => Err(DomainError::ValidationError(format!(
                "shard pair must have two elements, got {}",
                pair.len()
            ))),
        }
    }

    /// The `[shard_id, shard_count]` pair used on the wire
    #[must_use]
    pub const fn as_pair(self) -> [u32; 2] {
        [self.shard_id, self.shard_count]
    }

    /// All shards of a `shard_count`-way split, in order
    pub fn all(shard_count: u32) -> Result<Vec<Self>, DomainError> {
        if shard_count == 0 {
            return Err(DomainError::ZeroShardCount);
        }
        Ok((0..shard_count)
            .map(|shard_id| Self {
                shard_id,
                shard_count,
            })
            .collect())
    }
}

impl fmt::Display for ShardConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.shard_id, self.shard_count)
    }
}
