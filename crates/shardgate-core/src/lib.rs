//! # shardgate-core
//!
//! Domain layer containing the session, shard, and intent types shared by the gateway
//! client and its callers. This crate has no dependencies on networking or runtime crates.

pub mod entities;
pub mod error;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{GatewayInfo, GatewayUser, Session, SessionStartLimit, Token};
pub use error::DomainError;
pub use value_objects::{Intents, IntentsParseError, ShardConfig};
