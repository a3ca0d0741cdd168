//! Value objects - immutable types that represent domain concepts

mod intents;
mod shard;

pub use intents::{Intents, IntentsParseError};
pub use shard::ShardConfig;
