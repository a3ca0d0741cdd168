//! Integration test utilities for shardgate
//!
//! A scriptable in-process gateway plus frame fixtures, for driving real shard
//! connections end to end.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
