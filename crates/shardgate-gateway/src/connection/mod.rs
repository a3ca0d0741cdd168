//! Shard connections
//!
//! A [`ShardConnection`] runs one attempt for one session and reports how it ended
//! as a [`Disconnect`].

mod guard;
mod heartbeat;
mod shard;
mod termination;

pub use guard::supervised;
pub use heartbeat::HeartbeatTimer;
pub use shard::{handshake_frame, ConnectionConfig, ShardConnection, CLIENT_NAME};
pub use termination::{Disconnect, DisconnectCause, Termination};
