//! # shardgate-gateway
//!
//! Client for a sharded real-time push gateway. The [`session::SessionManager`] paces
//! shard connections under the server's start quota; each [`connection::ShardConnection`]
//! performs the identify/resume handshake, keeps the heartbeat, and hands application
//! events to the [`handlers::EventDispatcher`].

pub mod api;
pub mod app;
pub mod connection;
pub mod error;
pub mod events;
pub mod handlers;
pub mod protocol;
pub mod session;

pub use error::GatewayError;
