//! Gateway frame fixtures
//!
//! Server-to-client frames as JSON, the way the gateway sends them.

use serde_json::{json, Value};

pub const OP_DISPATCH: u64 = 0;
pub const OP_HEARTBEAT: u64 = 1;
pub const OP_IDENTIFY: u64 = 2;
pub const OP_RESUME: u64 = 6;

/// Hello with the heartbeat interval in milliseconds
pub fn hello(heartbeat_interval: u64) -> Value {
    json!({"op": 10, "d": {"heartbeat_interval": heartbeat_interval}})
}

/// READY dispatch for `session_id` on shard `[shard_id, shard_count]`
pub fn ready(seq: u64, session_id: &str, shard_id: u32, shard_count: u32) -> Value {
    json!({
        "op": 0,
        "s": seq,
        "t": "READY",
        "d": {
            "version": 1,
            "session_id": session_id,
            "user": {"id": "10001", "username": "shardgate-bot", "bot": true},
            "shard": [shard_id, shard_count]
        }
    })
}

/// RESUMED dispatch
pub fn resumed(seq: u64) -> Value {
    dispatch(seq, "RESUMED", &json!(""))
}

/// Any dispatch event
pub fn dispatch(seq: u64, event_type: &str, data: &Value) -> Value {
    json!({"op": 0, "s": seq, "t": event_type, "d": data})
}

/// AT_MESSAGE_CREATE mentioning the bot
pub fn at_message(seq: u64, content: &str) -> Value {
    dispatch(
        seq,
        "AT_MESSAGE_CREATE",
        &json!({
            "id": format!("msg-{seq}"),
            "channel_id": "channel-1",
            "guild_id": "guild-1",
            "content": format!("<@!10001> {content}"),
            "timestamp": "2024-05-01T12:00:00+08:00",
            "author": {"id": "20002", "username": "alice", "bot": false},
            "mentions": [{"id": "10001", "username": "shardgate-bot", "bot": true}]
        }),
    )
}

pub fn reconnect() -> Value {
    json!({"op": 7})
}

pub fn invalid_session() -> Value {
    json!({"op": 9, "d": false})
}

pub fn heartbeat_ack() -> Value {
    json!({"op": 11})
}
