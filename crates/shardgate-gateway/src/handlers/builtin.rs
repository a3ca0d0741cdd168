//! Built-in frame handling
//!
//! Applied to every inbound frame before generic dispatch. Records the sequence number,
//! answers the control op codes, and consumes READY.

use std::time::Duration;

use shardgate_core::Session;

use crate::connection::{Disconnect, DisconnectCause, Termination};
use crate::events::EventType;
use crate::protocol::{GatewayPayload, HelloPayload, OpCode, ProtocolError, ReadyPayload};

/// What the connection should do with a frame after built-in handling
#[derive(Debug)]
pub enum FrameAction {
    /// Hand the frame to the event dispatcher
    Forward,
    /// Fully handled here
    Consumed,
    /// Switch the heartbeat to the server's interval
    ResetHeartbeat(Duration),
    /// READY was applied to the session
    Ready(ReadyPayload),
    /// End the connection
    Terminate(Disconnect),
}

/// Apply built-in handling to `frame`, updating `session` in place
pub fn handle_frame(frame: &GatewayPayload, session: &mut Session) -> FrameAction {
    if let Some(sequence) = frame.s {
        session.record_sequence(sequence);
    }

    match frame.op {
        OpCode::Hello => match hello_interval(frame) {
            Ok(period) => FrameAction::ResetHeartbeat(period),
            Err(e) => protocol_fault(&e),
        },
        OpCode::HeartbeatAck => FrameAction::Consumed,
        op if op.is_client_op() => {
            tracing::debug!(op = %op, "Ignoring client op sent by server");
            FrameAction::Consumed
        }
        OpCode::Reconnect => FrameAction::Terminate(Disconnect::resumable(
            DisconnectCause::ServerReconnect,
        )),
        OpCode::InvalidSession => FrameAction::Terminate(Disconnect::new(
            Termination::MustReidentify,
            DisconnectCause::InvalidSession,
        )),
        OpCode::Dispatch if frame.is_event(EventType::Ready.as_str()) => {
            match apply_ready(frame, session) {
                Ok(ready) => FrameAction::Ready(ready),
                Err(e) => protocol_fault(&e),
            }
        }
        _ => FrameAction::Forward,
    }
}

fn hello_interval(frame: &GatewayPayload) -> Result<Duration, ProtocolError> {
    let hello: HelloPayload = frame.data()?;
    if hello.heartbeat_interval == 0 {
        return Err(ProtocolError::ZeroHeartbeat);
    }
    Ok(hello.interval())
}

fn apply_ready(frame: &GatewayPayload, session: &mut Session) -> Result<ReadyPayload, ProtocolError> {
    let ready: ReadyPayload = frame.data()?;
    let shard = ready.shard_config()?;
    session.apply_ready(ready.session_id.clone(), shard);
    Ok(ready)
}

fn protocol_fault(err: &ProtocolError) -> FrameAction {
    FrameAction::Terminate(Disconnect::resumable(DisconnectCause::ProtocolFault(
        err.to_string(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shardgate_core::{Intents, ShardConfig, Token};

    fn session() -> Session {
        Session::new(
            "wss://gateway.example/ws",
            Token::bot(1, "secret"),
            Intents::GUILDS,
            ShardConfig::new(0, 8).unwrap(),
        )
    }

    fn frame(value: serde_json::Value) -> GatewayPayload {
        GatewayPayload::decode(value.to_string()).unwrap()
    }

    #[test]
    fn test_hello_resets_heartbeat() {
        let mut session = session();
        let action = handle_frame(
            &frame(json!({"op": 10, "d": {"heartbeat_interval": 30000}})),
            &mut session,
        );
        assert!(matches!(action, FrameAction::ResetHeartbeat(p) if p == Duration::from_secs(30)));
    }

    #[test]
    fn test_malformed_hello_is_protocol_fault() {
        let mut session = session();
        for bad in [
            json!({"op": 10}),
            json!({"op": 10, "d": {"heartbeat_interval": 0}}),
        ] {
            let action = handle_frame(&frame(bad), &mut session);
            assert!(matches!(
                action,
                FrameAction::Terminate(Disconnect {
                    termination: Termination::Resumable,
                    cause: DisconnectCause::ProtocolFault(_),
                })
            ));
        }
    }

    #[test]
    fn test_heartbeat_ack_consumed() {
        let mut session = session();
        let action = handle_frame(&frame(json!({"op": 11})), &mut session);
        assert!(matches!(action, FrameAction::Consumed));
    }

    #[test]
    fn test_client_op_from_server_consumed() {
        let mut session = session();
        let action = handle_frame(&frame(json!({"op": 1, "d": 3})), &mut session);
        assert!(matches!(action, FrameAction::Consumed));
    }

    #[test]
    fn test_reconnect_is_resumable() {
        let mut session = session();
        let action = handle_frame(&frame(json!({"op": 7})), &mut session);
        assert!(matches!(
            action,
            FrameAction::Terminate(Disconnect {
                termination: Termination::Resumable,
                cause: DisconnectCause::ServerReconnect,
            })
        ));
    }

    #[test]
    fn test_invalid_session_must_reidentify() {
        let mut session = session();
        let action = handle_frame(&frame(json!({"op": 9, "d": false})), &mut session);
        assert!(matches!(
            action,
            FrameAction::Terminate(Disconnect {
                termination: Termination::MustReidentify,
                ..
            })
        ));
    }

    #[test]
    fn test_ready_updates_session() {
        let mut session = session();
        let action = handle_frame(
            &frame(json!({
                "op": 0,
                "s": 1,
                "t": "READY",
                "d": {
                    "version": 1,
                    "session_id": "abc",
                    "user": {"id": "u1", "username": "bot", "bot": true},
                    "shard": [2, 8]
                }
            })),
            &mut session,
        );

        let FrameAction::Ready(ready) = action else {
            panic!("expected Ready, got {action:?}");
        };
        assert_eq!(ready.user.id, "u1");
        assert_eq!(session.id, "abc");
        assert_eq!(session.shard.shard_id, 2);
        assert_eq!(session.shard.shard_count, 8);
        assert_eq!(session.last_sequence, 1);
    }

    #[test]
    fn test_ready_without_shard_is_protocol_fault() {
        let mut session = session();
        let action = handle_frame(
            &frame(json!({"op": 0, "t": "READY", "d": {"session_id": "abc"}})),
            &mut session,
        );
        assert!(matches!(action, FrameAction::Terminate(_)));
        assert!(session.id.is_empty());
    }

    #[test]
    fn test_dispatch_forwarded_and_sequence_recorded() {
        let mut session = session();
        let action = handle_frame(
            &frame(json!({"op": 0, "s": 41, "t": "AT_MESSAGE_CREATE", "d": {}})),
            &mut session,
        );
        assert!(matches!(action, FrameAction::Forward));
        assert_eq!(session.last_sequence, 41);

        // Frames without a sequence leave the cursor alone
        handle_frame(&frame(json!({"op": 11})), &mut session);
        assert_eq!(session.last_sequence, 41);
    }

    #[test]
    fn test_zero_or_stale_sequence_keeps_cursor() {
        let mut session = session();
        handle_frame(
            &frame(json!({"op": 0, "s": 41, "t": "AT_MESSAGE_CREATE", "d": {}})),
            &mut session,
        );

        handle_frame(&frame(json!({"op": 11, "s": 0})), &mut session);
        assert_eq!(session.last_sequence, 41);

        let action = handle_frame(
            &frame(json!({"op": 0, "s": 39, "t": "AT_MESSAGE_CREATE", "d": {}})),
            &mut session,
        );
        assert!(matches!(action, FrameAction::Forward));
        assert_eq!(session.last_sequence, 41);
    }
}
