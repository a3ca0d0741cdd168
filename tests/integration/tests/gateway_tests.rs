//! Gateway Integration Tests
//!
//! Drive real shard connections against the in-process mock gateway.
//!
//! Run with: cargo test -p integration-tests --test gateway_tests

use std::sync::Arc;

use integration_tests::{fixtures::*, test_token, MockGateway, RunningManager, STEP_TIMEOUT};
use shardgate_core::Intents;
use shardgate_gateway::connection::{
    ConnectionConfig, DisconnectCause, ShardConnection, Termination,
};
use shardgate_gateway::handlers::EventDispatcher;
use shardgate_gateway::session::build_sessions;
use shardgate_gateway::GatewayError;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

// ============================================================================
// Handshake and Resume
// ============================================================================

#[tokio::test]
async fn test_identify_ready_heartbeat_then_resume() {
    let mut gateway = MockGateway::start().await.unwrap();
    let running = RunningManager::start(EventDispatcher::new(), gateway.info(1));

    let mut first = gateway.accept().await.unwrap();
    first.send(&hello(100)).await.unwrap();

    let identify = first.recv_op(OP_IDENTIFY).await.unwrap();
    assert_eq!(identify["d"]["token"], "Bot 1024.secret");
    assert_eq!(identify["d"]["shard"], serde_json::json!([0, 1]));
    assert_eq!(identify["d"]["intents"], 1);

    first.send(&ready(1, "abc", 0, 1)).await.unwrap();
    first
        .send(&dispatch(5, "GUILD_CREATE", &serde_json::json!({"id": "g1"})))
        .await
        .unwrap();

    // Heartbeats follow the Hello interval and carry the latest sequence
    loop {
        let heartbeat = first.recv_op(OP_HEARTBEAT).await.unwrap();
        first.send(&heartbeat_ack()).await.unwrap();
        if heartbeat["d"] == 5 {
            break;
        }
    }

    first.close(4009, "session timed out").await.unwrap();

    let mut second = gateway.accept().await.unwrap();
    second.send(&hello(100)).await.unwrap();
    let resume = second.recv_op(OP_RESUME).await.unwrap();
    assert_eq!(resume["d"]["session_id"], "abc");
    assert_eq!(resume["d"]["seq"], 5);
    assert_eq!(resume["d"]["token"], "Bot 1024.secret");
    second.send(&resumed(6)).await.unwrap();

    assert!(running.shutdown().await.unwrap().is_ok());
}

#[tokio::test]
async fn test_server_reconnect_resumes() {
    let mut gateway = MockGateway::start().await.unwrap();
    let running = RunningManager::start(EventDispatcher::new(), gateway.info(1));

    let mut first = gateway.accept().await.unwrap();
    first.send(&hello(45_000)).await.unwrap();
    first.recv_op(OP_IDENTIFY).await.unwrap();
    first.send(&ready(1, "xyz", 0, 1)).await.unwrap();
    first.send(&reconnect()).await.unwrap();

    let mut second = gateway.accept().await.unwrap();
    let resume = second.recv_op(OP_RESUME).await.unwrap();
    assert_eq!(resume["d"]["session_id"], "xyz");
    assert_eq!(resume["d"]["seq"], 1);

    assert!(running.shutdown().await.unwrap().is_ok());
}

#[tokio::test]
async fn test_invalid_session_reidentifies() {
    let mut gateway = MockGateway::start().await.unwrap();
    let running = RunningManager::start(EventDispatcher::new(), gateway.info(1));

    let mut first = gateway.accept().await.unwrap();
    first.send(&hello(45_000)).await.unwrap();
    first.recv_op(OP_IDENTIFY).await.unwrap();
    first.send(&ready(3, "stale", 0, 1)).await.unwrap();
    first.send(&invalid_session()).await.unwrap();

    let mut second = gateway.accept().await.unwrap();
    let handshake = second.recv().await.unwrap();
    assert_eq!(handshake["op"], OP_IDENTIFY);
    assert_eq!(handshake["d"]["shard"], serde_json::json!([0, 1]));

    assert!(running.shutdown().await.unwrap().is_ok());
}

#[tokio::test]
async fn test_reidentify_close_code_discards_session() {
    let mut gateway = MockGateway::start().await.unwrap();
    let running = RunningManager::start(EventDispatcher::new(), gateway.info(1));

    let mut first = gateway.accept().await.unwrap();
    first.recv_op(OP_IDENTIFY).await.unwrap();
    first.send(&ready(1, "abc", 0, 1)).await.unwrap();
    first.close(4006, "invalid session").await.unwrap();

    let mut second = gateway.accept().await.unwrap();
    assert_eq!(second.recv().await.unwrap()["op"], OP_IDENTIFY);

    assert!(running.shutdown().await.unwrap().is_ok());
}

#[tokio::test]
async fn test_operator_resume_request() {
    let mut gateway = MockGateway::start().await.unwrap();
    let running = RunningManager::start(EventDispatcher::new(), gateway.info(1));

    let mut first = gateway.accept().await.unwrap();
    first.recv_op(OP_IDENTIFY).await.unwrap();
    first.send(&ready(2, "abc", 0, 1)).await.unwrap();
    // Let the READY land before asking for a resume
    first.send(&heartbeat_ack()).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    running.manager.resume_trigger().trigger();
    first.closed().await.unwrap();

    let mut second = gateway.accept().await.unwrap();
    let resume = second.recv_op(OP_RESUME).await.unwrap();
    assert_eq!(resume["d"]["session_id"], "abc");
    assert_eq!(resume["d"]["seq"], 2);

    assert!(running.shutdown().await.unwrap().is_ok());
}

// ============================================================================
// Fatal Termination and Shutdown
// ============================================================================

#[tokio::test]
async fn test_fatal_close_stops_everything() {
    let mut gateway = MockGateway::start().await.unwrap();
    let running = RunningManager::start(EventDispatcher::new(), gateway.info(2));

    let mut first = gateway.accept().await.unwrap();
    let identify = first.recv_op(OP_IDENTIFY).await.unwrap();
    assert_eq!(identify["d"]["shard"], serde_json::json!([0, 2]));

    let mut second = gateway.accept().await.unwrap();
    second.recv_op(OP_IDENTIFY).await.unwrap();

    first.close(4914, "bot offline").await.unwrap();

    match running.finished().await.unwrap() {
        Err(GatewayError::Fatal { shard, cause }) => {
            assert_eq!(shard.shard_id, 0);
            assert_eq!(
                cause,
                DisconnectCause::Closed {
                    code: Some(4914),
                    reason: "bot offline".to_string()
                }
            );
        }
        other => panic!("expected fatal termination, got {other:?}"),
    }

    // The healthy shard is closed too
    second.closed().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_closes_connection() {
    let mut gateway = MockGateway::start().await.unwrap();
    let running = RunningManager::start(EventDispatcher::new(), gateway.info(1));

    let mut connection = gateway.accept().await.unwrap();
    connection.recv_op(OP_IDENTIFY).await.unwrap();

    assert!(running.shutdown().await.unwrap().is_ok());
    connection.closed().await.unwrap();
}

// ============================================================================
// Event Dispatch
// ============================================================================

#[tokio::test]
async fn test_at_message_reaches_handler_in_order() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let tx = Arc::new(tx);
    let dispatcher = EventDispatcher::new();
    dispatcher.on_at_message(move |_, message| {
        let tx = Arc::clone(&tx);
        async move {
            let _ = tx.send(message.plain_content());
            Ok(())
        }
    });

    let mut gateway = MockGateway::start().await.unwrap();
    let running = RunningManager::start(dispatcher, gateway.info(1));

    let mut connection = gateway.accept().await.unwrap();
    connection.recv_op(OP_IDENTIFY).await.unwrap();
    connection.send(&ready(1, "abc", 0, 1)).await.unwrap();
    connection.send(&at_message(2, "hello")).await.unwrap();
    connection
        .send(&dispatch(3, "GUILD_DELETE", &serde_json::json!({"id": "g1"})))
        .await
        .unwrap();
    connection.send(&at_message(4, "world")).await.unwrap();

    assert_eq!(rx.recv().await.unwrap(), "hello");
    assert_eq!(rx.recv().await.unwrap(), "world");

    assert!(running.shutdown().await.unwrap().is_ok());
}

#[tokio::test]
async fn test_handler_panic_resumes_connection() {
    let dispatcher = EventDispatcher::new();
    dispatcher.on_at_message(|_, message| async move {
        assert!(message.content.is_empty(), "handler bug");
        Ok(())
    });

    let mut gateway = MockGateway::start().await.unwrap();
    let running = RunningManager::start(dispatcher, gateway.info(1));

    let mut first = gateway.accept().await.unwrap();
    first.recv_op(OP_IDENTIFY).await.unwrap();
    first.send(&ready(1, "abc", 0, 1)).await.unwrap();
    first.send(&at_message(7, "boom")).await.unwrap();

    let mut second = gateway.accept().await.unwrap();
    let resume = second.recv_op(OP_RESUME).await.unwrap();
    assert_eq!(resume["d"]["session_id"], "abc");
    assert_eq!(resume["d"]["seq"], 7);

    assert!(running.shutdown().await.unwrap().is_ok());
}

// ============================================================================
// Transport Failures
// ============================================================================

#[tokio::test]
async fn test_transport_dropped_before_handshake_is_retried() {
    let mut gateway = MockGateway::start().await.unwrap();
    let running = RunningManager::start(EventDispatcher::new(), gateway.info(1));

    gateway.accept().await.unwrap().drop_transport();

    let mut second = gateway.accept().await.unwrap();
    let handshake = second.recv().await.unwrap();
    assert_eq!(handshake["op"], OP_IDENTIFY);
    assert_eq!(handshake["d"]["shard"], serde_json::json!([0, 1]));
    assert_eq!(handshake["d"]["token"], "Bot 1024.secret");
    second.drop_transport();

    // Every retry carries the same handshake
    let mut third = gateway.accept().await.unwrap();
    assert_eq!(third.recv().await.unwrap(), handshake);

    assert!(running.shutdown().await.unwrap().is_ok());
}

#[tokio::test]
async fn test_transport_dropped_while_heartbeating_resumes() {
    let mut gateway = MockGateway::start().await.unwrap();
    let running = RunningManager::start(EventDispatcher::new(), gateway.info(1));

    let mut first = gateway.accept().await.unwrap();
    first.send(&hello(50)).await.unwrap();
    first.recv_op(OP_IDENTIFY).await.unwrap();
    first.send(&ready(1, "abc", 0, 1)).await.unwrap();
    first
        .send(&dispatch(3, "GUILD_CREATE", &serde_json::json!({"id": "g1"})))
        .await
        .unwrap();
    loop {
        if first.recv_op(OP_HEARTBEAT).await.unwrap()["d"] == 3 {
            break;
        }
    }
    first.drop_transport();

    let mut second = gateway.accept().await.unwrap();
    let resume = second.recv_op(OP_RESUME).await.unwrap();
    assert_eq!(resume["d"]["session_id"], "abc");
    assert_eq!(resume["d"]["seq"], 3);

    assert!(running.shutdown().await.unwrap().is_ok());
}

// ============================================================================
// Single Connection
// ============================================================================

#[tokio::test]
async fn test_connection_keeps_ready_identity() {
    let mut gateway = MockGateway::start().await.unwrap();
    let session = build_sessions(&gateway.info(1), &test_token(), Intents::GUILDS)
        .unwrap()
        .remove(0);
    let connection = Arc::new(ShardConnection::new(
        session,
        Arc::new(ConnectionConfig::default()),
        Arc::new(EventDispatcher::new()),
    ));

    let (_resume_tx, resume_rx) = watch::channel(0);
    let running = Arc::clone(&connection);
    let handle =
        tokio::spawn(async move { running.run(CancellationToken::new(), resume_rx).await });

    let mut server = gateway.accept().await.unwrap();
    server.recv_op(OP_IDENTIFY).await.unwrap();
    server.send(&ready(4, "abc", 0, 1)).await.unwrap();
    server.close(4009, "session timed out").await.unwrap();

    let disconnect = tokio::time::timeout(STEP_TIMEOUT, handle)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(disconnect.termination, Termination::Resumable);

    let ready = connection.ready().unwrap();
    assert_eq!(ready.session_id, "abc");
    assert_eq!(ready.user.username, "shardgate-bot");
    assert_eq!(connection.session().id, "abc");
    assert_eq!(connection.session().last_sequence, 4);
}
