//! WebSocket server integration tests with real client connections.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::connect_async;

use tracewire_bridge::infrastructure::ws_server;
use tracewire_bridge::BroadcastRegistry;
use tracewire_core::protocol::records::{PanicEvent, TraceHeader};
use tracewire_core::protocol::TraceEvent;

async fn start_server() -> (std::net::SocketAddr, Arc<BroadcastRegistry>, Arc<AtomicBool>) {
    let registry = Arc::new(BroadcastRegistry::new());
    let running = Arc::new(AtomicBool::new(true));
    let listener = ws_server::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(ws_server::run_server(
        listener,
        registry.clone(),
        running.clone(),
    ));
    (addr, registry, running)
}

async fn wait_for_subscribers(registry: &BroadcastRegistry, expected: usize) {
    timeout(Duration::from_secs(2), async {
        while registry.subscriber_count().await != expected {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("timed out waiting for subscriber count");
}

#[tokio::test]
async fn test_subscriber_receives_broadcast_records_as_json() {
    let (addr, registry, running) = start_server().await;

    let (mut ws, _) = connect_async(format!("ws://{addr}/data")).await.unwrap();
    wait_for_subscribers(&registry, 1).await;

    let event = TraceEvent::Panic(PanicEvent {
        header: TraceHeader {
            core_id: 1,
            timestamp: 99,
            trace_id: 12,
        },
        faulting_pc: 0x0800_4444,
        exception_reason: "MemManage fault".to_string(),
    });
    registry.broadcast(&event).await;

    let message = timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("timed out waiting for message")
        .expect("stream ended")
        .expect("websocket error");
    let text = message.into_text().unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["kind"], "panic");
    assert_eq!(json["trace_id"], 12);
    assert_eq!(json["faulting_pc"], 0x0800_4444);
    assert_eq!(json["exception_reason"], "MemManage fault");

    running.store(false, Ordering::SeqCst);
}

#[tokio::test]
async fn test_wrong_path_is_rejected() {
    let (addr, registry, running) = start_server().await;

    let result = connect_async(format!("ws://{addr}/metrics")).await;
    assert!(result.is_err());

    // A rejected handshake must leave no subscriber behind.
    sleep(Duration::from_millis(50)).await;
    assert_eq!(registry.subscriber_count().await, 0);

    running.store(false, Ordering::SeqCst);
}

#[tokio::test]
async fn test_client_disconnect_unregisters_the_subscriber() {
    let (addr, registry, running) = start_server().await;

    let (mut ws, _) = connect_async(format!("ws://{addr}/data")).await.unwrap();
    wait_for_subscribers(&registry, 1).await;

    ws.close(None).await.unwrap();
    wait_for_subscribers(&registry, 0).await;

    running.store(false, Ordering::SeqCst);
}

#[tokio::test]
async fn test_multiple_subscribers_each_get_the_broadcast() {
    let (addr, registry, running) = start_server().await;

    let (mut ws_a, _) = connect_async(format!("ws://{addr}/data")).await.unwrap();
    let (mut ws_b, _) = connect_async(format!("ws://{addr}/data")).await.unwrap();
    wait_for_subscribers(&registry, 2).await;

    let event = TraceEvent::Panic(PanicEvent {
        header: TraceHeader {
            core_id: 0,
            timestamp: 1,
            trace_id: 77,
        },
        faulting_pc: 0,
        exception_reason: "watchdog".to_string(),
    });
    registry.broadcast(&event).await;

    for ws in [&mut ws_a, &mut ws_b] {
        let message = timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for message")
            .expect("stream ended")
            .expect("websocket error");
        let json: serde_json::Value =
            serde_json::from_str(&message.into_text().unwrap()).unwrap();
        assert_eq!(json["trace_id"], 77);
    }

    running.store(false, Ordering::SeqCst);
}
