//! Integration tests for the push channel pipeline: channel manager ->
//! batch queue -> sync engine -> fleet store, against a real in-process
//! WebSocket server.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tokio_util::sync::CancellationToken;

use vigil::channel::ChannelManager;
use vigil::config::ConnectionConfig;
use vigil::engine::{Readiness, SyncEngine};
use vigil::store::FleetStore;

struct Pipeline {
    store: Arc<FleetStore>,
    engine: Arc<SyncEngine>,
    cancel: CancellationToken,
    channel_handle: JoinHandle<()>,
    engine_handle: JoinHandle<()>,
}

/// Wire up the full pipeline against a local aggregator address.
fn start_pipeline(addr: std::net::SocketAddr, reconnect_delay_seconds: u64) -> Pipeline {
    let config = ConnectionConfig {
        origin: format!("http://{addr}"),
        path: "/ws".to_string(),
        reconnect_delay_seconds,
    };

    let store = Arc::new(FleetStore::new());
    let engine = Arc::new(SyncEngine::new(store.clone()));
    let (batch_tx, batch_rx) = mpsc::channel(16);
    let cancel = CancellationToken::new();

    let channel = ChannelManager::new(&config, batch_tx).unwrap();
    let channel_handle = channel.start(cancel.clone());
    let engine_handle = engine.clone().start(batch_rx, cancel.clone());

    Pipeline {
        store,
        engine,
        cancel,
        channel_handle,
        engine_handle,
    }
}

async fn accept_ws(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = listener.accept().await.unwrap();
    tokio_tungstenite::accept_async(stream).await.unwrap()
}

/// Poll `cond` until it holds or the deadline passes.
async fn wait_until(deadline: Duration, cond: impl Fn() -> bool) -> bool {
    let start = tokio::time::Instant::now();
    while start.elapsed() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    cond()
}

fn metrics_frame(entries: &[(&str, u64, u64)]) -> String {
    let servers: Vec<serde_json::Value> = entries
        .iter()
        .map(|(id, total_rx, total_tx)| {
            serde_json::json!({
                "server_id": id,
                "server_name": format!("Server {id}"),
                "online": true,
                "metrics": {
                    "network": {"total_rx": total_rx, "total_tx": total_tx}
                }
            })
        })
        .collect();
    serde_json::json!({"type": "metrics", "servers": servers}).to_string()
}

#[tokio::test]
async fn test_batch_flows_from_channel_to_store() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        ws.send(Message::Text(metrics_frame(&[("local", 1000, 2000), ("edge-1", 0, 0)])))
            .await
            .unwrap();
        // Hold the connection open until the client disconnects.
        while ws.next().await.is_some() {}
    });

    let pipeline = start_pipeline(addr, 1);
    assert_eq!(pipeline.engine.readiness(), Readiness::Loading);

    assert!(wait_until(Duration::from_secs(5), || pipeline.store.len() == 2).await);
    assert_eq!(pipeline.engine.readiness(), Readiness::Ready);

    let local = pipeline.store.get("local").unwrap();
    assert!(local.connected);
    assert_eq!(local.snapshot.unwrap().network.total_rx, 1000);

    pipeline.cancel.cancel();
    pipeline.channel_handle.await.unwrap();
    pipeline.engine_handle.await.unwrap();
    server.abort();
}

#[tokio::test]
async fn test_malformed_frame_is_dropped_without_killing_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        ws.send(Message::Text("{definitely not json".to_string()))
            .await
            .unwrap();
        ws.send(Message::Text(
            serde_json::json!({"type": "metrics", "servers": "wrong shape"}).to_string(),
        ))
        .await
        .unwrap();
        // A valid frame on the same connection must still be processed.
        ws.send(Message::Text(metrics_frame(&[("a", 1, 1)]))).await.unwrap();
        while ws.next().await.is_some() {}
    });

    let pipeline = start_pipeline(addr, 1);

    assert!(wait_until(Duration::from_secs(5), || pipeline.store.get("a").is_some()).await);
    assert_eq!(pipeline.store.len(), 1);
    assert_eq!(pipeline.engine.readiness(), Readiness::Ready);

    pipeline.cancel.cancel();
    pipeline.channel_handle.await.unwrap();
    pipeline.engine_handle.await.unwrap();
    server.abort();
}

#[tokio::test]
async fn test_reconnect_after_server_close_preserves_state_during_gap() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        // First connection: one batch, then drop without a close handshake.
        let mut ws = accept_ws(&listener).await;
        ws.send(Message::Text(metrics_frame(&[("a", 100, 100), ("b", 0, 0)])))
            .await
            .unwrap();
        drop(ws);

        // The client must come back on its own after the fixed delay.
        let mut ws = accept_ws(&listener).await;
        ws.send(Message::Text(metrics_frame(&[("a", 200, 200)])))
            .await
            .unwrap();
        while ws.next().await.is_some() {}
    });

    let pipeline = start_pipeline(addr, 1);

    assert!(wait_until(Duration::from_secs(5), || pipeline.store.len() == 2).await);

    // During the reconnect gap the last good view stays queryable.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(pipeline.store.len(), 2);
    assert!(pipeline.store.get("b").is_some());
    assert_eq!(pipeline.engine.readiness(), Readiness::Ready);

    // After reconnect the next batch replaces the membership wholesale.
    assert!(wait_until(Duration::from_secs(10), || {
        pipeline.store.len() == 1 && pipeline.store.get("b").is_none()
    })
    .await);
    assert_eq!(pipeline.engine.readiness(), Readiness::Ready);

    pipeline.cancel.cancel();
    pipeline.channel_handle.await.unwrap();
    pipeline.engine_handle.await.unwrap();
    server.abort();
}

#[tokio::test]
async fn test_settings_only_frame_updates_settings_but_not_readiness() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        ws.send(Message::Text(
            serde_json::json!({
                "type": "settings",
                "site_settings": {
                    "site_name": "Edge Fleet",
                    "site_description": "staging",
                    "social_links": []
                }
            })
            .to_string(),
        ))
        .await
        .unwrap();
        while ws.next().await.is_some() {}
    });

    let pipeline = start_pipeline(addr, 1);

    assert!(
        wait_until(Duration::from_secs(5), || {
            pipeline.engine.site_settings().site_name == "Edge Fleet"
        })
        .await
    );
    assert_eq!(pipeline.engine.readiness(), Readiness::Loading);
    assert!(pipeline.store.is_empty());

    pipeline.cancel.cancel();
    pipeline.channel_handle.await.unwrap();
    pipeline.engine_handle.await.unwrap();
    server.abort();
}

#[tokio::test]
async fn test_cancel_is_idempotent_and_stops_reconnecting() {
    // No server at all: the manager sits in its connect/retry loop.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let pipeline = start_pipeline(addr, 1);
    tokio::time::sleep(Duration::from_millis(200)).await;

    pipeline.cancel.cancel();
    pipeline.cancel.cancel(); // Second cancel is a no-op.

    tokio::time::timeout(Duration::from_secs(5), pipeline.channel_handle)
        .await
        .expect("channel manager did not stop after cancel")
        .unwrap();
    tokio::time::timeout(Duration::from_secs(5), pipeline.engine_handle)
        .await
        .expect("engine did not stop after cancel")
        .unwrap();
}
