//! WebSocket server for subscriber connections.
//!
//! Subscribers connect to `ws://<bind-addr>/data` and receive one JSON text
//! message per decoded trace record.  The server never expects meaningful
//! client messages; the read side of each connection exists only to detect
//! disconnects.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, info, warn};

use crate::infrastructure::registry::{BroadcastRegistry, EventSink, SinkError};

/// Request path subscribers must connect to.
pub const DATA_PATH: &str = "/data";

/// Binds the subscriber listener.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind WebSocket listener on {addr}"))?;
    info!("websocket server listening on {addr}{DATA_PATH}");
    Ok(listener)
}

/// Accept loop: upgrades each incoming connection and registers it as a
/// subscriber.  Returns when `running` is cleared.
pub async fn run_server(
    listener: TcpListener,
    registry: Arc<BroadcastRegistry>,
    running: Arc<AtomicBool>,
) -> Result<()> {
    while running.load(Ordering::SeqCst) {
        // Bounded wait so the loop re-checks the shutdown flag.
        let accepted =
            match tokio::time::timeout(Duration::from_millis(200), listener.accept()).await {
                Ok(accepted) => accepted,
                Err(_) => continue,
            };

        match accepted {
            Ok((stream, peer)) => {
                let registry = registry.clone();
                tokio::spawn(handle_subscriber(stream, peer, registry));
            }
            Err(e) => warn!("failed to accept connection: {e}"),
        }
    }
    info!("websocket server stopped");
    Ok(())
}

/// Performs the WebSocket handshake (rejecting any path but [`DATA_PATH`]),
/// registers the connection, and keeps reading until the peer goes away.
async fn handle_subscriber(stream: TcpStream, peer: SocketAddr, registry: Arc<BroadcastRegistry>) {
    let check_path = |request: &Request, response: Response| {
        if request.uri().path() == DATA_PATH {
            Ok(response)
        } else {
            warn!(
                "rejecting connection from {peer}: bad path {:?}",
                request.uri().path()
            );
            let mut response = ErrorResponse::new(Some("expected path /data".to_string()));
            *response.status_mut() = StatusCode::NOT_FOUND;
            Err(response)
        }
    };

    let ws_stream = match tokio_tungstenite::accept_hdr_async(stream, check_path).await {
        Ok(ws_stream) => ws_stream,
        Err(e) => {
            warn!("websocket handshake with {peer} failed: {e}");
            return;
        }
    };
    info!("subscriber connected from {peer}");

    let (sink, mut reader) = ws_stream.split();
    let id = registry
        .register(Box::new(WsEventSink { peer, sink }))
        .await;

    // The read loop is the disconnect detector: any close frame, error, or
    // EOF on the read side means the subscriber is gone.
    while let Some(message) = reader.next().await {
        match message {
            Ok(WsMessage::Close(_)) | Err(_) => break,
            // Subscribers are not expected to send anything else; ignore.
            Ok(other) => debug!("ignoring message from {peer}: {other:?}"),
        }
    }

    registry.unregister(id).await;
    info!("subscriber {peer} disconnected");
}

/// Registry sink backed by the write half of one WebSocket connection.
struct WsEventSink {
    peer: SocketAddr,
    sink: SplitSink<WebSocketStream<TcpStream>, WsMessage>,
}

#[async_trait]
impl EventSink for WsEventSink {
    async fn deliver(&mut self, payload: &str) -> Result<(), SinkError> {
        self.sink
            .send(WsMessage::Text(payload.to_string()))
            .await
            .map_err(|e| SinkError::Delivery(format!("{}: {e}", self.peer)))
    }

    async fn close(&mut self) {
        let _ = self.sink.close().await;
    }
}
