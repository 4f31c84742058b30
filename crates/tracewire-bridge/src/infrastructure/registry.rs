//! Subscriber registry with broadcast fan-out.
//!
//! The registry owns every live subscriber connection behind a single lock.
//! Broadcast serializes the record once, then delivers the same payload to
//! each subscriber in turn; any subscriber whose delivery fails is removed
//! and closed before the broadcast returns, so a dead connection is never
//! delivered to twice.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracewire_core::protocol::TraceEvent;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::{event_kind_name, serialize_event};

/// Opaque identifier for one registered subscriber.
pub type SubscriberId = Uuid;

/// Failure delivering a payload to one subscriber.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// One subscriber connection, as the registry sees it.
///
/// The WebSocket server registers a sink per accepted connection; tests
/// register in-memory fakes.
#[async_trait]
pub trait EventSink: Send {
    /// Delivers one serialized event payload.
    async fn deliver(&mut self, payload: &str) -> Result<(), SinkError>;

    /// Closes the underlying connection.  Best effort; called when the
    /// registry removes the sink after a failed delivery.
    async fn close(&mut self);
}

/// Lock-protected set of live subscribers.
#[derive(Default)]
pub struct BroadcastRegistry {
    subscribers: Mutex<HashMap<SubscriberId, Box<dyn EventSink>>>,
}

impl BroadcastRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a subscriber and returns its identifier.
    ///
    /// Every registration gets a fresh identifier, so registering the same
    /// underlying connection twice yields two independent entries.
    pub async fn register(&self, sink: Box<dyn EventSink>) -> SubscriberId {
        let id = Uuid::new_v4();
        let mut subscribers = self.subscribers.lock().await;
        subscribers.insert(id, sink);
        info!(
            "subscriber {id} registered ({} total)",
            subscribers.len()
        );
        id
    }

    /// Removes and closes a subscriber.  Unknown identifiers are a no-op.
    pub async fn unregister(&self, id: SubscriberId) {
        let mut subscribers = self.subscribers.lock().await;
        if let Some(mut sink) = subscribers.remove(&id) {
            sink.close().await;
            info!(
                "subscriber {id} unregistered ({} remaining)",
                subscribers.len()
            );
        }
    }

    /// Number of currently registered subscribers.
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }

    /// Delivers one decoded record to every registered subscriber.
    ///
    /// Subscribers whose delivery fails are pruned and closed before this
    /// returns.  Delivery failure of one subscriber never affects the
    /// others, and a broadcast to an empty registry is a no-op.
    pub async fn broadcast(&self, event: &TraceEvent) {
        let payload = match serialize_event(event) {
            Ok(payload) => payload,
            Err(e) => {
                error!("failed to serialize {} record: {e}", event_kind_name(event));
                return;
            }
        };

        let mut subscribers = self.subscribers.lock().await;
        if subscribers.is_empty() {
            return;
        }

        let mut failed = Vec::new();
        for (id, sink) in subscribers.iter_mut() {
            if let Err(e) = sink.deliver(&payload).await {
                warn!("dropping subscriber {id}: {e}");
                failed.push(*id);
            }
        }

        for id in failed {
            if let Some(mut sink) = subscribers.remove(&id) {
                sink.close().await;
            }
        }
        debug!(
            "broadcast {} record to {} subscriber(s)",
            event_kind_name(event),
            subscribers.len()
        );
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
