//! Pipeline workers connecting transport, frame queue, decoder, and
//! registry.
//!
//! Two workers and one bounded channel:
//!
//! ```text
//! transport reader (blocking task) --frames--> decoder (async task) --> registry
//! ```
//!
//! The channel is the frame queue.  When it is full the reader blocks on
//! `blocking_send`, so transport reads pause instead of dropping frames;
//! backpressure propagates all the way to the serial line or UDP socket.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracewire_core::framing::{ByteSource, FrameSynchronizer, FramingError};
use tracing::{debug, info, warn};

use crate::application::event_kind_name;
use crate::infrastructure::registry::BroadcastRegistry;

/// Spawns the blocking transport-reader worker.
///
/// Reads raw bytes from the transport, recovers frame alignment, and pushes
/// each well-delimited frame into the queue.  Exits when the transport
/// closes, the queue's receiver is dropped, or `running` is cleared.
pub fn spawn_transport_reader(
    mut transport: Box<dyn ByteSource>,
    frame_len: usize,
    frame_tx: mpsc::Sender<Vec<u8>>,
    running: Arc<AtomicBool>,
) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let mut synchronizer = FrameSynchronizer::new(frame_len);
        while running.load(Ordering::SeqCst) {
            match synchronizer.next_frame(transport.as_mut()) {
                Ok(frame) => {
                    if frame_tx.blocking_send(frame).is_err() {
                        debug!("frame queue receiver dropped; reader stopping");
                        break;
                    }
                }
                Err(FramingError::Closed) => {
                    info!("transport closed; reader stopping");
                    break;
                }
                Err(FramingError::Io(e)) => {
                    // Transient read failure: the synchronizer already
                    // switched to resync, so keep going.
                    warn!("transport read error: {e}");
                }
            }
        }
    })
}

/// Spawns the async decoder worker.
///
/// Pops frames from the queue, decodes them, and broadcasts each decoded
/// record.  Undecodable frames are logged and dropped; the worker exits when
/// the queue's sender side is dropped.
pub fn spawn_decoder(
    mut frame_rx: mpsc::Receiver<Vec<u8>>,
    registry: Arc<BroadcastRegistry>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = frame_rx.recv().await {
            match tracewire_core::protocol::decode_frame(&frame) {
                Ok(event) => {
                    debug!(
                        "decoded {} record (trace_id={})",
                        event_kind_name(&event),
                        event.header().trace_id
                    );
                    registry.broadcast(&event).await;
                }
                Err(e) => warn!("dropping frame: {e}"),
            }
        }
        debug!("frame queue closed; decoder stopping");
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
