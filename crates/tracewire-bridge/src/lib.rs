//! Tracewire bridge daemon library.
//!
//! Ingests the binary trace stream from an embedded target (over a serial
//! line or UDP), frames and decodes it with `tracewire-core`, and fans the
//! decoded records out as JSON to WebSocket subscribers.
//!
//! The crate follows a layered architecture:
//!
//! - **domain**: configuration and the subscriber-facing message schema
//! - **application**: record-to-message translation
//! - **infrastructure**: transports, pipeline workers, the broadcast
//!   registry, and the WebSocket server

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use domain::config::{BridgeConfig, TransportConfig};
pub use domain::messages::EventMessage;
pub use infrastructure::registry::{BroadcastRegistry, EventSink, SinkError, SubscriberId};
