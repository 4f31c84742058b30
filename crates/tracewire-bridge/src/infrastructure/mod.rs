//! Infrastructure layer: transports, pipeline workers, the broadcast
//! registry, and the WebSocket server.

pub mod pipeline;
pub mod registry;
pub mod transport;
pub mod ws_server;
