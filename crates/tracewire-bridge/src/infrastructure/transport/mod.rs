//! Byte transports the bridge can ingest the trace stream from.

pub mod serial;
pub mod udp;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::Result;
use tracewire_core::framing::ByteSource;

use crate::domain::config::TransportConfig;

pub use serial::SerialTransport;
pub use udp::UdpTransport;

/// Opens the transport described by `config`.
///
/// Failure to open is fatal to the daemon: without a transport there is
/// nothing to serve.  The `running` flag lets idle transports notice a
/// shutdown and read as closed.
pub fn open_transport(
    config: &TransportConfig,
    running: Arc<AtomicBool>,
) -> Result<Box<dyn ByteSource>> {
    match config {
        TransportConfig::Serial { device, baud_rate } => {
            Ok(Box::new(SerialTransport::open(device, *baud_rate, running)?))
        }
        TransportConfig::Udp { listen_addr } => {
            Ok(Box::new(UdpTransport::bind(*listen_addr, running)?))
        }
    }
}
