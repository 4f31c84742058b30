//! Bridge daemon configuration.

use std::net::SocketAddr;

use tracewire_core::protocol::records::DEFAULT_FRAME_LEN;

/// Default capacity of the bounded frame queue between the transport reader
/// and the decoder.
pub const DEFAULT_QUEUE_CAPACITY: usize = 20;

/// Default serial line rate of the embedded target's trace UART.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default serial device path.
pub const DEFAULT_SERIAL_DEVICE: &str = "/dev/ttyUSB0";

/// Default WebSocket bind address for subscriber connections.
pub const DEFAULT_WS_BIND: &str = "0.0.0.0:8080";

/// Which byte transport the bridge reads the trace stream from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportConfig {
    /// Blocking reads from a local serial device.
    Serial { device: String, baud_rate: u32 },
    /// Datagrams received on a bound UDP socket.
    Udp { listen_addr: SocketAddr },
}

/// Complete runtime configuration of the bridge daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Where the raw trace bytes come from.
    pub transport: TransportConfig,
    /// Payload length of one wire frame, excluding the trailing sentinel.
    pub frame_len: usize,
    /// Capacity of the bounded frame queue between reader and decoder.
    pub queue_capacity: usize,
    /// Address the WebSocket server listens on.
    pub ws_bind_addr: SocketAddr,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::Serial {
                device: DEFAULT_SERIAL_DEVICE.to_string(),
                baud_rate: DEFAULT_BAUD_RATE,
            },
            frame_len: DEFAULT_FRAME_LEN,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            ws_bind_addr: DEFAULT_WS_BIND
                .parse()
                .expect("default bind address must parse"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
