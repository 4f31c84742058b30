//! Tracewire bridge daemon entry point.
//!
//! Wires the configured transport into the frame pipeline and serves decoded
//! records to WebSocket subscribers.

use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{ensure, Context, Result};
use clap::{Parser, ValueEnum};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tracewire_bridge::domain::config::{
    BridgeConfig, TransportConfig, DEFAULT_BAUD_RATE, DEFAULT_QUEUE_CAPACITY,
    DEFAULT_SERIAL_DEVICE,
};
use tracewire_bridge::infrastructure::{pipeline, transport, ws_server};
use tracewire_bridge::BroadcastRegistry;
use tracewire_core::protocol::records::DEFAULT_FRAME_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TransportKind {
    /// Read the trace stream from a local serial device.
    Serial,
    /// Receive the trace stream as UDP datagrams.
    Udp,
}

#[derive(Debug, Parser)]
#[command(name = "tracewire-bridge")]
#[command(about = "Bridges an embedded trace stream to WebSocket subscribers")]
struct Cli {
    /// Transport to ingest the trace stream from
    #[arg(long, value_enum, default_value = "serial", env = "TRACEWIRE_TRANSPORT")]
    transport: TransportKind,

    /// Serial device path (serial transport)
    #[arg(long, default_value = DEFAULT_SERIAL_DEVICE, env = "TRACEWIRE_DEVICE")]
    device: String,

    /// Serial baud rate (serial transport)
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE, env = "TRACEWIRE_BAUD")]
    baud: u32,

    /// UDP listen address (udp transport)
    #[arg(long, default_value = "0.0.0.0", env = "TRACEWIRE_UDP_BIND")]
    udp_bind: IpAddr,

    /// UDP listen port (udp transport)
    #[arg(long, default_value_t = 9000, env = "TRACEWIRE_UDP_PORT")]
    udp_port: u16,

    /// Frame payload length in bytes, excluding the trailing sentinel
    #[arg(long, default_value_t = DEFAULT_FRAME_LEN, env = "TRACEWIRE_FRAME_LEN")]
    frame_len: usize,

    /// Capacity of the frame queue between reader and decoder
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY, env = "TRACEWIRE_QUEUE_CAPACITY")]
    queue_capacity: usize,

    /// WebSocket bind address for subscribers
    #[arg(long, default_value = "0.0.0.0", env = "TRACEWIRE_WS_BIND")]
    ws_bind: IpAddr,

    /// WebSocket port for subscribers
    #[arg(long, default_value_t = 8080, env = "TRACEWIRE_WS_PORT")]
    ws_port: u16,
}

impl Cli {
    fn into_bridge_config(self) -> Result<BridgeConfig> {
        ensure!(self.frame_len > 0, "frame length must be at least 1 byte");
        ensure!(
            self.queue_capacity > 0,
            "queue capacity must be at least 1"
        );

        let transport = match self.transport {
            TransportKind::Serial => TransportConfig::Serial {
                device: self.device,
                baud_rate: self.baud,
            },
            TransportKind::Udp => TransportConfig::Udp {
                listen_addr: SocketAddr::new(self.udp_bind, self.udp_port),
            },
        };

        Ok(BridgeConfig {
            transport,
            frame_len: self.frame_len,
            queue_capacity: self.queue_capacity,
            ws_bind_addr: SocketAddr::new(self.ws_bind, self.ws_port),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_bridge_config()?;
    info!("starting tracewire bridge: {config:?}");

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received");
                running.store(false, Ordering::SeqCst);
            }
        });
    }

    let transport = transport::open_transport(&config.transport, running.clone())
        .context("failed to open transport")?;

    let registry = Arc::new(BroadcastRegistry::new());
    let (frame_tx, frame_rx) = mpsc::channel(config.queue_capacity);

    let reader = pipeline::spawn_transport_reader(
        transport,
        config.frame_len,
        frame_tx,
        running.clone(),
    );
    let decoder = pipeline::spawn_decoder(frame_rx, registry.clone());

    let listener = ws_server::bind(config.ws_bind_addr).await?;
    ws_server::run_server(listener, registry, running).await?;

    // Server exit tears the pipeline down: the reader notices the cleared
    // flag (or a closed transport), and the decoder drains then stops.
    if let Err(e) = reader.await {
        error!("transport reader task failed: {e}");
    }
    if let Err(e) = decoder.await {
        error!("decoder task failed: {e}");
    }

    info!("tracewire bridge stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
