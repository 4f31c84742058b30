//! UDP transport: trace stream carried in datagrams.
//!
//! The target (or a relay) sends the same sentinel-delimited byte stream it
//! would write to the UART, chunked into datagrams at arbitrary boundaries.
//! The synchronizer reads through [`ByteSource`] with whatever buffer size it
//! wants (often a single byte while resyncing), so this transport buffers
//! each received datagram internally and serves it out incrementally rather
//! than letting the socket truncate it.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracewire_core::framing::ByteSource;
use tracing::info;

/// Largest datagram the transport accepts.  Generously above any frame
/// length the firmware emits.
const MAX_DATAGRAM_LEN: usize = 2048;

/// Poll interval for the socket, used to re-check the shutdown flag while
/// no datagrams arrive.
const RECV_TIMEOUT: Duration = Duration::from_millis(200);

/// A bound UDP socket serving received datagrams as a byte stream.
pub struct UdpTransport {
    socket: UdpSocket,
    running: Arc<AtomicBool>,
    pending: Vec<u8>,
    pos: usize,
}

impl UdpTransport {
    /// Binds to `listen_addr` and starts accepting datagrams.
    ///
    /// Clearing `running` makes the next idle read return `Ok(0)`, which the
    /// frame synchronizer reports as a closed transport.
    pub fn bind(listen_addr: SocketAddr, running: Arc<AtomicBool>) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind(listen_addr)
            .with_context(|| format!("failed to bind UDP socket on {listen_addr}"))?;
        socket
            .set_read_timeout(Some(RECV_TIMEOUT))
            .context("failed to set UDP read timeout")?;
        info!("udp transport listening on {listen_addr}");
        Ok(Self {
            socket,
            running,
            pending: Vec::new(),
            pos: 0,
        })
    }

    #[cfg(test)]
    fn from_socket(socket: UdpSocket) -> Self {
        Self {
            socket,
            running: Arc::new(AtomicBool::new(true)),
            pending: Vec::new(),
            pos: 0,
        }
    }

    /// Blocks until a non-empty datagram is pending, or returns `false` when
    /// the shutdown flag is cleared during an idle wait.
    fn refill(&mut self) -> io::Result<bool> {
        let mut buf = vec![0u8; MAX_DATAGRAM_LEN];
        loop {
            match self.socket.recv(&mut buf) {
                Ok(0) => continue, // empty datagram carries nothing
                Ok(n) => {
                    buf.truncate(n);
                    self.pending = buf;
                    self.pos = 0;
                    return Ok(true);
                }
                Err(e)
                    if e.kind() == io::ErrorKind::WouldBlock
                        || e.kind() == io::ErrorKind::TimedOut =>
                {
                    if !self.running.load(Ordering::SeqCst) {
                        return Ok(false);
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}

// Implemented directly rather than through `io::Read` so partial reads never
// discard the rest of a datagram.
impl ByteSource for UdpTransport {
    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.pending.len() && !self.refill()? {
            return Ok(0);
        }
        let n = buf.len().min(self.pending.len() - self.pos);
        buf[..n].copy_from_slice(&self.pending[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
