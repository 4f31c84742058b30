//! Serial transport: blocking reads from the target's trace UART.

use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::info;

/// Poll interval for the underlying port.  Timeouts are swallowed in
/// [`Read::read`], which uses them to re-check the shutdown flag, so an idle
/// line blocks the caller without surfacing spurious errors.
const READ_TIMEOUT: Duration = Duration::from_millis(200);

/// A serial device carrying the trace stream, 8N1 framing.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    running: Arc<AtomicBool>,
}

impl SerialTransport {
    /// Opens `device` at `baud_rate`.
    ///
    /// The driver's input buffer is flushed on open: bytes that accumulated
    /// while no reader was attached are stale and would start the stream with
    /// a guaranteed resync.
    ///
    /// Clearing `running` makes the next idle-timeout read return `Ok(0)`,
    /// which the frame synchronizer reports as a closed transport.
    pub fn open(device: &str, baud_rate: u32, running: Arc<AtomicBool>) -> anyhow::Result<Self> {
        let port = serialport::new(device, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(READ_TIMEOUT)
            .open()
            .with_context(|| format!("failed to open serial device {device} at {baud_rate} baud"))?;
        port.clear(ClearBuffer::Input)
            .context("failed to flush serial input buffer")?;
        info!("serial transport open on {device} at {baud_rate} baud");
        Ok(Self { port, running })
    }
}

impl Read for SerialTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.port.read(buf) {
                // An idle line is not an error; keep waiting unless the
                // daemon is shutting down.
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                    if !self.running.load(Ordering::SeqCst) {
                        return Ok(0);
                    }
                }
                other => return other,
            }
        }
    }
}
