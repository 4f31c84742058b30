//! Sentinel-based frame synchronizer.
//!
//! Wire format:
//! ```text
//! [payload: frame_len bytes][sentinel: 0x0D 0x0A] ... repeated ...
//! ```
//!
//! The synchronizer is a two-state machine:
//!
//! - **`Resyncing`** – alignment unknown.  Read one byte at a time, keeping
//!   the last two bytes in a sliding window; when the window equals the
//!   sentinel, the next byte on the stream is the start of a frame.
//! - **`Synced`** – read exactly `frame_len + 2` bytes.  If the trailing two
//!   bytes equal the sentinel, the leading `frame_len` bytes are a valid
//!   frame.  If not, the read is discarded and the machine drops back to
//!   `Resyncing`.
//!
//! A fresh synchronizer starts in `Resyncing`, so attaching mid-stream costs
//! at most one frame of data before alignment is found.  Sentinel bytes that
//! happen to appear *inside* a frame's payload are harmless while synced,
//! because synced reads are fixed-size block reads, not scans.

use std::io;

use tracing::{debug, warn};

/// Two-byte end-of-frame marker: carriage return + line feed.
pub const SENTINEL: [u8; 2] = [b'\r', b'\n'];

/// Length of [`SENTINEL`] in bytes.
pub const SENTINEL_LEN: usize = 2;

/// A blocking byte producer: the synchronizer's only I/O seam.
///
/// Mirrors the shape of `std::io::Read::read` — fills as much of `buf` as is
/// currently available and returns the count, with `Ok(0)` meaning the source
/// is exhausted.  A blanket impl covers every `std::io::Read + Send` type, so
/// serial ports and in-memory cursors work unmodified; sources that are not
/// `Read` (e.g. a datagram socket that must be chunk-buffered) implement the
/// trait directly.
pub trait ByteSource: Send {
    /// Reads up to `buf.len()` bytes into `buf`, returning how many were read.
    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl<R: io::Read + Send> ByteSource for R {
    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read(buf)
    }
}

/// Errors surfaced by [`FrameSynchronizer::next_frame`].
///
/// A sentinel mismatch is *not* an error: it is handled internally by
/// discarding the read and rescanning.  Only transport-level failures reach
/// the caller.
#[derive(Debug, thiserror::Error)]
pub enum FramingError {
    /// The underlying transport read failed.  The synchronizer has already
    /// dropped back to [`SyncState::Resyncing`]; the caller should report the
    /// error and call [`FrameSynchronizer::next_frame`] again.
    #[error("transport read failed: {0}")]
    Io(#[from] io::Error),

    /// The transport reported end-of-stream (a read returned 0 bytes).
    /// No further frames will ever arrive from this source.
    #[error("transport closed")]
    Closed,
}

/// Alignment state of the synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Frame boundaries are known; reads are fixed-size blocks.
    Synced,
    /// Alignment unknown; scanning byte-by-byte for the sentinel.
    Resyncing,
}

/// Converts an unreliable byte stream into a sequence of aligned frames.
///
/// # Example
///
/// ```rust
/// use std::io::Cursor;
/// use tracewire_core::framing::FrameSynchronizer;
///
/// // 4-byte frames: leading garbage, then a sentinel, then one valid frame.
/// let stream: Vec<u8> = [b"junk\r\n".as_ref(), b"abcd\r\n".as_ref()].concat();
/// let mut sync = FrameSynchronizer::new(4);
/// let frame = sync.next_frame(&mut Cursor::new(stream)).unwrap();
/// assert_eq!(frame, b"abcd");
/// ```
pub struct FrameSynchronizer {
    frame_len: usize,
    state: SyncState,
}

impl FrameSynchronizer {
    /// Creates a synchronizer for `frame_len`-byte frames.
    ///
    /// The initial state is [`SyncState::Resyncing`]: a fresh connection's
    /// alignment is unknown until the first sentinel is observed.
    pub fn new(frame_len: usize) -> Self {
        Self {
            frame_len,
            state: SyncState::Resyncing,
        }
    }

    /// Returns the current alignment state.
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Returns the configured frame length in bytes (sentinel excluded).
    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    /// Reads from `source` until one complete, sentinel-terminated frame is
    /// available and returns its `frame_len` payload bytes.
    ///
    /// Misaligned data is consumed and discarded internally: a sentinel
    /// mismatch after a block read logs a warning, re-enters `Resyncing`, and
    /// keeps going.  The method only returns early for transport failures.
    ///
    /// # Errors
    ///
    /// - [`FramingError::Io`] – a read failed.  State is already `Resyncing`;
    ///   calling `next_frame` again resumes the scan.
    /// - [`FramingError::Closed`] – the source is exhausted.
    pub fn next_frame<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<Vec<u8>, FramingError> {
        loop {
            if self.state == SyncState::Resyncing {
                self.scan_for_sentinel(source)?;
            }

            let mut buf = vec![0u8; self.frame_len + SENTINEL_LEN];
            if let Err(e) = self.fill_exact(source, &mut buf) {
                self.state = SyncState::Resyncing;
                return Err(e);
            }

            if buf[self.frame_len..] == SENTINEL {
                buf.truncate(self.frame_len);
                return Ok(buf);
            }

            warn!(
                "sentinel mismatch after {}-byte frame read (got {:02X?}); resynchronizing",
                self.frame_len,
                &buf[self.frame_len..]
            );
            self.state = SyncState::Resyncing;
        }
    }

    /// Consumes bytes one at a time until the two most recent bytes equal the
    /// sentinel, then transitions to `Synced`.
    fn scan_for_sentinel<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<(), FramingError> {
        let mut window = [0u8; SENTINEL_LEN];
        let mut byte = [0u8; 1];
        let mut discarded = 0usize;

        loop {
            let n = source.read_bytes(&mut byte)?;
            if n == 0 {
                return Err(FramingError::Closed);
            }
            window[0] = window[1];
            window[1] = byte[0];
            discarded += 1;

            if window == SENTINEL {
                debug!("frame alignment recovered after {discarded} byte(s)");
                self.state = SyncState::Synced;
                return Ok(());
            }
        }
    }

    /// Reads exactly `buf.len()` bytes, tolerating short reads from the source.
    fn fill_exact<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
        buf: &mut [u8],
    ) -> Result<(), FramingError> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = source.read_bytes(&mut buf[filled..])?;
            if n == 0 {
                return Err(FramingError::Closed);
            }
            filled += n;
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const FRAME_LEN: usize = 8;

    /// Builds one on-wire frame: `payload` padded/truncated to FRAME_LEN,
    /// followed by the sentinel.
    fn wire_frame(payload: &[u8]) -> Vec<u8> {
        let mut frame = payload.to_vec();
        frame.resize(FRAME_LEN, 0x00);
        frame.extend_from_slice(&SENTINEL);
        frame
    }

    #[test]
    fn test_initial_state_is_resyncing() {
        let sync = FrameSynchronizer::new(FRAME_LEN);
        assert_eq!(sync.state(), SyncState::Resyncing);
    }

    #[test]
    fn test_garbage_then_sentinel_then_frames_emits_exactly_the_frames() {
        // Arbitrary leading bytes that do not contain the sentinel, then a
        // sentinel, then two valid frames.
        let mut stream = b"\x01\x02\x03garbage".to_vec();
        stream.extend_from_slice(&SENTINEL);
        stream.extend_from_slice(&wire_frame(b"frame-01"));
        stream.extend_from_slice(&wire_frame(b"frame-02"));
        let mut cursor = Cursor::new(stream);

        let mut sync = FrameSynchronizer::new(FRAME_LEN);
        assert_eq!(sync.next_frame(&mut cursor).unwrap(), b"frame-01");
        assert_eq!(sync.state(), SyncState::Synced);
        assert_eq!(sync.next_frame(&mut cursor).unwrap(), b"frame-02");

        // No spurious third frame: the stream is exhausted.
        assert!(matches!(
            sync.next_frame(&mut cursor),
            Err(FramingError::Closed)
        ));
    }

    #[test]
    fn test_frame_not_followed_by_sentinel_is_rejected_and_resyncs() {
        // One "frame" whose terminator is wrong, then a proper sentinel and a
        // valid frame.  The corrupt frame must be discarded, not emitted.
        let mut stream = Vec::new();
        stream.extend_from_slice(&SENTINEL); // initial alignment
        stream.extend_from_slice(b"badfram1XX"); // 8 payload bytes + wrong terminator
        stream.extend_from_slice(&SENTINEL); // resync point
        stream.extend_from_slice(&wire_frame(b"goodfrm1"));
        let mut cursor = Cursor::new(stream);

        let mut sync = FrameSynchronizer::new(FRAME_LEN);
        assert_eq!(sync.next_frame(&mut cursor).unwrap(), b"goodfrm1");
    }

    #[test]
    fn test_payload_containing_sentinel_bytes_is_delivered_intact() {
        // While synced, reads are fixed-size blocks, so a sentinel inside the
        // payload must not split the frame.
        let payload = b"ab\r\ncdef";
        let mut stream = Vec::new();
        stream.extend_from_slice(&SENTINEL);
        stream.extend_from_slice(&wire_frame(payload));
        let mut cursor = Cursor::new(stream);

        let mut sync = FrameSynchronizer::new(FRAME_LEN);
        assert_eq!(sync.next_frame(&mut cursor).unwrap(), payload);
    }

    #[test]
    fn test_eof_during_resync_returns_closed() {
        let mut cursor = Cursor::new(b"no sentinel here".to_vec());
        let mut sync = FrameSynchronizer::new(FRAME_LEN);
        assert!(matches!(
            sync.next_frame(&mut cursor),
            Err(FramingError::Closed)
        ));
    }

    #[test]
    fn test_eof_mid_frame_returns_closed_and_resyncs() {
        let mut stream = Vec::new();
        stream.extend_from_slice(&SENTINEL);
        stream.extend_from_slice(b"abc"); // partial frame, then EOF
        let mut cursor = Cursor::new(stream);

        let mut sync = FrameSynchronizer::new(FRAME_LEN);
        assert!(matches!(
            sync.next_frame(&mut cursor),
            Err(FramingError::Closed)
        ));
        assert_eq!(sync.state(), SyncState::Resyncing);
    }

    #[test]
    fn test_read_error_resyncs_and_surfaces_io_error() {
        /// Source that yields one aligned-but-incomplete frame, then fails.
        struct FailingSource {
            fed: Vec<u8>,
            pos: usize,
        }
        impl ByteSource for FailingSource {
            fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if self.pos < self.fed.len() {
                    buf[0] = self.fed[self.pos];
                    self.pos += 1;
                    Ok(1)
                } else {
                    Err(io::Error::new(io::ErrorKind::Other, "line glitch"))
                }
            }
        }

        let mut fed = SENTINEL.to_vec();
        fed.extend_from_slice(b"abcd"); // half a frame before the fault
        let mut source = FailingSource { fed, pos: 0 };

        let mut sync = FrameSynchronizer::new(FRAME_LEN);
        assert!(matches!(
            sync.next_frame(&mut source),
            Err(FramingError::Io(_))
        ));
        assert_eq!(sync.state(), SyncState::Resyncing);
    }

    #[test]
    fn test_sentinel_split_across_reads_is_still_found() {
        /// Source that returns one byte per call, forcing the scan window to
        /// assemble the sentinel across two reads.
        struct OneByteSource {
            data: Vec<u8>,
            pos: usize,
        }
        impl ByteSource for OneByteSource {
            fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if self.pos >= self.data.len() {
                    return Ok(0);
                }
                buf[0] = self.data[self.pos];
                self.pos += 1;
                Ok(1)
            }
        }

        let mut data = b"xx\r".to_vec();
        data.push(b'\n');
        data.extend_from_slice(&wire_frame(b"frame-ok"));
        let mut source = OneByteSource { data, pos: 0 };

        let mut sync = FrameSynchronizer::new(FRAME_LEN);
        assert_eq!(sync.next_frame(&mut source).unwrap(), b"frame-ok");
    }

    #[test]
    fn test_consecutive_corruption_loses_at_most_the_corrupt_span() {
        // frame1 ok, frame2's sentinel clobbered, frame3 ok.  frame2 is lost
        // (and frame3's body is consumed by the rescan), but alignment must
        // recover by frame4 at the latest.
        let mut stream = Vec::new();
        stream.extend_from_slice(&SENTINEL);
        stream.extend_from_slice(&wire_frame(b"frame-01"));
        stream.extend_from_slice(b"frame-02??"); // corrupt terminator
        stream.extend_from_slice(&wire_frame(b"frame-03"));
        stream.extend_from_slice(&wire_frame(b"frame-04"));
        let mut cursor = Cursor::new(stream);

        let mut sync = FrameSynchronizer::new(FRAME_LEN);
        let mut got = Vec::new();
        loop {
            match sync.next_frame(&mut cursor) {
                Ok(frame) => got.push(frame),
                Err(FramingError::Closed) => break,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(got.first().unwrap(), b"frame-01");
        assert_eq!(got.last().unwrap(), b"frame-04");
        assert!(!got.contains(&b"frame-02".to_vec()));
    }
}
