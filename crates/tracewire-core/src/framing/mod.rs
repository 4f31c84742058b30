//! Frame recovery for the raw telemetry byte stream.
//!
//! The embedded target writes `frame_len` bytes of record payload followed by
//! a two-byte sentinel, over and over.  Nothing about the transport guarantees
//! that the first byte we read is the first byte of a frame: the process may
//! attach mid-stream, the line may glitch, a UDP datagram may vanish.  This
//! module turns that unreliable byte stream back into a sequence of aligned
//! frames.

pub mod synchronizer;

// Re-export the primary types so callers can write `framing::FrameSynchronizer`.
pub use synchronizer::{
    ByteSource, FrameSynchronizer, FramingError, SyncState, SENTINEL, SENTINEL_LEN,
};
