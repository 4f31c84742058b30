//! # tracewire-core
//!
//! Shared library for tracewire containing the wire-frame synchronizer and the
//! binary trace-record codec.
//!
//! This crate is used by the bridge daemon and by any future offline tooling.
//! It has zero dependencies on sockets, serial drivers, or async runtimes —
//! the only I/O seam is the [`framing::ByteSource`] trait, which any blocking
//! byte producer (a serial port, a UDP datagram buffer, an in-memory cursor)
//! can satisfy.
//!
//! # Architecture overview
//!
//! An embedded target emits fixed-size trace records over an unreliable byte
//! transport.  Each record is terminated by a two-byte sentinel (`\r\n`).
//! This crate defines the two protocol-level stages of the ingestion pipeline:
//!
//! - **`framing`** – Recovers frame alignment from a raw byte stream.  The
//!   [`framing::FrameSynchronizer`] scans for the sentinel after any
//!   corruption and then emits exact `frame_len`-byte frames.
//!
//! - **`protocol`** – Decodes a frame into one of three typed record variants
//!   (function enter, function exit, panic) based on a leading type tag,
//!   using an explicit byte-offset schema rather than host struct layout.

// Declare the two top-level modules.  Rust will look for each in a
// subdirectory with the same name (e.g., src/protocol/mod.rs).
pub mod framing;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `tracewire_core::FrameSynchronizer` instead of the longer module path.
pub use framing::{ByteSource, FrameSynchronizer, FramingError, SyncState, SENTINEL};
pub use protocol::codec::{decode_frame, DecodeError};
pub use protocol::records::{EnterEvent, ExitEvent, PanicEvent, TraceEvent, TraceHeader, TraceKind};
