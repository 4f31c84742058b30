//! Binary trace-record protocol: typed record variants and the frame decoder.

pub mod codec;
pub mod records;

// Re-export the primary entry points at the module boundary.
pub use codec::{decode_frame, DecodeError};
pub use records::{EnterEvent, ExitEvent, PanicEvent, TraceEvent, TraceHeader, TraceKind};
