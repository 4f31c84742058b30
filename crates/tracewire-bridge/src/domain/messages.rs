//! JSON message schema delivered to WebSocket subscribers.
//!
//! Each decoded trace record becomes one JSON object tagged by its `kind`
//! field, so a browser client can dispatch on it without inspecting the
//! payload shape.

use serde::{Deserialize, Serialize};
use tracewire_core::protocol::records::MAX_ARG_SLOTS;

/// One trace record as seen by subscribers.
///
/// Serializes as externally visible JSON with a `kind` discriminator:
///
/// ```json
/// {"kind":"enter","core_id":0,"timestamp":12,"trace_id":7,...}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventMessage {
    /// Function entry.
    Enter {
        core_id: u8,
        timestamp: u32,
        trace_id: u32,
        value_types: u8,
        arg_count: u8,
        args: [u32; MAX_ARG_SLOTS],
        func_name: String,
    },
    /// Function return.
    Exit {
        core_id: u8,
        timestamp: u32,
        trace_id: u32,
        value_types: u8,
        return_value: u32,
        func_name: String,
    },
    /// Unrecoverable fault on the target.
    Panic {
        core_id: u8,
        timestamp: u32,
        trace_id: u32,
        faulting_pc: u32,
        exception_reason: String,
    },
}

// ── Tests ─────────────────────────────────────────────────────────────────────
