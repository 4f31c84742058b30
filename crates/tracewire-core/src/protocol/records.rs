//! Typed trace-record variants and their wire-layout constants.
//!
//! The embedded target emits three record variants, selected by a leading
//! 32-bit little-endian type tag.  The byte layout is an explicit schema
//! (field name, byte offset, width) shared with the firmware — it is never
//! derived from a host language's struct alignment rules.  Offsets below are
//! relative to the start of the frame.
//!
//! Common header (all variants, 16 bytes):
//!
//! | field     | offset | width |
//! |-----------|--------|-------|
//! | type tag  | 0      | 4 (u32 LE) |
//! | core_id   | 4      | 1     |
//! | (padding) | 5      | 3     |
//! | timestamp | 8      | 4 (u32 LE) |
//! | trace_id  | 12     | 4 (u32 LE) |

// ── Wire-layout constants ─────────────────────────────────────────────────────

/// Size of the common record header in bytes.
pub const HEADER_LEN: usize = 16;

/// Width of the fixed, null-padded function-name text field.
pub const FUNC_NAME_LEN: usize = 16;

/// Width of the fixed, null-padded exception-reason text field.
pub const EXCEPTION_REASON_LEN: usize = 48;

/// Number of argument slots in an enter record.
pub const MAX_ARG_SLOTS: usize = 4;

/// Total bytes of an enter record: header + value_types(1) + arg_count(1) +
/// padding(2) + 4 argument slots(16) + function name(16).
pub const ENTER_RECORD_LEN: usize = 52;

/// Total bytes of an exit record: header + value_types(1) + padding(3) +
/// return value(4) + reserved padding(12) + function name(16).
pub const EXIT_RECORD_LEN: usize = 52;

/// Total bytes of a panic record: header + faulting PC(4) + reason text(48).
pub const PANIC_RECORD_LEN: usize = 68;

/// Frame length used by the current protocol version.  Older firmware padded
/// frames to 72 bytes; both lengths satisfy every record layout above.
pub const DEFAULT_FRAME_LEN: usize = 68;

// ── Record type tags ──────────────────────────────────────────────────────────

/// The three record variants, as encoded in the leading type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TraceKind {
    /// Function entry.
    Enter = 0,
    /// Function return.
    Exit = 1,
    /// Unrecoverable fault on the target.
    Panic = 2,
}

impl TryFrom<u32> for TraceKind {
    type Error = ();

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TraceKind::Enter),
            1 => Ok(TraceKind::Exit),
            2 => Ok(TraceKind::Panic),
            _ => Err(()),
        }
    }
}

// ── Decoded record types ──────────────────────────────────────────────────────

/// Common prefix of every decoded record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceHeader {
    /// CPU core the record was captured on.
    pub core_id: u8,
    /// Target-local timestamp (firmware tick units).
    pub timestamp: u32,
    /// Identifier correlating enter/exit pairs of one traced call.
    pub trace_id: u32,
}

/// Function-entry record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnterEvent {
    pub header: TraceHeader,
    /// Bitmask describing how the argument slots should be interpreted.
    pub value_types: u8,
    /// Number of argument slots that carry meaningful values (0–4).
    pub arg_count: u8,
    /// Raw argument slots; entries beyond `arg_count` are firmware scratch.
    pub args: [u32; MAX_ARG_SLOTS],
    /// Traced function's name, trimmed of null padding.
    pub func_name: String,
}

/// Function-exit record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitEvent {
    pub header: TraceHeader,
    /// Bitmask describing how the return value should be interpreted.
    pub value_types: u8,
    /// Raw return value slot.
    pub return_value: u32,
    /// Traced function's name, trimmed of null padding.
    pub func_name: String,
}

/// Panic record emitted when the target faults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanicEvent {
    pub header: TraceHeader,
    /// Program counter at the faulting instruction.
    pub faulting_pc: u32,
    /// Human-readable fault description, trimmed of null padding.
    pub exception_reason: String,
}

/// One decoded trace record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    Enter(EnterEvent),
    Exit(ExitEvent),
    Panic(PanicEvent),
}

impl TraceEvent {
    /// Returns the record kind of this event.
    pub fn kind(&self) -> TraceKind {
        match self {
            TraceEvent::Enter(_) => TraceKind::Enter,
            TraceEvent::Exit(_) => TraceKind::Exit,
            TraceEvent::Panic(_) => TraceKind::Panic,
        }
    }

    /// Returns the common header shared by every variant.
    pub fn header(&self) -> &TraceHeader {
        match self {
            TraceEvent::Enter(e) => &e.header,
            TraceEvent::Exit(e) => &e.header,
            TraceEvent::Panic(e) => &e.header,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_kind_try_from_known_tags() {
        assert_eq!(TraceKind::try_from(0), Ok(TraceKind::Enter));
        assert_eq!(TraceKind::try_from(1), Ok(TraceKind::Exit));
        assert_eq!(TraceKind::try_from(2), Ok(TraceKind::Panic));
    }

    #[test]
    fn test_trace_kind_try_from_unknown_tag_fails() {
        assert!(TraceKind::try_from(3).is_err());
        assert!(TraceKind::try_from(u32::MAX).is_err());
    }

    #[test]
    fn test_record_lengths_fit_inside_default_frame() {
        assert!(ENTER_RECORD_LEN <= DEFAULT_FRAME_LEN);
        assert!(EXIT_RECORD_LEN <= DEFAULT_FRAME_LEN);
        assert!(PANIC_RECORD_LEN <= DEFAULT_FRAME_LEN);
    }

    #[test]
    fn test_event_kind_matches_variant() {
        let header = TraceHeader {
            core_id: 0,
            timestamp: 0,
            trace_id: 0,
        };
        let event = TraceEvent::Panic(PanicEvent {
            header,
            faulting_pc: 0xDEAD_BEEF,
            exception_reason: "bus fault".to_string(),
        });
        assert_eq!(event.kind(), TraceKind::Panic);
    }
}
