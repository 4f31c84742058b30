//! Frame decoder: fixed-layout binary records → typed [`TraceEvent`]s.
//!
//! Decoding is explicit field-by-field deserialization: each field is read
//! from its documented byte offset and multi-byte integers are composed from
//! little-endian byte order.  Nothing here depends on the host's endianness
//! or struct layout rules.
//!
//! A frame may be longer than the record layout it carries (firmware pads
//! every frame to a fixed length, and one protocol version padded to 72
//! bytes).  Trailing bytes beyond the record layout are ignored.  A frame
//! *shorter* than the selected layout is malformed and rejected.

use crate::protocol::records::{
    EnterEvent, ExitEvent, PanicEvent, TraceEvent, TraceHeader, TraceKind, ENTER_RECORD_LEN,
    EXCEPTION_REASON_LEN, EXIT_RECORD_LEN, FUNC_NAME_LEN, MAX_ARG_SLOTS, PANIC_RECORD_LEN,
};
use thiserror::Error;

/// Errors that can occur while decoding a frame.
///
/// Both variants are record-level failures: the caller reports them, drops
/// the frame, and continues with the next one.  They never abort the stream.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The leading type tag does not name a known record variant.
    #[error("unrecognized record type tag: {0}")]
    UnknownTag(u32),

    /// The frame is shorter than the selected record layout requires.
    #[error("truncated {variant} record: need {needed} bytes, got {available}")]
    Truncated {
        variant: &'static str,
        needed: usize,
        available: usize,
    },
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Decodes one frame into a typed [`TraceEvent`].
///
/// The first 4 bytes are interpreted as a little-endian u32 type tag
/// selecting the variant; the remaining bytes are parsed per the layout in
/// [`crate::protocol::records`].
///
/// # Errors
///
/// - [`DecodeError::UnknownTag`] if the tag names no known variant.
/// - [`DecodeError::Truncated`] if the frame is shorter than the variant's
///   layout (trailing padding beyond the layout is fine and ignored).
///
/// # Examples
///
/// ```rust
/// use tracewire_core::protocol::{decode_frame, TraceKind};
///
/// let mut frame = vec![0u8; 68];
/// frame[0..4].copy_from_slice(&2u32.to_le_bytes()); // tag 2 = panic
/// let event = decode_frame(&frame).unwrap();
/// assert_eq!(event.kind(), TraceKind::Panic);
/// ```
pub fn decode_frame(frame: &[u8]) -> Result<TraceEvent, DecodeError> {
    if frame.len() < 4 {
        return Err(DecodeError::Truncated {
            variant: "header",
            needed: 4,
            available: frame.len(),
        });
    }

    let tag = u32::from_le_bytes([frame[0], frame[1], frame[2], frame[3]]);
    let kind = TraceKind::try_from(tag).map_err(|()| DecodeError::UnknownTag(tag))?;

    match kind {
        TraceKind::Enter => decode_enter(frame).map(TraceEvent::Enter),
        TraceKind::Exit => decode_exit(frame).map(TraceEvent::Exit),
        TraceKind::Panic => decode_panic(frame).map(TraceEvent::Panic),
    }
}

// ── Per-variant decode helpers ────────────────────────────────────────────────

fn decode_header(frame: &[u8]) -> TraceHeader {
    // Caller has already verified the frame covers the full record layout,
    // which always includes the 16-byte header.
    TraceHeader {
        core_id: frame[4],
        // frame[5..8] is alignment padding – ignored on decode
        timestamp: read_u32_le(frame, 8),
        trace_id: read_u32_le(frame, 12),
    }
}

fn decode_enter(frame: &[u8]) -> Result<EnterEvent, DecodeError> {
    require_len(frame, ENTER_RECORD_LEN, "enter")?;
    let header = decode_header(frame);
    let value_types = frame[16];
    let arg_count = frame[17];
    // frame[18..20] is alignment padding
    let mut args = [0u32; MAX_ARG_SLOTS];
    for (slot, arg) in args.iter_mut().enumerate() {
        *arg = read_u32_le(frame, 20 + slot * 4);
    }
    let func_name = read_padded_text(&frame[36..36 + FUNC_NAME_LEN]);
    Ok(EnterEvent {
        header,
        value_types,
        arg_count,
        args,
        func_name,
    })
}

fn decode_exit(frame: &[u8]) -> Result<ExitEvent, DecodeError> {
    require_len(frame, EXIT_RECORD_LEN, "exit")?;
    let header = decode_header(frame);
    let value_types = frame[16];
    // frame[17..20] is alignment padding
    let return_value = read_u32_le(frame, 20);
    // frame[24..36] is reserved padding (three u32 slots)
    let func_name = read_padded_text(&frame[36..36 + FUNC_NAME_LEN]);
    Ok(ExitEvent {
        header,
        value_types,
        return_value,
        func_name,
    })
}

fn decode_panic(frame: &[u8]) -> Result<PanicEvent, DecodeError> {
    require_len(frame, PANIC_RECORD_LEN, "panic")?;
    let header = decode_header(frame);
    let faulting_pc = read_u32_le(frame, 16);
    let exception_reason = read_padded_text(&frame[20..20 + EXCEPTION_REASON_LEN]);
    Ok(PanicEvent {
        header,
        faulting_pc,
        exception_reason,
    })
}

// ── Utility helpers ───────────────────────────────────────────────────────────

fn require_len(frame: &[u8], needed: usize, variant: &'static str) -> Result<(), DecodeError> {
    if frame.len() < needed {
        Err(DecodeError::Truncated {
            variant,
            needed,
            available: frame.len(),
        })
    } else {
        Ok(())
    }
}

fn read_u32_le(frame: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        frame[offset],
        frame[offset + 1],
        frame[offset + 2],
        frame[offset + 3],
    ])
}

/// Decodes a fixed-width, null-padded text field: bytes up to the first NUL,
/// lossily interpreted as UTF-8.
fn read_padded_text(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
