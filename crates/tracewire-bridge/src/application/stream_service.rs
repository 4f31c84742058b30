//! Translates decoded trace records into the subscriber message schema.

use tracewire_core::protocol::TraceEvent;

use crate::domain::messages::EventMessage;

/// Converts a decoded record into its subscriber-facing message.
pub fn translate_event(event: &TraceEvent) -> EventMessage {
    match event {
        TraceEvent::Enter(e) => EventMessage::Enter {
            core_id: e.header.core_id,
            timestamp: e.header.timestamp,
            trace_id: e.header.trace_id,
            value_types: e.value_types,
            arg_count: e.arg_count,
            args: e.args,
            func_name: e.func_name.clone(),
        },
        TraceEvent::Exit(e) => EventMessage::Exit {
            core_id: e.header.core_id,
            timestamp: e.header.timestamp,
            trace_id: e.header.trace_id,
            value_types: e.value_types,
            return_value: e.return_value,
            func_name: e.func_name.clone(),
        },
        TraceEvent::Panic(e) => EventMessage::Panic {
            core_id: e.header.core_id,
            timestamp: e.header.timestamp,
            trace_id: e.header.trace_id,
            faulting_pc: e.faulting_pc,
            exception_reason: e.exception_reason.clone(),
        },
    }
}

/// Serializes a decoded record to the JSON text delivered to subscribers.
pub fn serialize_event(event: &TraceEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(&translate_event(event))
}

/// Short record-kind name for log lines.
pub fn event_kind_name(event: &TraceEvent) -> &'static str {
    match event {
        TraceEvent::Enter(_) => "enter",
        TraceEvent::Exit(_) => "exit",
        TraceEvent::Panic(_) => "panic",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tracewire_core::protocol::records::{
        EnterEvent, ExitEvent, PanicEvent, TraceHeader,
    };

    fn header() -> TraceHeader {
        TraceHeader {
            core_id: 1,
            timestamp: 4242,
            trace_id: 17,
        }
    }

    #[test]
    fn test_enter_record_translates_field_for_field() {
        let event = TraceEvent::Enter(EnterEvent {
            header: header(),
            value_types: 0x03,
            arg_count: 2,
            args: [5, 6, 0, 0],
            func_name: "uart_init".to_string(),
        });

        let json: serde_json::Value =
            serde_json::from_str(&serialize_event(&event).unwrap()).unwrap();
        assert_eq!(json["kind"], "enter");
        assert_eq!(json["core_id"], 1);
        assert_eq!(json["timestamp"], 4242);
        assert_eq!(json["trace_id"], 17);
        assert_eq!(json["arg_count"], 2);
        assert_eq!(json["args"], serde_json::json!([5, 6, 0, 0]));
        assert_eq!(json["func_name"], "uart_init");
    }

    #[test]
    fn test_exit_record_carries_return_value() {
        let event = TraceEvent::Exit(ExitEvent {
            header: header(),
            value_types: 0x01,
            return_value: 0xCAFE_F00D,
            func_name: "uart_init".to_string(),
        });

        let json: serde_json::Value =
            serde_json::from_str(&serialize_event(&event).unwrap()).unwrap();
        assert_eq!(json["kind"], "exit");
        assert_eq!(json["return_value"], 0xCAFE_F00Du32);
        // Exit messages have no argument fields.
        assert!(json.get("args").is_none());
    }

    #[test]
    fn test_panic_record_translates_fault_details() {
        let event = TraceEvent::Panic(PanicEvent {
            header: header(),
            faulting_pc: 0x0800_0042,
            exception_reason: "usage fault".to_string(),
        });

        let json: serde_json::Value =
            serde_json::from_str(&serialize_event(&event).unwrap()).unwrap();
        assert_eq!(json["kind"], "panic");
        assert_eq!(json["faulting_pc"], 0x0800_0042);
        assert_eq!(json["exception_reason"], "usage fault");
    }

    #[test]
    fn test_kind_names_for_logging() {
        let event = TraceEvent::Panic(PanicEvent {
            header: header(),
            faulting_pc: 0,
            exception_reason: String::new(),
        });
        assert_eq!(event_kind_name(&event), "panic");
    }
}
