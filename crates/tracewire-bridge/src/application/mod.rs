//! Application layer: translation from decoded records to subscriber
//! messages.

pub mod stream_service;

pub use stream_service::{event_kind_name, serialize_event, translate_event};
