//! Domain layer: configuration and the subscriber-facing message schema.

pub mod config;
pub mod messages;
