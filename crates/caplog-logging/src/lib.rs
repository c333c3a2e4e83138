//! Ambient log facility and formatter contract for caplog
//!
//! This crate provides:
//! - `LogFacility`: named handler slots, synchronous `emit`
//! - `LogHandler` / `HandlerConfig` and the stderr `ConsoleHandler`
//! - `FacilityLayer`: a `tracing_subscriber` layer bridging `tracing` events
//! - Formatters (`text`, `kv`, `json`) behind the `Render` trait
//! - Single initialization point via `init(profile, facility)`

pub mod errors;
pub mod facility;
pub mod formatter;
pub mod handler;
pub mod init;
pub mod layer;

pub use errors::FormatError;
pub use facility::LogFacility;
pub use formatter::{
    FormatterConfig, FormatterIdentity, FormatterRegistry, FormatterSpec, JsonFormatter,
    KeyValueFormatter, Render, TextFormatter,
};
pub use handler::{ConsoleHandler, HandlerConfig, LogHandler};
pub use init::{init, Profile};
pub use layer::FacilityLayer;
