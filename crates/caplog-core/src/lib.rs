//! caplog core - Scoped capture of log output
//!
//! This crate provides:
//! - `CaptureService`: the actor that owns active captures and swaps the
//!   facility's default handler out while any capture is active
//! - `capture` / `with_capture` and their blocking forms
//! - Per-event fan-out that renders once per distinct formatter
//! - Owner liveness monitoring, so abandoned captures are cleaned up
//! - A process-wide service for test suites (`global`, `start_global`)

pub mod capture;
pub mod config;
pub mod coordinator;
pub mod dispatch;
pub mod errors;
pub mod global;
pub mod monitor;
pub mod sink;

// Re-export commonly used types
pub use capture::CaptureOptions;
pub use config::{FormatterSettings, ServiceConfig};
pub use coordinator::{CaptureService, InterceptStats, Registration};
pub use dispatch::{dispatch, DispatchReport, RenderFailure};
pub use errors::{CaptureError, ErrorKind, Result};
pub use global::{
    capture, capture_blocking, global, start_global, with_capture, with_capture_blocking,
};
pub use monitor::{Liveness, Owner};
pub use sink::Sink;

pub use caplog_core_types::{CaptureToken, Level, LogEvent, OwnerId};
pub use caplog_logging::{FormatterConfig, FormatterIdentity, FormatterSpec, LogFacility};
