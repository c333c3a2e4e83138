//! Canonical schema constants for rendered and bridged events
//!
//! These constants keep formatters, the tracing bridge and parsers in agreement.

// Canonical field keys
pub const FIELD_LEVEL: &str = "level";
pub const FIELD_TARGET: &str = "target";
pub const FIELD_MESSAGE: &str = "message";
pub const FIELD_MSG: &str = "msg";
pub const FIELD_TIME: &str = "time";
pub const FIELD_FIELDS: &str = "fields";

/// Target used for the crate's own diagnostics; never bridged into captures
pub const INTERNAL_TARGET: &str = "caplog::internal";
