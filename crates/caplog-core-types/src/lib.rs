//! Core types shared across caplog crates
//!
//! This crate provides the leaf types used by the log facility and the
//! capture service:
//!
//! - **Levels**: `Level` ordered by severity, `compare_levels`
//! - **Identifiers**: `CaptureToken`, `OwnerId`, `HandlerId`
//! - **Events**: `LogEvent`
//! - **Schema constants**: Canonical field keys and the internal target

pub mod event;
pub mod ids;
pub mod level;
pub mod schema;

pub use event::LogEvent;
pub use ids::{CaptureToken, HandlerId, OwnerId};
pub use level::{compare_levels, Level, ParseLevelError};
