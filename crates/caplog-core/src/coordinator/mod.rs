//! Capture coordination service
//!
//! Uses the actor pattern: a single task owns the registration set and the
//! facility intercept, and [`CaptureService`] handles talk to it over a
//! bounded mailbox.

mod actor;
mod commands;
mod handle;
mod handler;
mod intercept;
mod registration;

pub use handle::CaptureService;
pub use intercept::InterceptStats;
pub use registration::Registration;
