//! Identifiers for captures, owners and handler slots
//!
//! Capture tokens are UUIDv7 strings and are never reused. Owner ids come
//! from a process-wide counter.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Registration handle returned to the caller of a capture
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CaptureToken(String);

impl CaptureToken {
    /// Generate a fresh token using UUIDv7
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CaptureToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CaptureToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

static OWNER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identity of a task or thread that owns one or more captures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnerId(u64);

impl OwnerId {
    /// Allocate the next owner id
    pub fn next() -> Self {
        Self(OWNER_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "owner-{}", self.0)
    }
}

/// Name of a handler slot in the log facility
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandlerId(String);

impl HandlerId {
    /// Slot holding the process-wide default handler
    pub const DEFAULT: &'static str = "default";
    /// Slot the capture service installs itself into
    pub const CAPTURE: &'static str = "capture";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn default_handler() -> Self {
        Self::new(Self::DEFAULT)
    }

    pub fn capture_handler() -> Self {
        Self::new(Self::CAPTURE)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HandlerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
