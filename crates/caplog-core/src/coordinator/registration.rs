use crate::sink::Sink;
use caplog_core_types::{CaptureToken, Level, OwnerId};
use caplog_logging::FormatterIdentity;

/// The service's record of one active capture
#[derive(Debug, Clone)]
pub struct Registration {
    pub token: CaptureToken,
    pub owner: OwnerId,
    pub sink: Sink,
    pub min_level: Option<Level>,
    pub formatter: FormatterIdentity,
}

impl Registration {
    /// Whether an event at `level` passes this capture's filter
    pub fn admits(&self, level: Level) -> bool {
        level.admitted_by(self.min_level)
    }
}
