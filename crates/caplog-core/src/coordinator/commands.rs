//! Internal command protocol for the capture service actor.
//!
//! These types are NOT exposed outside the coordinator module; callers go
//! through `CaptureService`.

use super::intercept::InterceptStats;
use crate::capture::CaptureOptions;
use crate::errors::Result;
use crate::monitor::Liveness;
use crate::sink::Sink;
use caplog_core_types::CaptureToken;
use tokio::sync::oneshot;

pub(super) enum ServiceCommand {
    /// Add a registration for the owner behind `liveness`
    Register {
        liveness: Liveness,
        sink: Sink,
        options: CaptureOptions,
        resp: oneshot::Sender<Result<CaptureToken>>,
    },
    /// Remove a registration; unknown tokens are ignored
    Deregister {
        token: CaptureToken,
        resp: oneshot::Sender<()>,
    },
    /// Snapshot of the intercept counters
    Stats { resp: oneshot::Sender<InterceptStats> },
}

impl ServiceCommand {
    pub(super) fn name(&self) -> &'static str {
        match self {
            ServiceCommand::Register { .. } => "register",
            ServiceCommand::Deregister { .. } => "deregister",
            ServiceCommand::Stats { .. } => "stats",
        }
    }
}
