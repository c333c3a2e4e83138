use super::registration::Registration;
use crate::dispatch::{dispatch, DispatchReport};
use caplog_core_types::schema::INTERNAL_TARGET;
use caplog_core_types::LogEvent;
use caplog_logging::LogHandler;
use std::sync::Arc;
use tokio::sync::watch;

/// The handler the service installs into the facility's `capture` slot
///
/// Reads the latest registration snapshot published by the actor and fans
/// the event out. Never goes through the actor's mailbox, so concurrent
/// emitters do not queue behind registration traffic.
pub(crate) struct CaptureHandler {
    snapshot: watch::Receiver<Arc<[Registration]>>,
}

impl CaptureHandler {
    pub(crate) fn new(snapshot: watch::Receiver<Arc<[Registration]>>) -> Self {
        Self { snapshot }
    }

    /// Blocks until every admitting sink has received the rendered text
    pub(crate) fn handle_event(&self, event: &LogEvent) -> DispatchReport {
        let registrations = Arc::clone(&*self.snapshot.borrow());
        let report = dispatch(event, &registrations);
        for failure in &report.failures {
            tracing::warn!(
                target: INTERNAL_TARGET,
                formatter = %failure.formatter,
                sinks = failure.sinks,
                error = %failure.error,
                "Formatter failed; event not delivered to its captures"
            );
        }
        report
    }
}

impl LogHandler for CaptureHandler {
    fn handle(&self, event: &LogEvent) {
        self.handle_event(event);
    }
}
