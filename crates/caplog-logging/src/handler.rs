//! Log handlers and their slot configuration

use crate::formatter::FormatterIdentity;
use caplog_core_types::schema::INTERNAL_TARGET;
use caplog_core_types::{HandlerId, Level, LogEvent};
use std::fmt;
use std::sync::Arc;

/// Receives every event the facility emits while installed
pub trait LogHandler: Send + Sync {
    fn handle(&self, event: &LogEvent);
}

impl<F> LogHandler for F
where
    F: Fn(&LogEvent) + Send + Sync,
{
    fn handle(&self, event: &LogEvent) {
        self(event)
    }
}

/// A handler together with the slot it occupies and its configuration
#[derive(Clone)]
pub struct HandlerConfig {
    pub id: HandlerId,
    pub handler: Arc<dyn LogHandler>,
    /// Formatter this handler renders with; the `default` slot's formatter
    /// is the process-wide default for captures
    pub formatter: Option<FormatterIdentity>,
    /// Minimum level forwarded to the handler
    pub level: Option<Level>,
}

impl HandlerConfig {
    pub fn new(id: HandlerId, handler: Arc<dyn LogHandler>) -> Self {
        Self {
            id,
            handler,
            formatter: None,
            level: None,
        }
    }

    pub fn with_formatter(mut self, formatter: FormatterIdentity) -> Self {
        self.formatter = Some(formatter);
        self
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Whether two configs hold the same handler instance and settings
    pub fn same_as(&self, other: &HandlerConfig) -> bool {
        self.id == other.id
            && Arc::ptr_eq(&self.handler, &other.handler)
            && self.formatter == other.formatter
            && self.level == other.level
    }
}

impl fmt::Debug for HandlerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerConfig")
            .field("id", &self.id)
            .field("formatter", &self.formatter)
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

/// Default handler: renders to stderr
#[derive(Debug, Clone)]
pub struct ConsoleHandler {
    formatter: FormatterIdentity,
}

impl ConsoleHandler {
    pub fn new(formatter: FormatterIdentity) -> Self {
        Self { formatter }
    }

    pub fn formatter(&self) -> &FormatterIdentity {
        &self.formatter
    }
}

impl LogHandler for ConsoleHandler {
    fn handle(&self, event: &LogEvent) {
        match self.formatter.render(event) {
            Ok(text) => eprint!("{}", text),
            Err(e) => tracing::warn!(
                target: INTERNAL_TARGET,
                formatter = self.formatter.name(),
                error = %e,
                "Console handler failed to render event"
            ),
        }
    }
}
