//! The ambient log facility
//!
//! A table of named handler slots. `emit` hands each event to every
//! installed handler synchronously. The table lock is never held while a
//! handler runs, so a handler may itself change the table.

use crate::formatter::{FormatterConfig, FormatterIdentity};
use crate::handler::{ConsoleHandler, HandlerConfig};
use crate::layer::FacilityLayer;
use caplog_core_types::{HandlerId, LogEvent};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Default)]
pub struct LogFacility {
    handlers: RwLock<BTreeMap<HandlerId, HandlerConfig>>,
    service_claimed: AtomicBool,
}

impl LogFacility {
    /// A facility with no handlers installed
    pub fn new() -> Self {
        Self::default()
    }

    /// A facility whose `default` slot writes to stderr with the text formatter
    pub fn with_console() -> Self {
        let formatter = FormatterIdentity::text(FormatterConfig::new());
        let facility = Self::new();
        facility.set_handler(
            HandlerConfig::new(
                HandlerId::default_handler(),
                Arc::new(ConsoleHandler::new(formatter.clone())),
            )
            .with_formatter(formatter),
        );
        facility
    }

    /// Current configuration of a slot
    pub fn handler(&self, id: &HandlerId) -> Option<HandlerConfig> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn handler_ids(&self) -> Vec<HandlerId> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Install a handler into its slot, returning whatever it replaced
    pub fn set_handler(&self, config: HandlerConfig) -> Option<HandlerConfig> {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(config.id.clone(), config)
    }

    pub fn remove_handler(&self, id: &HandlerId) -> Option<HandlerConfig> {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    /// Formatter configured on the `default` slot
    pub fn default_formatter(&self) -> Option<FormatterIdentity> {
        self.handler(&HandlerId::default_handler())
            .and_then(|config| config.formatter)
    }

    /// Deliver an event to every installed handler whose level admits it
    pub fn emit(&self, event: &LogEvent) {
        let handlers: Vec<HandlerConfig> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        for config in handlers {
            if event.level.admitted_by(config.level) {
                config.handler.handle(event);
            }
        }
    }

    /// Reserve the facility for a capture service; `false` if already taken
    pub fn claim_service(&self) -> bool {
        self.service_claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn release_service(&self) {
        self.service_claimed.store(false, Ordering::Release);
    }

    /// A `tracing` layer that forwards events into this facility
    pub fn layer(self: &Arc<Self>) -> FacilityLayer {
        FacilityLayer::new(Arc::clone(self))
    }
}

impl std::fmt::Debug for LogFacility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogFacility")
            .field("handlers", &self.handler_ids())
            .field("service_claimed", &self.service_claimed.load(Ordering::Acquire))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caplog_core_types::Level;
    use std::sync::Mutex;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, Arc<dyn crate::LogHandler>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handler = move |event: &LogEvent| sink.lock().unwrap().push(event.message.clone());
        (seen, Arc::new(handler))
    }

    #[test]
    fn test_emit_reaches_every_handler() {
        let facility = LogFacility::new();
        let (a_seen, a) = recorder();
        let (b_seen, b) = recorder();
        facility.set_handler(HandlerConfig::new(HandlerId::new("a"), a));
        facility.set_handler(HandlerConfig::new(HandlerId::new("b"), b));

        facility.emit(&LogEvent::new(Level::Info, "t", "hello"));

        assert_eq!(*a_seen.lock().unwrap(), vec!["hello"]);
        assert_eq!(*b_seen.lock().unwrap(), vec!["hello"]);
    }

    #[test]
    fn test_handler_level_filter() {
        let facility = LogFacility::new();
        let (seen, handler) = recorder();
        facility.set_handler(
            HandlerConfig::new(HandlerId::new("w"), handler).with_level(Level::Warn),
        );

        facility.emit(&LogEvent::new(Level::Info, "t", "quiet"));
        facility.emit(&LogEvent::new(Level::Error, "t", "loud"));

        assert_eq!(*seen.lock().unwrap(), vec!["loud"]);
    }

    #[test]
    fn test_remove_returns_previous_config() {
        let facility = LogFacility::with_console();
        let before = facility.handler(&HandlerId::default_handler()).unwrap();

        let removed = facility.remove_handler(&HandlerId::default_handler()).unwrap();
        assert!(removed.same_as(&before));
        assert!(facility.handler(&HandlerId::default_handler()).is_none());
        assert!(facility.remove_handler(&HandlerId::default_handler()).is_none());
    }

    #[test]
    fn test_default_formatter_comes_from_default_slot() {
        let facility = LogFacility::with_console();
        assert_eq!(facility.default_formatter().unwrap().name(), "text");
        assert!(LogFacility::new().default_formatter().is_none());
    }

    #[test]
    fn test_service_claim_is_exclusive() {
        let facility = LogFacility::new();
        assert!(facility.claim_service());
        assert!(!facility.claim_service());
        facility.release_service();
        assert!(facility.claim_service());
    }
}
