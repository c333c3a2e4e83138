//! Bridge from `tracing` into the log facility
//!
//! Every `tracing` event becomes a [`LogEvent`] and is emitted through the
//! facility. Events on the internal diagnostic target are skipped so that
//! the capture machinery never feeds its own diagnostics back into itself.

use crate::facility::LogFacility;
use caplog_core_types::schema::{FIELD_MESSAGE, INTERNAL_TARGET};
use caplog_core_types::{Level, LogEvent};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::Subscriber;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: BTreeMap<String, String>,
}

impl FieldVisitor {
    fn store(&mut self, field: &Field, value: String) {
        if field.name() == FIELD_MESSAGE {
            self.message = Some(value);
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.store(field, format!("{:?}", value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.store(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.store(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.store(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.store(field, value.to_string());
    }
}

/// Layer forwarding `tracing` events to a [`LogFacility`]
pub struct FacilityLayer {
    facility: Arc<LogFacility>,
}

impl FacilityLayer {
    pub fn new(facility: Arc<LogFacility>) -> Self {
        Self { facility }
    }
}

/// Convert a `tracing` event into a facility event
pub fn to_log_event(event: &tracing::Event<'_>) -> LogEvent {
    let metadata = event.metadata();
    let mut visitor = FieldVisitor::default();
    event.record(&mut visitor);

    LogEvent {
        level: Level::from(metadata.level()),
        target: metadata.target().to_string(),
        message: visitor.message.unwrap_or_default(),
        fields: visitor.fields,
        timestamp: Utc::now(),
    }
}

impl<S> Layer<S> for FacilityLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        if event.metadata().target() == INTERNAL_TARGET {
            return;
        }
        self.facility.emit(&to_log_event(event));
    }
}
