//! One JSON object per line
//!
//! Options:
//! - `time`: include the RFC 3339 timestamp (default `true`)

use super::{FormatterConfig, Render};
use crate::errors::FormatError;
use caplog_core_types::schema::{FIELD_FIELDS, FIELD_LEVEL, FIELD_MESSAGE, FIELD_TARGET, FIELD_TIME};
use caplog_core_types::LogEvent;
use chrono::SecondsFormat;
use serde_json::{Map, Value};

const NAME: &str = "json";

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl Render for JsonFormatter {
    fn name(&self) -> &str {
        NAME
    }

    fn render(&self, event: &LogEvent, config: &FormatterConfig) -> Result<String, FormatError> {
        let mut object = Map::new();
        if config.get_bool(NAME, "time")?.unwrap_or(true) {
            object.insert(
                FIELD_TIME.to_string(),
                Value::from(event.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)),
            );
        }
        object.insert(FIELD_LEVEL.to_string(), Value::from(event.level.as_str()));
        object.insert(FIELD_TARGET.to_string(), Value::from(event.target.as_str()));
        object.insert(FIELD_MESSAGE.to_string(), Value::from(event.message.as_str()));
        if !event.fields.is_empty() {
            let fields = event
                .fields
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
                .collect::<Map<_, _>>();
            object.insert(FIELD_FIELDS.to_string(), Value::Object(fields));
        }

        let mut line = serde_json::to_string(&Value::Object(object))
            .map_err(|e| FormatError::render(NAME, e.to_string()))?;
        line.push('\n');
        Ok(line)
    }
}
