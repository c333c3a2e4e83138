//! Template-driven human-readable formatter
//!
//! Placeholders: `$time`, `$date`, `$level`, `$target`, `$message`,
//! `$metadata`. Unknown placeholders are emitted verbatim.
//!
//! Options:
//! - `format`: template string, default [`DEFAULT_FORMAT`]
//! - `metadata`: `"all"` or an array of field names rendered as ` key=value`
//! - `time`: `false` drops `$time` together with the space that follows it

use super::{FormatterConfig, Render};
use crate::errors::FormatError;
use caplog_core_types::LogEvent;
use serde_json::Value;
use std::fmt::Write;

pub const DEFAULT_FORMAT: &str = "$time [$level] $message$metadata\n";

const NAME: &str = "text";
const TIME_FORMAT: &str = "%H:%M:%S%.3f";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// The ambient default renderer
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFormatter;

enum MetadataSelection<'a> {
    None,
    All,
    Keys(Vec<&'a str>),
}

fn metadata_selection(config: &FormatterConfig) -> Result<MetadataSelection<'_>, FormatError> {
    match config.get("metadata") {
        None | Some(Value::Null) => Ok(MetadataSelection::None),
        Some(Value::String(s)) if s == "all" => Ok(MetadataSelection::All),
        Some(Value::Array(keys)) => keys
            .iter()
            .map(|k| {
                k.as_str().ok_or_else(|| {
                    FormatError::invalid_option(NAME, "metadata", "keys must be strings")
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(MetadataSelection::Keys),
        Some(_) => Err(FormatError::invalid_option(
            NAME,
            "metadata",
            "expected \"all\" or an array of field names",
        )),
    }
}

fn render_metadata(event: &LogEvent, selection: &MetadataSelection<'_>) -> String {
    let mut out = String::new();
    match selection {
        MetadataSelection::None => {}
        MetadataSelection::All => {
            for (key, value) in &event.fields {
                let _ = write!(out, " {}={}", key, value);
            }
        }
        MetadataSelection::Keys(keys) => {
            for key in keys {
                if let Some(value) = event.fields.get(*key) {
                    let _ = write!(out, " {}={}", key, value);
                }
            }
        }
    }
    out
}

fn expand(template: &str, event: &LogEvent, metadata: &str, show_time: bool) -> String {
    let mut out = String::with_capacity(template.len() + event.message.len() + metadata.len());
    let mut rest = template;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let name_len = after
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(after.len());
        let name = &after[..name_len];

        match name {
            "time" if show_time => {
                let _ = write!(out, "{}", event.timestamp.format(TIME_FORMAT));
            }
            "time" => {
                let after_time = &after[name_len..];
                rest = after_time.strip_prefix(' ').unwrap_or(after_time);
                continue;
            }
            "date" => {
                let _ = write!(out, "{}", event.timestamp.format(DATE_FORMAT));
            }
            "level" => out.push_str(event.level.as_str()),
            "target" => out.push_str(&event.target),
            "message" => out.push_str(&event.message),
            "metadata" => out.push_str(metadata),
            other => {
                out.push('$');
                out.push_str(other);
            }
        }
        rest = &after[name_len..];
    }

    out.push_str(rest);
    out
}

impl Render for TextFormatter {
    fn name(&self) -> &str {
        NAME
    }

    fn render(&self, event: &LogEvent, config: &FormatterConfig) -> Result<String, FormatError> {
        let template = config.get_str(NAME, "format")?.unwrap_or(DEFAULT_FORMAT);
        let selection = metadata_selection(config)?;
        let metadata = render_metadata(event, &selection);
        let show_time = config.get_bool(NAME, "time")?.unwrap_or(true);
        Ok(expand(template, event, &metadata, show_time))
    }
}
