//! logfmt-style key/value formatter and its parser
//!
//! Lines look like `level=info target=app msg="hello world" user=alice`.
//! Values containing spaces, quotes, `=`, backslashes or control
//! characters are quoted and escaped. Field keys are written verbatim.
//!
//! Options:
//! - `time`: when `true`, prefix the line with `time=<RFC 3339>`

use super::{FormatterConfig, Render};
use crate::errors::FormatError;
use caplog_core_types::schema::{FIELD_LEVEL, FIELD_MSG, FIELD_TARGET, FIELD_TIME};
use caplog_core_types::{Level, LogEvent};
use chrono::SecondsFormat;
use std::collections::BTreeMap;

const NAME: &str = "kv";

#[derive(Debug, Clone, Copy, Default)]
pub struct KeyValueFormatter;

fn needs_quoting(value: &str) -> bool {
    value.is_empty()
        || value
            .chars()
            .any(|c| c == ' ' || c == '"' || c == '=' || c == '\\' || c.is_control())
}

fn push_value(out: &mut String, value: &str) {
    if !needs_quoting(value) {
        out.push_str(value);
        return;
    }
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
}

fn push_pair(out: &mut String, key: &str, value: &str) {
    if !out.is_empty() {
        out.push(' ');
    }
    out.push_str(key);
    out.push('=');
    push_value(out, value);
}

impl Render for KeyValueFormatter {
    fn name(&self) -> &str {
        NAME
    }

    fn render(&self, event: &LogEvent, config: &FormatterConfig) -> Result<String, FormatError> {
        let mut out = String::new();
        if config.get_bool(NAME, "time")?.unwrap_or(false) {
            let time = event.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true);
            push_pair(&mut out, FIELD_TIME, &time);
        }
        push_pair(&mut out, FIELD_LEVEL, event.level.as_str());
        push_pair(&mut out, FIELD_TARGET, &event.target);
        push_pair(&mut out, FIELD_MSG, &event.message);
        for (key, value) in &event.fields {
            push_pair(&mut out, key, value);
        }
        out.push('\n');
        Ok(out)
    }
}

/// A key/value line parsed back into its parts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedLine {
    pub time: Option<String>,
    pub level: Option<Level>,
    pub target: Option<String>,
    pub message: Option<String>,
    pub fields: BTreeMap<String, String>,
}

fn parse_error(offset: usize, message: impl Into<String>) -> FormatError {
    FormatError::Parse {
        offset,
        message: message.into(),
    }
}

/// Parse one line produced by [`KeyValueFormatter`]
///
/// `time` is the header only as the first pair, which is the only place the
/// formatter writes it. The first occurrence of `level`, `target` and `msg`
/// fills the dedicated slots, since those are always written before any
/// field. Every other pair lands in `fields`.
pub fn parse_line(line: &str) -> Result<ParsedLine, FormatError> {
    let line = line.trim_end_matches(['\n', '\r']);
    let mut parsed = ParsedLine::default();
    let mut chars = line.char_indices().peekable();
    let mut first_pair = true;

    loop {
        while chars.next_if(|(_, c)| *c == ' ').is_some() {}
        let Some(&(key_start, _)) = chars.peek() else {
            break;
        };

        let mut key_end = None;
        for (i, c) in chars.by_ref() {
            match c {
                '=' => {
                    key_end = Some(i);
                    break;
                }
                ' ' | '"' => return Err(parse_error(i, "unexpected character in key")),
                _ => {}
            }
        }
        let key_end = key_end.ok_or_else(|| parse_error(line.len(), "key without value"))?;
        if key_end == key_start {
            return Err(parse_error(key_start, "empty key"));
        }
        let key = &line[key_start..key_end];

        let mut value = String::new();
        if chars.next_if(|(_, c)| *c == '"').is_some() {
            let mut closed = false;
            while let Some((i, c)) = chars.next() {
                match c {
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\\' => match chars.next() {
                        Some((_, 'n')) => value.push('\n'),
                        Some((_, 'r')) => value.push('\r'),
                        Some((_, 't')) => value.push('\t'),
                        Some((_, '"')) => value.push('"'),
                        Some((_, '\\')) => value.push('\\'),
                        Some((_, other)) => {
                            value.push('\\');
                            value.push(other);
                        }
                        None => return Err(parse_error(i, "dangling escape")),
                    },
                    c => value.push(c),
                }
            }
            if !closed {
                return Err(parse_error(line.len(), "unterminated quoted value"));
            }
        } else {
            while let Some((_, c)) = chars.next_if(|(_, c)| *c != ' ') {
                value.push(c);
            }
        }

        let is_first = std::mem::replace(&mut first_pair, false);
        match key {
            FIELD_TIME if is_first => parsed.time = Some(value),
            FIELD_LEVEL if parsed.level.is_none() => {
                let level = value
                    .parse::<Level>()
                    .map_err(|e| parse_error(key_start, e.to_string()))?;
                parsed.level = Some(level);
            }
            FIELD_TARGET if parsed.target.is_none() => parsed.target = Some(value),
            FIELD_MSG if parsed.message.is_none() => parsed.message = Some(value),
            _ => {
                parsed.fields.insert(key.to_string(), value);
            }
        }
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_plain_values() {
        let event = LogEvent::new(Level::Warn, "app", "disk_low").with_field("pct", "91");
        let out = KeyValueFormatter.render(&event, &FormatterConfig::new()).unwrap();
        assert_eq!(out, "level=warn target=app msg=disk_low pct=91\n");
    }

    #[test]
    fn test_render_quotes_and_escapes() {
        let event = LogEvent::new(Level::Info, "app", "say \"hi\"\nbye").with_field("empty", "");
        let out = KeyValueFormatter.render(&event, &FormatterConfig::new()).unwrap();
        assert_eq!(
            out,
            "level=info target=app msg=\"say \\\"hi\\\"\\nbye\" empty=\"\"\n"
        );
    }

    #[test]
    fn test_render_with_time() {
        let event = LogEvent::new(Level::Info, "app", "x");
        let config = FormatterConfig::new().with("time", true);
        let out = KeyValueFormatter.render(&event, &config).unwrap();
        assert!(out.starts_with("time="));
        assert!(parse_line(&out).unwrap().time.is_some());
    }

    #[test]
    fn test_parse_rejects_unterminated_quote() {
        assert!(matches!(
            parse_line("msg=\"open"),
            Err(FormatError::Parse { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_bare_word() {
        assert!(parse_line("level=info oops").is_err());
    }

    #[test]
    fn test_parse_reserved_key_collision_goes_to_fields() {
        let event = LogEvent::new(Level::Error, "app", "boom").with_field("level", "custom");
        let out = KeyValueFormatter.render(&event, &FormatterConfig::new()).unwrap();
        let parsed = parse_line(&out).unwrap();
        assert_eq!(parsed.level, Some(Level::Error));
        assert_eq!(parsed.fields.get("level").map(String::as_str), Some("custom"));
    }

    #[test]
    fn test_time_field_without_time_header_stays_a_field() {
        let event = LogEvent::new(Level::Info, "t", "m").with_field("time", "noon");
        let out = KeyValueFormatter.render(&event, &FormatterConfig::new()).unwrap();
        let parsed = parse_line(&out).unwrap();
        assert_eq!(parsed.time, None);
        assert_eq!(parsed.fields.get("time").map(String::as_str), Some("noon"));
    }

    #[test]
    fn test_time_field_with_time_header() {
        let event = LogEvent::new(Level::Info, "t", "m").with_field("time", "noon");
        let config = FormatterConfig::new().with("time", true);
        let out = KeyValueFormatter.render(&event, &config).unwrap();
        let parsed = parse_line(&out).unwrap();
        assert_ne!(parsed.time.as_deref(), Some("noon"));
        assert!(parsed.time.is_some());
        assert_eq!(parsed.fields.get("time").map(String::as_str), Some("noon"));
    }
}
