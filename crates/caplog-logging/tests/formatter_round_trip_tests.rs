#![allow(clippy::unwrap_used, clippy::expect_used)]

use caplog_core_types::{Level, LogEvent};
use caplog_logging::formatter::kv::parse_line;
use caplog_logging::{FormatterConfig, FormatterIdentity, FormatterRegistry, FormatterSpec};
use proptest::prelude::*;

fn kv_identity() -> FormatterIdentity {
    FormatterSpec::named("kv")
        .resolve(&FormatterRegistry::with_builtins(), &FormatterConfig::new())
        .unwrap()
}

#[test]
fn test_kv_round_trip_recovers_message_and_metadata() {
    let event = LogEvent::new(Level::Warn, "billing::invoice", "charge declined: card expired")
        .with_field("customer", "c-42")
        .with_field("amount", "19.99")
        .with_field("note", "said \"retry later\"");

    let line = kv_identity().render(&event).unwrap();
    let parsed = parse_line(&line).unwrap();

    assert_eq!(parsed.level, Some(Level::Warn));
    assert_eq!(parsed.target.as_deref(), Some("billing::invoice"));
    assert_eq!(parsed.message.as_deref(), Some("charge declined: card expired"));
    assert_eq!(parsed.fields, event.fields);
}

#[test]
fn test_json_round_trip_recovers_message_and_metadata() {
    let identity = FormatterSpec::named("json")
        .resolve(&FormatterRegistry::with_builtins(), &FormatterConfig::new())
        .unwrap();
    let event = LogEvent::new(Level::Info, "app", "started").with_field("port", "8080");

    let line = identity.render(&event).unwrap();
    let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();

    assert_eq!(value["message"], "started");
    assert_eq!(value["fields"]["port"], "8080");
}

fn level_strategy() -> impl Strategy<Value = Level> {
    prop::sample::select(Level::ALL.to_vec())
}

/// Field keys, including the names the formatter uses for its own header
fn field_key_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "f_[a-z0-9_]{0,8}",
        prop::sample::select(vec!["time", "level", "target", "msg"]).prop_map(String::from),
    ]
}

#[test]
fn test_kv_round_trip_keeps_fields_named_like_headers() {
    let event = LogEvent::new(Level::Info, "t", "m")
        .with_field("time", "noon")
        .with_field("level", "custom")
        .with_field("target", "elsewhere")
        .with_field("msg", "shadow");

    for time in [false, true] {
        let identity = kv_identity().with_options(&FormatterConfig::new().with("time", time));
        let parsed = parse_line(&identity.render(&event).unwrap()).unwrap();

        assert_eq!(parsed.level, Some(Level::Info));
        assert_eq!(parsed.target.as_deref(), Some("t"));
        assert_eq!(parsed.message.as_deref(), Some("m"));
        assert_eq!(parsed.time.is_some(), time);
        assert_eq!(parsed.fields, event.fields);
    }
}

proptest! {
    #[test]
    fn prop_kv_round_trip(
        level in level_strategy(),
        message in "\\PC*",
        fields in prop::collection::btree_map(field_key_strategy(), "\\PC{0,16}", 0..5),
        time in any::<bool>(),
    ) {
        let mut event = LogEvent::new(level, "prop", message.clone());
        event.fields = fields.clone();

        let identity = kv_identity().with_options(&FormatterConfig::new().with("time", time));
        let line = identity.render(&event).unwrap();
        let parsed = parse_line(&line).unwrap();

        prop_assert_eq!(parsed.time.is_some(), time);
        prop_assert_eq!(parsed.level, Some(level));
        prop_assert_eq!(parsed.message, Some(message));
        prop_assert_eq!(parsed.fields, fields);
    }
}
