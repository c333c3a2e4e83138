//! Formatter contract
//!
//! A formatter is a pure function from an event and a configuration to
//! rendered text. A [`FormatterIdentity`] pairs a renderer with its
//! configuration; two identities compare equal when the renderer name and
//! the configuration are structurally equal, which is what lets the capture
//! service render an event once per distinct identity.
//!
//! Callers name a formatter with a [`FormatterSpec`]: either a registered
//! renderer name plus free-form options, or an already built identity. The
//! spec is resolved once into an immutable identity.

pub mod json;
pub mod kv;
pub mod text;

use crate::errors::FormatError;
use caplog_core_types::LogEvent;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub use json::JsonFormatter;
pub use kv::{parse_line, KeyValueFormatter, ParsedLine};
pub use text::TextFormatter;

/// Renders a single event to text
pub trait Render: Send + Sync + 'static {
    /// Stable name; part of the formatter identity
    fn name(&self) -> &str;

    fn render(&self, event: &LogEvent, config: &FormatterConfig) -> Result<String, FormatError>;
}

/// Free-form formatter options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormatterConfig(Map<String, Value>);

impl FormatterConfig {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Read a string option, rejecting other value types
    pub fn get_str(&self, formatter: &str, key: &str) -> Result<Option<&str>, FormatError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(FormatError::invalid_option(formatter, key, "expected a string")),
        }
    }

    /// Read a boolean option, rejecting other value types
    pub fn get_bool(&self, formatter: &str, key: &str) -> Result<Option<bool>, FormatError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(FormatError::invalid_option(formatter, key, "expected a boolean")),
        }
    }

    /// Options from `overrides` replace options of the same key in `self`
    pub fn merged(&self, overrides: &FormatterConfig) -> FormatterConfig {
        let mut merged = self.0.clone();
        for (key, value) in &overrides.0 {
            merged.insert(key.clone(), value.clone());
        }
        FormatterConfig(merged)
    }
}

impl From<Map<String, Value>> for FormatterConfig {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// A renderer together with its configuration
#[derive(Clone)]
pub struct FormatterIdentity {
    renderer: Arc<dyn Render>,
    config: FormatterConfig,
}

impl FormatterIdentity {
    pub fn new(renderer: Arc<dyn Render>, config: FormatterConfig) -> Self {
        Self { renderer, config }
    }

    /// The ambient default renderer with the given options
    pub fn text(config: FormatterConfig) -> Self {
        Self::new(Arc::new(TextFormatter), config)
    }

    pub fn name(&self) -> &str {
        self.renderer.name()
    }

    pub fn config(&self) -> &FormatterConfig {
        &self.config
    }

    /// Same renderer, with `overrides` merged over the current options
    pub fn with_options(&self, overrides: &FormatterConfig) -> Self {
        Self {
            renderer: Arc::clone(&self.renderer),
            config: self.config.merged(overrides),
        }
    }

    pub fn render(&self, event: &LogEvent) -> Result<String, FormatError> {
        self.renderer.render(event, &self.config)
    }
}

impl PartialEq for FormatterIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.renderer.name() == other.renderer.name() && self.config == other.config
    }
}

impl Eq for FormatterIdentity {}

impl fmt::Debug for FormatterIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatterIdentity")
            .field("renderer", &self.renderer.name())
            .field("config", &self.config)
            .finish()
    }
}

/// How a caller names a formatter before resolution
#[derive(Debug, Clone)]
pub enum FormatterSpec {
    /// A registered renderer constructed from free-form options
    Named {
        name: String,
        options: FormatterConfig,
    },
    /// A pre-built identity, used as is
    Built(FormatterIdentity),
}

impl FormatterSpec {
    pub fn named(name: impl Into<String>) -> Self {
        FormatterSpec::Named {
            name: name.into(),
            options: FormatterConfig::new(),
        }
    }

    pub fn named_with(name: impl Into<String>, options: FormatterConfig) -> Self {
        FormatterSpec::Named {
            name: name.into(),
            options,
        }
    }

    /// Resolve into an identity, merging `extra` pass-through options
    pub fn resolve(
        &self,
        registry: &FormatterRegistry,
        extra: &FormatterConfig,
    ) -> Result<FormatterIdentity, FormatError> {
        match self {
            FormatterSpec::Named { name, options } => registry.build(name, options.merged(extra)),
            FormatterSpec::Built(identity) if extra.is_empty() => Ok(identity.clone()),
            FormatterSpec::Built(identity) => Ok(identity.with_options(extra)),
        }
    }
}

impl From<FormatterIdentity> for FormatterSpec {
    fn from(identity: FormatterIdentity) -> Self {
        FormatterSpec::Built(identity)
    }
}

/// Renderers available by name
#[derive(Clone)]
pub struct FormatterRegistry {
    renderers: BTreeMap<String, Arc<dyn Render>>,
}

impl FormatterRegistry {
    /// An empty registry
    pub fn empty() -> Self {
        Self {
            renderers: BTreeMap::new(),
        }
    }

    /// Registry holding the built-in `text`, `kv` and `json` renderers
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(TextFormatter));
        registry.register(Arc::new(KeyValueFormatter));
        registry.register(Arc::new(JsonFormatter));
        registry
    }

    /// Add or replace a renderer under its own name
    pub fn register(&mut self, renderer: Arc<dyn Render>) {
        self.renderers.insert(renderer.name().to_string(), renderer);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Render>> {
        self.renderers.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.renderers.keys().map(String::as_str)
    }

    pub fn build(
        &self,
        name: &str,
        options: FormatterConfig,
    ) -> Result<FormatterIdentity, FormatError> {
        let renderer = self
            .get(name)
            .ok_or_else(|| FormatError::UnknownFormatter {
                name: name.to_string(),
            })?;
        Ok(FormatterIdentity::new(renderer, options))
    }
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.renderers.keys()).finish()
    }
}
