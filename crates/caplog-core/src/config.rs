//! Capture service configuration
//!
//! Loadable from TOML or from `CAPLOG_*` environment variables. The
//! formatter registry is not part of the serialized form.

use crate::errors::{CaptureError, Result};
use caplog_core_types::Level;
use caplog_logging::{FormatterConfig, FormatterRegistry, FormatterSpec};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Default minimum level for captures that do not set one
pub const ENV_LEVEL: &str = "CAPLOG_LEVEL";
/// Name of the default formatter for captures that do not set one
pub const ENV_FORMATTER: &str = "CAPLOG_FORMATTER";

pub const DEFAULT_MAILBOX_CAPACITY: usize = 256;

/// A formatter named in configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatterSettings {
    pub name: String,
    #[serde(default)]
    pub options: Map<String, Value>,
}

impl FormatterSettings {
    pub fn to_spec(&self) -> FormatterSpec {
        FormatterSpec::named_with(self.name.clone(), FormatterConfig::from(self.options.clone()))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Bound of the service command mailbox
    pub mailbox_capacity: usize,
    /// Applied to captures registered without a level
    pub default_level: Option<Level>,
    /// Takes precedence over the facility's default handler formatter
    pub default_formatter: Option<FormatterSettings>,
    /// Renderers available to `FormatterSpec::Named`
    #[serde(skip)]
    pub registry: FormatterRegistry,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            default_level: None,
            default_formatter: None,
            registry: FormatterRegistry::with_builtins(),
        }
    }
}

impl ServiceConfig {
    /// Parse a TOML document
    ///
    /// ```
    /// use caplog_core::ServiceConfig;
    ///
    /// let config = ServiceConfig::from_toml_str(r#"
    ///     default_level = "warning"
    ///
    ///     [default_formatter]
    ///     name = "kv"
    ///     options = { time = true }
    /// "#).unwrap();
    /// assert_eq!(config.default_formatter.unwrap().name, "kv");
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: ServiceConfig = toml::from_str(source)
            .map_err(|e| CaptureError::invalid_config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `CAPLOG_LEVEL` and `CAPLOG_FORMATTER`
    ///
    /// # Errors
    /// - `InvalidConfig` if the level does not parse or the formatter is unknown
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(level) = std::env::var(ENV_LEVEL) {
            let level = level.parse::<Level>().map_err(|e| {
                CaptureError::invalid_config(format!("{}: {}", ENV_LEVEL, e))
            })?;
            config.default_level = Some(level);
        }
        if let Ok(name) = std::env::var(ENV_FORMATTER) {
            config.default_formatter = Some(FormatterSettings {
                name,
                options: Map::new(),
            });
        }
        config.validate()?;
        Ok(config)
    }

    pub fn with_registry(mut self, registry: FormatterRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_default_level(mut self, level: Level) -> Self {
        self.default_level = Some(level);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.mailbox_capacity == 0 {
            return Err(CaptureError::invalid_config(
                "mailbox_capacity must be greater than zero",
            ));
        }
        if let Some(settings) = &self.default_formatter {
            if self.registry.get(&settings.name).is_none() {
                return Err(CaptureError::invalid_config(format!(
                    "default_formatter '{}' is not registered",
                    settings.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.mailbox_capacity, DEFAULT_MAILBOX_CAPACITY);
        assert!(config.default_level.is_none());
        assert!(config.default_formatter.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let config = ServiceConfig::from_toml_str(
            r#"
            mailbox_capacity = 8
            default_level = "info"

            [default_formatter]
            name = "text"
            options = { format = "[$level] $message\n" }
            "#,
        )
        .unwrap();

        assert_eq!(config.mailbox_capacity, 8);
        assert_eq!(config.default_level, Some(Level::Info));
        let settings = config.default_formatter.unwrap();
        assert_eq!(settings.options["format"], "[$level] $message\n");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = ServiceConfig::from_toml_str("colour = true").unwrap_err();
        assert_eq!(err.code(), "ERR_INVALID_CONFIG");
    }

    #[test]
    fn test_zero_mailbox_rejected() {
        assert!(ServiceConfig::from_toml_str("mailbox_capacity = 0").is_err());
    }

    #[test]
    fn test_unregistered_default_formatter_rejected() {
        let err = ServiceConfig::from_toml_str("[default_formatter]\nname = \"xml\"").unwrap_err();
        assert!(err.to_string().contains("xml"));
    }
}
