//! Logging initialization module
//!
//! Provides a single initialization point that installs the global `tracing`
//! subscriber: the facility bridge plus a diagnostics layer for the crate's
//! own internal target.

use crate::facility::LogFacility;
use std::sync::{Arc, Once};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Environment variable read for the diagnostics filter
pub const ENV_FILTER_VAR: &str = "CAPLOG_LOG";

/// Logging profile configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable diagnostics at debug level
    Development,
    /// JSON structured diagnostics at info level
    Production,
    /// Bridge only; diagnostics at warn level
    Test,
}

impl Profile {
    fn default_directive(&self) -> &'static str {
        match self {
            Profile::Development => "caplog=debug",
            Profile::Production => "caplog=info",
            Profile::Test => "caplog=warn",
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_env(ENV_FILTER_VAR)
            .unwrap_or_else(|_| EnvFilter::new(self.default_directive()))
    }
}

static INIT_ONCE: Once = Once::new();

/// Initialize the global subscriber
///
/// Returns `true` only for the call that actually installed it. Later calls,
/// or a call made after another global subscriber was set, return `false`.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use caplog_logging::{init, LogFacility, Profile};
///
/// let facility = Arc::new(LogFacility::with_console());
/// init(Profile::Test, &facility);
/// ```
pub fn init(profile: Profile, facility: &Arc<LogFacility>) -> bool {
    let mut installed = false;
    INIT_ONCE.call_once(|| {
        let bridge = facility.layer();
        let result = match profile {
            Profile::Production => tracing_subscriber::registry()
                .with(bridge)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_filter(profile.filter()),
                )
                .try_init(),
            Profile::Development | Profile::Test => tracing_subscriber::registry()
                .with(bridge)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_filter(profile.filter()),
                )
                .try_init(),
        };
        installed = result.is_ok();
    });
    installed
}
