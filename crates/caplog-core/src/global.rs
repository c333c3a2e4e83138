//! Process-wide capture service
//!
//! The global service owns its own facility, wired to the global `tracing`
//! subscriber, and runs on a dedicated thread so it outlives any single
//! runtime. Test suites without a single init point can call [`global`]
//! from every test.

use crate::capture::CaptureOptions;
use crate::config::ServiceConfig;
use crate::coordinator::CaptureService;
use crate::errors::{CaptureError, Result};
use caplog_logging::{LogFacility, Profile};
use std::future::Future;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

static FACILITY: OnceLock<Arc<LogFacility>> = OnceLock::new();
static GLOBAL: OnceLock<CaptureService> = OnceLock::new();
static START_LOCK: Mutex<()> = Mutex::new(());

/// The facility wired to the global subscriber; kept across failed starts
fn facility() -> Arc<LogFacility> {
    let facility = FACILITY.get_or_init(|| {
        let facility = Arc::new(LogFacility::with_console());
        if !caplog_logging::init(Profile::Test, &facility) {
            tracing::warn!(
                target: caplog_core_types::schema::INTERNAL_TARGET,
                "Global subscriber already set; tracing events will not reach the capture service"
            );
        }
        facility
    });
    Arc::clone(facility)
}

fn start_locked(config: ServiceConfig) -> Result<&'static CaptureService> {
    let service = CaptureService::start_dedicated(facility(), config)?;
    Ok(GLOBAL.get_or_init(|| service))
}

/// Start the process-wide service
///
/// # Errors
/// - `AlreadyStarted` on every call after the first successful one
/// - `InvalidConfig` if `config` does not validate
pub fn start_global(config: ServiceConfig) -> Result<&'static CaptureService> {
    let _guard = START_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    if GLOBAL.get().is_some() {
        return Err(CaptureError::AlreadyStarted);
    }
    start_locked(config)
}

/// The process-wide service, started with `ServiceConfig::from_env` on first use
///
/// # Errors
/// - `InvalidConfig` if the `CAPLOG_*` environment is malformed
pub fn global() -> Result<&'static CaptureService> {
    if let Some(service) = GLOBAL.get() {
        return Ok(service);
    }
    let _guard = START_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    match GLOBAL.get() {
        Some(service) => Ok(service),
        None => start_locked(ServiceConfig::from_env()?),
    }
}

/// [`CaptureService::capture`] against the process-wide service
pub async fn capture<F>(options: CaptureOptions, work: F) -> Result<String>
where
    F: Future<Output = ()>,
{
    global()?.capture(options, work).await
}

/// [`CaptureService::with_capture`] against the process-wide service
pub async fn with_capture<F, T>(options: CaptureOptions, work: F) -> Result<(T, String)>
where
    F: Future<Output = T>,
{
    global()?.with_capture(options, work).await
}

/// [`CaptureService::capture_blocking`] against the process-wide service
pub fn capture_blocking<F>(options: CaptureOptions, work: F) -> Result<String>
where
    F: FnOnce(),
{
    global()?.capture_blocking(options, work)
}

/// [`CaptureService::with_capture_blocking`] against the process-wide service
pub fn with_capture_blocking<F, T>(options: CaptureOptions, work: F) -> Result<(T, String)>
where
    F: FnOnce() -> T,
{
    global()?.with_capture_blocking(options, work)
}
