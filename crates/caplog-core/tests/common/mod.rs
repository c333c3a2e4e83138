use caplog_core::{
    CaptureService, FormatterConfig, FormatterIdentity, FormatterSpec, InterceptStats, Level,
    LogEvent, LogFacility, ServiceConfig,
};
use std::sync::Arc;
use std::time::Duration;

/// Start a service on the current runtime over a fresh console facility
#[allow(dead_code)]
pub fn start_service() -> (Arc<LogFacility>, CaptureService) {
    start_with(ServiceConfig::default())
}

#[allow(dead_code)]
pub fn start_with(config: ServiceConfig) -> (Arc<LogFacility>, CaptureService) {
    let facility = Arc::new(LogFacility::with_console());
    let service = CaptureService::start(facility.clone(), config).unwrap();
    (facility, service)
}

/// Text formatter that renders only the message
#[allow(dead_code)]
pub fn message_only() -> FormatterSpec {
    FormatterIdentity::text(FormatterConfig::new().with("format", "$message\n")).into()
}

#[allow(dead_code)]
pub fn event(level: Level, message: &str) -> LogEvent {
    LogEvent::new(level, "caplog_tests", message)
}

/// Poll stats until `done` holds; the owner monitors report asynchronously
#[allow(dead_code)]
pub async fn wait_for_stats(
    service: &CaptureService,
    done: impl Fn(&InterceptStats) -> bool,
) -> InterceptStats {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let stats = service.stats().await.unwrap();
            if done(&stats) {
                return stats;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("stats condition not reached in time")
}
