#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use caplog_core::{CaptureError, CaptureOptions, CaptureService, Level, LogFacility, ServiceConfig};
use caplog_core_types::HandlerId;
use common::{event, message_only};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

fn dedicated() -> (Arc<LogFacility>, CaptureService) {
    let facility = Arc::new(LogFacility::with_console());
    let service =
        CaptureService::start_dedicated(facility.clone(), ServiceConfig::default()).unwrap();
    (facility, service)
}

#[test]
fn test_with_capture_blocking_returns_value_and_text() {
    let (facility, service) = dedicated();

    let (value, text) = service
        .with_capture_blocking(CaptureOptions::new().formatter(message_only()), || {
            facility.emit(&event(Level::Info, "sync work"));
            42
        })
        .unwrap();

    assert_eq!(value, 42);
    assert_eq!(text, "sync work\n");
    assert!(facility.handler(&HandlerId::default_handler()).is_some());
}

#[test]
fn test_capture_blocking_from_plain_threads() {
    let (facility, service) = dedicated();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let service = service.clone();
            let facility = facility.clone();
            thread::spawn(move || {
                service
                    .capture_blocking(CaptureOptions::new().formatter(message_only()), || {
                        facility.emit(&event(Level::Info, &format!("thread {}", i)));
                    })
                    .unwrap()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let text = handle.join().unwrap();
        assert!(text.lines().any(|line| line == format!("thread {}", i)));
    }
    assert!(facility.handler(&HandlerId::default_handler()).is_some());
    assert!(facility.handler(&HandlerId::capture_handler()).is_none());
}

#[test]
fn test_blocking_panic_restores_before_resuming() {
    let (facility, service) = dedicated();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        service.capture_blocking(CaptureOptions::default(), || panic!("sync boom"))
    }));

    assert!(outcome.is_err());
    assert!(facility.handler(&HandlerId::default_handler()).is_some());
    assert!(facility.handler(&HandlerId::capture_handler()).is_none());
}

#[test]
fn test_dedicated_double_start_is_rejected() {
    let (facility, _service) = dedicated();

    let err = CaptureService::start_dedicated(facility, ServiceConfig::default()).unwrap_err();

    assert_eq!(err, CaptureError::AlreadyStarted);
}

#[tokio::test]
async fn test_dedicated_service_serves_async_callers() {
    let (facility, service) = dedicated();

    let text = service
        .capture(CaptureOptions::new().formatter(message_only()), async {
            facility.emit(&event(Level::Warn, "from another runtime"));
        })
        .await
        .unwrap();

    assert_eq!(text, "from another runtime\n");
}
