//! Scoped capture of log output
//!
//! A capture registers a fresh sink for the duration of one piece of work
//! and hands back everything rendered into it. The capture is deregistered
//! on every exit path before the work's outcome propagates, so a panicking
//! body still leaves the facility with its default handler.

use crate::coordinator::CaptureService;
use crate::errors::Result;
use crate::monitor::Owner;
use crate::sink::Sink;
use caplog_core_types::Level;
use caplog_logging::{FormatterConfig, FormatterSpec};
use futures::FutureExt;
use serde_json::Value;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

/// Per-capture filter and formatter selection
///
/// The default admits every level and renders with the service's default
/// formatter.
#[derive(Debug, Clone, Default)]
pub struct CaptureOptions {
    /// Minimum level admitted; `None` admits everything
    pub level: Option<Level>,
    /// Explicit formatter; `None` falls back to the service default
    pub formatter: Option<FormatterSpec>,
    /// Merged over the chosen formatter's own options
    pub options: FormatterConfig,
}

impl CaptureOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    pub fn formatter(mut self, formatter: impl Into<FormatterSpec>) -> Self {
        self.formatter = Some(formatter.into());
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key, value);
        self
    }
}

impl CaptureService {
    /// Run `work` with a capture active and return its output with the captured text
    ///
    /// # Errors
    /// - formatter resolution errors from registration
    /// - `ServiceUnavailable` if the service is gone
    ///
    /// # Panics
    /// A panic in `work` is resumed after the capture is removed.
    pub async fn with_capture<F, T>(&self, options: CaptureOptions, work: F) -> Result<(T, String)>
    where
        F: Future<Output = T>,
    {
        let owner = Owner::new();
        let sink = Sink::new();
        let token = self.register(&owner, &sink, options).await?;

        let outcome = AssertUnwindSafe(work).catch_unwind().await;
        let deregistered = self.deregister(&token).await;
        drop(owner);

        match outcome {
            Ok(value) => {
                deregistered?;
                Ok((value, sink.take()))
            }
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    /// Run `work` with a capture active and return only the captured text
    pub async fn capture<F>(&self, options: CaptureOptions, work: F) -> Result<String>
    where
        F: Future<Output = ()>,
    {
        let ((), text) = self.with_capture(options, work).await?;
        Ok(text)
    }

    /// Synchronous form of [`with_capture`](Self::with_capture)
    ///
    /// # Panics
    /// Panics if called from within an asynchronous execution context. A
    /// panic in `work` is resumed after the capture is removed.
    pub fn with_capture_blocking<F, T>(
        &self,
        options: CaptureOptions,
        work: F,
    ) -> Result<(T, String)>
    where
        F: FnOnce() -> T,
    {
        let owner = Owner::new();
        let sink = Sink::new();
        let token = self.blocking_register(&owner, &sink, options)?;

        let outcome = panic::catch_unwind(AssertUnwindSafe(work));
        let deregistered = self.blocking_deregister(&token);
        drop(owner);

        match outcome {
            Ok(value) => {
                deregistered?;
                Ok((value, sink.take()))
            }
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    /// Synchronous form of [`capture`](Self::capture)
    pub fn capture_blocking<F>(&self, options: CaptureOptions, work: F) -> Result<String>
    where
        F: FnOnce(),
    {
        let ((), text) = self.with_capture_blocking(options, work)?;
        Ok(text)
    }
}
