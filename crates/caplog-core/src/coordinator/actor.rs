//! CaptureActor - Internal actor that owns the registration set
//!
//! Runs in a single task and processes commands one at a time, in arrival
//! order. It is the only writer of the registration set and of the intercept
//! state. Readers see the set through a `watch` snapshot that is republished
//! after every change and before the change is acknowledged.

use super::commands::ServiceCommand;
use super::intercept::Intercept;
use super::registration::Registration;
use crate::capture::CaptureOptions;
use crate::config::ServiceConfig;
use crate::errors::Result;
use crate::monitor::{Liveness, Monitor};
use crate::sink::Sink;
use caplog_core_types::schema::INTERNAL_TARGET;
use caplog_core_types::CaptureToken;
use caplog_logging::{FormatterIdentity, HandlerConfig, LogFacility};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Why a registration is being removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RemovalCause {
    Deregistered,
    OwnerTerminated,
}

struct Entry {
    registration: Registration,
    monitor: Monitor,
}

pub(super) struct CaptureActor {
    facility: Arc<LogFacility>,
    config: ServiceConfig,
    registrations: BTreeMap<CaptureToken, Entry>,
    intercept: Intercept,
    capture_handler: HandlerConfig,
    snapshot_tx: watch::Sender<Arc<[Registration]>>,
    terminated_tx: mpsc::UnboundedSender<CaptureToken>,
}

impl CaptureActor {
    pub(super) fn new(
        facility: Arc<LogFacility>,
        config: ServiceConfig,
        capture_handler: HandlerConfig,
        snapshot_tx: watch::Sender<Arc<[Registration]>>,
        terminated_tx: mpsc::UnboundedSender<CaptureToken>,
    ) -> Self {
        Self {
            intercept: Intercept::new(Arc::clone(&facility)),
            facility,
            config,
            registrations: BTreeMap::new(),
            capture_handler,
            snapshot_tx,
            terminated_tx,
        }
    }

    /// Main loop; exits once every `CaptureService` handle is dropped.
    ///
    /// Termination notices are polled first so an owner that died is removed
    /// before later commands are served.
    pub(super) async fn run(
        mut self,
        mut cmd_rx: mpsc::Receiver<ServiceCommand>,
        mut terminated_rx: mpsc::UnboundedReceiver<CaptureToken>,
    ) {
        loop {
            tokio::select! {
                biased;

                Some(token) = terminated_rx.recv() => {
                    self.remove(&token, RemovalCause::OwnerTerminated);
                }

                cmd = cmd_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
            }
        }
        tracing::debug!(target: INTERNAL_TARGET, "Command channel closed; capture service exiting");
    }

    fn handle_command(&mut self, cmd: ServiceCommand) {
        tracing::trace!(target: INTERNAL_TARGET, command = cmd.name(), "Handling command");
        match cmd {
            ServiceCommand::Register {
                liveness,
                sink,
                options,
                resp,
            } => {
                let result = self.register(liveness, sink, options);
                let _ = resp.send(result);
            }
            ServiceCommand::Deregister { token, resp } => {
                self.remove(&token, RemovalCause::Deregistered);
                let _ = resp.send(());
            }
            ServiceCommand::Stats { resp } => {
                let _ = resp.send(self.intercept.stats(self.registrations.len()));
            }
        }
    }

    /// Explicit options first, then the configured default, then the
    /// facility's default handler formatter, then the text formatter.
    fn resolve_formatter(&self, options: &CaptureOptions) -> Result<FormatterIdentity> {
        let registry = &self.config.registry;
        if let Some(spec) = &options.formatter {
            return Ok(spec.resolve(registry, &options.options)?);
        }
        if let Some(settings) = &self.config.default_formatter {
            return Ok(settings.to_spec().resolve(registry, &options.options)?);
        }
        if let Some(default) = self.intercept.default_formatter() {
            return Ok(default.with_options(&options.options));
        }
        Ok(FormatterIdentity::text(options.options.clone()))
    }

    fn register(
        &mut self,
        liveness: Liveness,
        sink: Sink,
        options: CaptureOptions,
    ) -> Result<CaptureToken> {
        let formatter = self.resolve_formatter(&options)?;
        let token = CaptureToken::new();
        let owner = liveness.owner();
        let monitor = Monitor::spawn(liveness, token.clone(), self.terminated_tx.clone());

        let registration = Registration {
            token: token.clone(),
            owner,
            sink,
            min_level: options.level.or(self.config.default_level),
            formatter,
        };
        self.registrations.insert(
            token.clone(),
            Entry {
                registration,
                monitor,
            },
        );
        self.publish();
        if !self.intercept.is_installed() {
            self.intercept.install(self.capture_handler.clone());
        }

        tracing::debug!(
            target: INTERNAL_TARGET,
            token = %token,
            owner = %owner,
            active = self.registrations.len(),
            "Capture registered"
        );
        Ok(token)
    }

    /// The single removal path shared by deregister and owner termination
    fn remove(&mut self, token: &CaptureToken, cause: RemovalCause) {
        let Some(entry) = self.registrations.remove(token) else {
            tracing::trace!(
                target: INTERNAL_TARGET,
                token = %token,
                cause = ?cause,
                "Capture already removed"
            );
            return;
        };

        entry.monitor.cancel();
        entry.registration.sink.close();
        self.publish();
        if self.registrations.is_empty() {
            self.intercept.restore();
        }

        tracing::debug!(
            target: INTERNAL_TARGET,
            token = %token,
            owner = %entry.registration.owner,
            cause = ?cause,
            active = self.registrations.len(),
            "Capture removed"
        );
    }

    fn publish(&self) {
        let snapshot: Arc<[Registration]> = self
            .registrations
            .values()
            .map(|entry| entry.registration.clone())
            .collect();
        self.snapshot_tx.send_replace(snapshot);
    }
}

impl Drop for CaptureActor {
    fn drop(&mut self) {
        for (_, entry) in std::mem::take(&mut self.registrations) {
            entry.monitor.cancel();
            entry.registration.sink.close();
        }
        self.publish();
        self.intercept.restore();
        self.facility.release_service();
    }
}
