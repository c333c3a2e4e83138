//! CaptureService handle - Public API of the capture coordination service.
//!
//! A lightweight, cloneable handle. Registration traffic is sent to the
//! actor and awaited; event handling runs directly on the emitter's thread
//! against the actor's latest snapshot.

use super::actor::CaptureActor;
use super::commands::ServiceCommand;
use super::handler::CaptureHandler;
use super::intercept::InterceptStats;
use super::registration::Registration;
use crate::capture::CaptureOptions;
use crate::config::ServiceConfig;
use crate::dispatch::DispatchReport;
use crate::errors::{CaptureError, Result};
use crate::monitor::Owner;
use crate::sink::Sink;
use caplog_core_types::schema::INTERNAL_TARGET;
use caplog_core_types::{CaptureToken, HandlerId, LogEvent};
use caplog_logging::{HandlerConfig, LogFacility};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

/// Handle to a running capture coordination service
#[derive(Clone)]
pub struct CaptureService {
    cmd_tx: mpsc::Sender<ServiceCommand>,
    handler: Arc<CaptureHandler>,
    facility: Arc<LogFacility>,
}

type ActorChannels = (
    mpsc::Receiver<ServiceCommand>,
    mpsc::UnboundedReceiver<CaptureToken>,
);

impl CaptureService {
    // -------------------------------------------------------------------------
    // Startup
    // -------------------------------------------------------------------------

    /// Claim the facility and build the actor without running it
    fn prepare(
        facility: Arc<LogFacility>,
        config: ServiceConfig,
    ) -> Result<(Self, CaptureActor, ActorChannels)> {
        config.validate()?;
        if !facility.claim_service() {
            return Err(CaptureError::AlreadyStarted);
        }

        let (cmd_tx, cmd_rx) = mpsc::channel(config.mailbox_capacity);
        let (terminated_tx, terminated_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) =
            watch::channel::<Arc<[Registration]>>(Arc::from(Vec::new()));

        let handler = Arc::new(CaptureHandler::new(snapshot_rx));
        let capture_handler = HandlerConfig::new(HandlerId::capture_handler(), handler.clone());
        let actor = CaptureActor::new(
            Arc::clone(&facility),
            config,
            capture_handler,
            snapshot_tx,
            terminated_tx,
        );

        let service = CaptureService {
            cmd_tx,
            handler,
            facility,
        };
        Ok((service, actor, (cmd_rx, terminated_rx)))
    }

    /// Start the service on the current tokio runtime
    ///
    /// # Errors
    /// - `AlreadyStarted` if a service is already running for `facility`
    /// - `Startup` if called outside a tokio runtime
    /// - `InvalidConfig` if `config` does not validate
    pub fn start(facility: Arc<LogFacility>, config: ServiceConfig) -> Result<Self> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| CaptureError::Startup {
            message: e.to_string(),
        })?;
        let (service, actor, (cmd_rx, terminated_rx)) = Self::prepare(facility, config)?;
        runtime.spawn(actor.run(cmd_rx, terminated_rx));
        tracing::debug!(target: INTERNAL_TARGET, "Capture service started");
        Ok(service)
    }

    /// Start the service on a dedicated thread with its own runtime
    ///
    /// Use this when captures come from several runtimes or from plain
    /// threads, e.g. a process-wide service shared by a whole test binary.
    ///
    /// # Errors
    /// - `AlreadyStarted` if a service is already running for `facility`
    /// - `Startup` if the thread or its runtime cannot be created
    pub fn start_dedicated(facility: Arc<LogFacility>, config: ServiceConfig) -> Result<Self> {
        let (service, actor, (cmd_rx, terminated_rx)) = Self::prepare(facility, config)?;
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<()>>();

        std::thread::Builder::new()
            .name("caplog-service".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        // Dropping the actor releases the facility claim.
                        drop(actor);
                        let _ = ready_tx.send(Err(CaptureError::Startup {
                            message: e.to_string(),
                        }));
                        return;
                    }
                };
                runtime.block_on(async move {
                    let _ = ready_tx.send(Ok(()));
                    actor.run(cmd_rx, terminated_rx).await;
                });
            })
            .map_err(|e| CaptureError::Startup {
                message: e.to_string(),
            })?;

        ready_rx.recv().map_err(|e| CaptureError::Startup {
            message: e.to_string(),
        })??;
        tracing::debug!(target: INTERNAL_TARGET, "Capture service started on dedicated thread");
        Ok(service)
    }

    pub fn facility(&self) -> &Arc<LogFacility> {
        &self.facility
    }

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------

    /// Register a capture owned by `owner`, writing into `sink`
    ///
    /// Installs the capture handler if this is the only active capture. The
    /// registration is visible to event handling before this returns.
    ///
    /// # Errors
    /// - formatter resolution errors (`UnknownFormatter`, `InvalidOption`)
    /// - `ServiceUnavailable` if the actor is gone
    pub async fn register(
        &self,
        owner: &Owner,
        sink: &Sink,
        options: CaptureOptions,
    ) -> Result<CaptureToken> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Self::register_command(owner, sink, options, tx))
            .await
            .map_err(|_| CaptureError::unavailable("register"))?;
        rx.await.map_err(|_| CaptureError::unavailable("register"))?
    }

    /// Remove a capture; unknown tokens are a no-op
    ///
    /// Closes the capture's sink and restores the facility's default handler
    /// if this was the last active capture.
    ///
    /// # Errors
    /// - `ServiceUnavailable` if the actor is gone
    pub async fn deregister(&self, token: &CaptureToken) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(ServiceCommand::Deregister {
                token: token.clone(),
                resp: tx,
            })
            .await
            .map_err(|_| CaptureError::unavailable("deregister"))?;
        rx.await.map_err(|_| CaptureError::unavailable("deregister"))
    }

    /// [`register`](Self::register) for callers outside any async runtime
    ///
    /// # Panics
    /// Panics if called from within an asynchronous execution context.
    pub fn blocking_register(
        &self,
        owner: &Owner,
        sink: &Sink,
        options: CaptureOptions,
    ) -> Result<CaptureToken> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .blocking_send(Self::register_command(owner, sink, options, tx))
            .map_err(|_| CaptureError::unavailable("register"))?;
        rx.blocking_recv()
            .map_err(|_| CaptureError::unavailable("register"))?
    }

    /// [`deregister`](Self::deregister) for callers outside any async runtime
    ///
    /// # Panics
    /// Panics if called from within an asynchronous execution context.
    pub fn blocking_deregister(&self, token: &CaptureToken) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .blocking_send(ServiceCommand::Deregister {
                token: token.clone(),
                resp: tx,
            })
            .map_err(|_| CaptureError::unavailable("deregister"))?;
        rx.blocking_recv()
            .map_err(|_| CaptureError::unavailable("deregister"))
    }

    fn register_command(
        owner: &Owner,
        sink: &Sink,
        options: CaptureOptions,
        resp: oneshot::Sender<Result<CaptureToken>>,
    ) -> ServiceCommand {
        ServiceCommand::Register {
            liveness: owner.liveness(),
            sink: sink.clone(),
            options,
            resp,
        }
    }

    // -------------------------------------------------------------------------
    // Events and queries
    // -------------------------------------------------------------------------

    /// Deliver one event to every active capture, bypassing the facility
    ///
    /// This is the same entry point the installed handler uses.
    pub fn handle_event(&self, event: &LogEvent) -> DispatchReport {
        self.handler.handle_event(event)
    }

    /// # Errors
    /// - `ServiceUnavailable` if the actor is gone
    pub async fn stats(&self) -> Result<InterceptStats> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(ServiceCommand::Stats { resp: tx })
            .await
            .map_err(|_| CaptureError::unavailable("stats"))?;
        rx.await.map_err(|_| CaptureError::unavailable("stats"))
    }

    /// # Errors
    /// - `ServiceUnavailable` if the actor is gone
    pub async fn active_count(&self) -> Result<usize> {
        Ok(self.stats().await?.active)
    }
}

impl std::fmt::Debug for CaptureService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureService")
            .field("facility", &self.facility)
            .field("closed", &self.cmd_tx.is_closed())
            .finish()
    }
}
