//! Install/restore state machine for the facility's handler slots
//!
//! ```text
//!            install (0 -> 1 registrations)
//!   Idle ───────────────────────────────────► Installed { saved }
//!    ▲                                              │
//!    └──────────────────────────────────────────────┘
//!            restore (1 -> 0 registrations)
//! ```
//!
//! Installing saves and removes the `default` slot and puts the capture
//! handler into the `capture` slot. Restoring removes the capture handler and
//! puts the saved config back unchanged, or leaves `default` empty if there
//! was none.

use caplog_core_types::schema::INTERNAL_TARGET;
use caplog_core_types::HandlerId;
use caplog_logging::{FormatterIdentity, HandlerConfig, LogFacility};
use std::sync::Arc;

#[derive(Debug)]
enum InterceptState {
    Idle,
    Installed { saved: Option<HandlerConfig> },
}

/// Counters describing the intercept's history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterceptStats {
    /// Registrations currently active
    pub active: usize,
    /// Whether the capture handler is currently installed
    pub installed: bool,
    /// Number of Idle -> Installed transitions so far
    pub installs: u64,
    /// Number of Installed -> Idle transitions so far
    pub restores: u64,
}

#[derive(Debug)]
pub(crate) struct Intercept {
    facility: Arc<LogFacility>,
    state: InterceptState,
    installs: u64,
    restores: u64,
}

impl Intercept {
    pub(crate) fn new(facility: Arc<LogFacility>) -> Self {
        Self {
            facility,
            state: InterceptState::Idle,
            installs: 0,
            restores: 0,
        }
    }

    pub(crate) fn is_installed(&self) -> bool {
        matches!(self.state, InterceptState::Installed { .. })
    }

    /// Idle -> Installed; a no-op when already installed
    pub(crate) fn install(&mut self, capture: HandlerConfig) {
        if self.is_installed() {
            return;
        }
        let saved = self.facility.remove_handler(&HandlerId::default_handler());
        self.facility.set_handler(capture);
        tracing::debug!(
            target: INTERNAL_TARGET,
            saved_default = saved.is_some(),
            "Installed capture handler"
        );
        self.state = InterceptState::Installed { saved };
        self.installs += 1;
    }

    /// Installed -> Idle; a no-op when idle
    pub(crate) fn restore(&mut self) {
        let InterceptState::Installed { saved } =
            std::mem::replace(&mut self.state, InterceptState::Idle)
        else {
            return;
        };
        self.facility.remove_handler(&HandlerId::capture_handler());
        let had_default = saved.is_some();
        if let Some(saved) = saved {
            self.facility.set_handler(saved);
        }
        tracing::debug!(
            target: INTERNAL_TARGET,
            restored_default = had_default,
            "Removed capture handler"
        );
        self.restores += 1;
    }

    /// The process-wide default formatter, whether or not it is saved away
    pub(crate) fn default_formatter(&self) -> Option<FormatterIdentity> {
        match &self.state {
            InterceptState::Idle => self.facility.default_formatter(),
            InterceptState::Installed { saved } => {
                saved.as_ref().and_then(|config| config.formatter.clone())
            }
        }
    }

    pub(crate) fn stats(&self, active: usize) -> InterceptStats {
        InterceptStats {
            active,
            installed: self.is_installed(),
            installs: self.installs,
            restores: self.restores,
        }
    }
}
