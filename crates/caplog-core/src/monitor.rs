//! Liveness monitoring of capture owners
//!
//! An [`Owner`] is held by whoever registered a capture, a task or a plain
//! thread. Dropping it, whether by returning, unwinding from a panic or being
//! aborted, is what the service observes as owner termination. Each
//! registration gets its own [`Monitor`], which reports the termination to the
//! service exactly once unless it is cancelled first.

use caplog_core_types::{CaptureToken, OwnerId};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Identity of a capturing task or thread
#[derive(Debug)]
pub struct Owner {
    id: OwnerId,
    alive: watch::Sender<()>,
}

impl Owner {
    pub fn new() -> Self {
        let (alive, _) = watch::channel(());
        Self {
            id: OwnerId::next(),
            alive,
        }
    }

    pub fn id(&self) -> OwnerId {
        self.id
    }

    /// A handle that resolves once this owner is dropped
    pub fn liveness(&self) -> Liveness {
        Liveness {
            owner: self.id,
            alive: self.alive.subscribe(),
        }
    }
}

impl Default for Owner {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct Liveness {
    owner: OwnerId,
    alive: watch::Receiver<()>,
}

impl Liveness {
    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Wait until the owner has been dropped
    pub async fn terminated(mut self) {
        // The owner never sends, so `changed` only returns once the sender is gone.
        while self.alive.changed().await.is_ok() {}
    }
}

/// Watches one owner on behalf of one registration
#[derive(Debug)]
pub(crate) struct Monitor {
    task: JoinHandle<()>,
}

impl Monitor {
    /// Spawn on the current runtime; `token` is sent on `notify` when the owner ends
    pub(crate) fn spawn(
        liveness: Liveness,
        token: CaptureToken,
        notify: mpsc::UnboundedSender<CaptureToken>,
    ) -> Self {
        let task = tokio::spawn(async move {
            liveness.terminated().await;
            let _ = notify.send(token);
        });
        Self { task }
    }

    pub(crate) fn cancel(self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_monitor_fires_on_owner_drop() {
        let owner = Owner::new();
        let token = CaptureToken::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let _monitor = Monitor::spawn(owner.liveness(), token.clone(), tx);
        drop(owner);

        let fired = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap();
        assert_eq!(fired, Some(token));
    }

    #[tokio::test]
    async fn test_cancelled_monitor_does_not_fire() {
        let owner = Owner::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let monitor = Monitor::spawn(owner.liveness(), CaptureToken::new(), tx);
        monitor.cancel();
        tokio::task::yield_now().await;
        drop(owner);

        // The aborted task drops its sender, closing the channel without a message.
        let received = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap();
        assert_eq!(received, None);
    }

    #[tokio::test]
    async fn test_owner_dropped_by_panicking_task() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let token = CaptureToken::new();

        let task = tokio::spawn({
            let token = token.clone();
            async move {
                let owner = Owner::new();
                let _monitor = Monitor::spawn(owner.liveness(), token, tx);
                tokio::task::yield_now().await;
                panic!("work failed");
            }
        });
        assert!(task.await.is_err());

        let fired = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap();
        assert_eq!(fired, Some(token));
    }

    #[test]
    fn test_owner_ids_are_unique() {
        assert_ne!(Owner::new().id(), Owner::new().id());
    }
}
