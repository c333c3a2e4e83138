#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use caplog_core::{
    CaptureOptions, CaptureService, CaptureToken, LogFacility, Owner, ServiceConfig, Sink,
};
use caplog_core_types::HandlerId;
use common::wait_for_stats;
use proptest::prelude::*;
use proptest::sample::Index;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Op {
    /// Register a capture for a fresh owner
    Register,
    /// Deregister one live capture explicitly
    Deregister(Index),
    /// Drop one live capture's owner without deregistering
    DropOwner(Index),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => Just(Op::Register),
        1 => any::<Index>().prop_map(Op::Deregister),
        1 => any::<Index>().prop_map(Op::DropOwner),
    ]
}

struct Live {
    token: CaptureToken,
    sink: Sink,
    owner: Owner,
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Installs happen exactly on 0 -> 1 edges and restores exactly on 1 -> 0 edges
    #[test]
    fn prop_intercept_follows_empty_transitions(
        ops in prop::collection::vec(op_strategy(), 1..40),
    ) {
        tokio_test::block_on(async {
            let facility = Arc::new(LogFacility::with_console());
            let original = facility.handler(&HandlerId::default_handler()).unwrap();
            let service =
                CaptureService::start(facility.clone(), ServiceConfig::default()).unwrap();
            let mut live: Vec<Live> = Vec::new();
            let (mut installs, mut restores) = (0u64, 0u64);

            for op in ops {
                match op {
                    Op::Register => {
                        let owner = Owner::new();
                        let sink = Sink::new();
                        let token = service
                            .register(&owner, &sink, CaptureOptions::new())
                            .await
                            .unwrap();
                        if live.is_empty() {
                            installs += 1;
                        }
                        live.push(Live { token, sink, owner });
                    }
                    Op::Deregister(_) | Op::DropOwner(_) if live.is_empty() => {
                        service.deregister(&CaptureToken::new()).await.unwrap();
                    }
                    Op::Deregister(index) => {
                        let entry = live.remove(index.index(live.len()));
                        service.deregister(&entry.token).await.unwrap();
                        assert!(entry.sink.is_closed());
                        if live.is_empty() {
                            restores += 1;
                        }
                    }
                    Op::DropOwner(index) => {
                        let entry = live.remove(index.index(live.len()));
                        drop(entry.owner);
                        if live.is_empty() {
                            restores += 1;
                        }
                        let expected = live.len();
                        wait_for_stats(&service, |s| s.active == expected).await;
                        assert!(entry.sink.is_closed());
                    }
                }

                let stats = service.stats().await.unwrap();
                assert_eq!(stats.active, live.len());
                assert_eq!(stats.installed, !live.is_empty());
                assert_eq!(stats.installs, installs);
                assert_eq!(stats.restores, restores);
                assert_eq!(
                    facility.handler(&HandlerId::default_handler()).is_some(),
                    live.is_empty()
                );
            }

            for entry in live.drain(..) {
                service.deregister(&entry.token).await.unwrap();
            }
            let restored = facility.handler(&HandlerId::default_handler()).unwrap();
            assert!(restored.same_as(&original));
        });
    }
}

/// Owners on separate tasks register and leave in overlapping waves; the
/// counters must still match the edges of the active count, which here is
/// one 0 -> 1 edge per wave because every wave starts from an idle service.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_interleaved_owners_install_once_per_busy_period() {
    let facility = Arc::new(LogFacility::with_console());
    let service = CaptureService::start(facility.clone(), ServiceConfig::default()).unwrap();

    for wave in 1..=3u64 {
        let (release_tx, release_rx) = tokio::sync::watch::channel(false);
        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let service = service.clone();
                let mut release = release_rx.clone();
                tokio::spawn(async move {
                    let owner = Owner::new();
                    let token = service
                        .register(&owner, &Sink::new(), CaptureOptions::new())
                        .await
                        .unwrap();
                    release.changed().await.unwrap();
                    // Half leave explicitly, half by dropping their owner.
                    if i % 2 == 0 {
                        service.deregister(&token).await.unwrap();
                    }
                })
            })
            .collect();

        wait_for_stats(&service, |s| s.active == 8).await;
        let busy = service.stats().await.unwrap();
        assert_eq!(busy.installs, wave);
        assert_eq!(busy.restores, wave - 1);

        release_tx.send(true).unwrap();
        for task in tasks {
            task.await.unwrap();
        }

        let idle = wait_for_stats(&service, |s| s.active == 0).await;
        assert_eq!(idle.installs, wave);
        assert_eq!(idle.restores, wave);
        assert!(facility.handler(&HandlerId::default_handler()).is_some());
    }
}
