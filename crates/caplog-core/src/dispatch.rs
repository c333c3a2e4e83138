//! Per-event fan-out to active captures
//!
//! Registrations admitting the event are grouped by formatter identity. Each
//! group renders the event once and appends the same text to every sink in
//! the group. Groups run on scoped threads and are all joined before
//! [`dispatch`] returns; a single group renders on the calling thread.
//!
//! A failing group, whether its renderer returned an error or panicked, is
//! reported in the [`DispatchReport`] and does not affect the other groups.

use crate::coordinator::Registration;
use crate::sink::Sink;
use caplog_core_types::LogEvent;
use caplog_logging::FormatterIdentity;
use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, ScopedJoinHandle};

/// A render failure isolated to one formatter group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderFailure {
    pub formatter: String,
    pub error: String,
    /// Sinks in the group that received nothing for this event
    pub sinks: usize,
}

/// Outcome of dispatching one event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Distinct formatter identities among admitting registrations
    pub groups: usize,
    /// Appends that landed in an open sink
    pub delivered: usize,
    pub failures: Vec<RenderFailure>,
}

struct Group<'a> {
    formatter: &'a FormatterIdentity,
    sinks: Vec<&'a Sink>,
}

fn group_by_formatter<'a>(event: &LogEvent, registrations: &'a [Registration]) -> Vec<Group<'a>> {
    let mut groups: Vec<Group<'a>> = Vec::new();
    for registration in registrations.iter().filter(|r| r.admits(event.level)) {
        match groups
            .iter_mut()
            .find(|group| *group.formatter == registration.formatter)
        {
            Some(group) => group.sinks.push(&registration.sink),
            None => groups.push(Group {
                formatter: &registration.formatter,
                sinks: vec![&registration.sink],
            }),
        }
    }
    groups
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("renderer panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("renderer panicked: {}", s)
    } else {
        "renderer panicked".to_string()
    }
}

fn group_failure(group: &Group<'_>, error: String) -> RenderFailure {
    RenderFailure {
        formatter: group.formatter.name().to_string(),
        error,
        sinks: group.sinks.len(),
    }
}

fn run_group(event: &LogEvent, group: &Group<'_>) -> Result<usize, RenderFailure> {
    match panic::catch_unwind(AssertUnwindSafe(|| group.formatter.render(event))) {
        Ok(Ok(text)) => Ok(group.sinks.iter().filter(|sink| sink.append(&text)).count()),
        Ok(Err(e)) => Err(group_failure(group, e.to_string())),
        Err(payload) => Err(group_failure(group, panic_message(payload.as_ref()))),
    }
}

type GroupOutcome = Result<usize, RenderFailure>;

/// Wait for one group's render thread; a thread that never started fails its group
fn join_group(
    group: &Group<'_>,
    spawned: io::Result<ScopedJoinHandle<'_, GroupOutcome>>,
) -> GroupOutcome {
    match spawned {
        Ok(task) => task
            .join()
            .unwrap_or_else(|payload| Err(group_failure(group, panic_message(payload.as_ref())))),
        Err(e) => Err(group_failure(group, format!("failed to spawn render thread: {}", e))),
    }
}

/// Render `event` once per formatter group and deliver it to every admitting sink
pub fn dispatch(event: &LogEvent, registrations: &[Registration]) -> DispatchReport {
    let groups = group_by_formatter(event, registrations);

    let outcomes: Vec<GroupOutcome> = match groups.as_slice() {
        [] => Vec::new(),
        [only] => vec![run_group(event, only)],
        _ => thread::scope(|scope| {
            let tasks: Vec<_> = groups
                .iter()
                .map(|group| {
                    thread::Builder::new()
                        .name("caplog-render".to_string())
                        .spawn_scoped(scope, move || run_group(event, group))
                })
                .collect();
            tasks
                .into_iter()
                .zip(&groups)
                .map(|(spawned, group)| join_group(group, spawned))
                .collect()
        }),
    };

    let mut report = DispatchReport {
        groups: groups.len(),
        ..DispatchReport::default()
    };
    for outcome in outcomes {
        match outcome {
            Ok(delivered) => report.delivered += delivered,
            Err(failure) => report.failures.push(failure),
        }
    }
    report
}
