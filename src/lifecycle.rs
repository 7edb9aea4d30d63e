//! Starting and stopping the managed resources
//!
//! Each resource is toggled independently. With watching enabled, its status
//! is polled on a fixed interval until the target status is reached or the
//! optional timeout runs out. One resource failing never affects another.

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::cloud::{CloudError, ResourceApi, ResourceKind, ResourceStatus};

/// What to do with a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Stop,
}

impl Action {
    /// Status that ends the watch for this action
    pub fn target_status(self, kind: ResourceKind) -> ResourceStatus {
        match (self, kind) {
            (Action::Stop, _) => ResourceStatus::Stopped,
            (Action::Start, ResourceKind::DbCluster) => ResourceStatus::Available,
            (Action::Start, ResourceKind::NotebookInstance) => ResourceStatus::InService,
        }
    }

    /// Whether the command must be issued given the current status
    fn needs_command(self, current: &ResourceStatus) -> bool {
        match self {
            Action::Start => *current == ResourceStatus::Stopped,
            Action::Stop => !matches!(current, ResourceStatus::Stopped | ResourceStatus::Stopping),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Start => write!(f, "start"),
            Action::Stop => write!(f, "stop"),
        }
    }
}

/// How several resources are toggled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// One thread per resource
    #[default]
    Concurrent,
    /// One resource after another
    Sequential,
}

/// Status polling options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Keep polling until the target status is reached
    pub watch: bool,
    /// Delay between polls
    pub interval: Duration,
    /// Give up watching after this long
    pub timeout: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            watch: false,
            interval: Duration::from_secs(3),
            timeout: None,
        }
    }
}

impl PollConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_watch(mut self, watch: bool) -> Self {
        self.watch = watch;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A managed resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub kind: ResourceKind,
    pub id: String,
}

impl Target {
    pub fn new(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// Errors from toggling a single resource
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Cloud(#[from] CloudError),

    #[error("{target} did not become {expected} within {elapsed:?} (last status: {last})")]
    TimedOut {
        target: Target,
        expected: ResourceStatus,
        last: ResourceStatus,
        elapsed: Duration,
    },

    #[error("worker for {target} panicked")]
    Panicked { target: Target },
}

/// Result of toggling one resource
#[derive(Debug)]
pub struct ToggleOutcome {
    pub target: Target,
    /// Last observed status on success
    pub result: Result<ResourceStatus, LifecycleError>,
}

impl ToggleOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Apply an action to one resource, then optionally watch it
pub fn toggle<A: ResourceApi + ?Sized>(
    api: &A,
    target: &Target,
    action: Action,
    poll: &PollConfig,
) -> Result<ResourceStatus, LifecycleError> {
    let mut status = api.status(target.kind, &target.id)?;

    if action.needs_command(&status) {
        tracing::info!(resource = %target, "executing {} command", action);
        match action {
            Action::Start => api.start(target.kind, &target.id)?,
            Action::Stop => api.stop(target.kind, &target.id)?,
        }
        status = api.status(target.kind, &target.id)?;
    }

    let expected = action.target_status(target.kind);
    let started = Instant::now();
    while poll.watch && status != expected {
        if let Some(timeout) = poll.timeout {
            let elapsed = started.elapsed();
            if elapsed >= timeout {
                return Err(LifecycleError::TimedOut {
                    target: target.clone(),
                    expected,
                    last: status,
                    elapsed,
                });
            }
        }
        thread::sleep(poll.interval);
        status = api.status(target.kind, &target.id)?;
        tracing::info!(resource = %target, %status, "{} is {}", target, status);
    }

    tracing::info!(resource = %target, %status, "{} is {}", target, status);
    Ok(status)
}

/// Apply an action to every target
///
/// Failures are logged and returned per target; they never stop the other
/// targets. Outcomes are returned in target order.
pub fn toggle_all<A: ResourceApi + Sync + ?Sized>(
    api: &A,
    targets: &[Target],
    action: Action,
    poll: &PollConfig,
    mode: Mode,
) -> Vec<ToggleOutcome> {
    let outcomes: Vec<ToggleOutcome> = match mode {
        Mode::Sequential => targets
            .iter()
            .map(|target| ToggleOutcome {
                target: target.clone(),
                result: toggle(api, target, action, poll),
            })
            .collect(),
        Mode::Concurrent => thread::scope(|scope| {
            let handles: Vec<_> = targets
                .iter()
                .map(|target| (target, scope.spawn(move || toggle(api, target, action, poll))))
                .collect();
            handles
                .into_iter()
                .map(|(target, handle)| ToggleOutcome {
                    target: target.clone(),
                    result: handle.join().unwrap_or_else(|_| {
                        Err(LifecycleError::Panicked {
                            target: target.clone(),
                        })
                    }),
                })
                .collect()
        }),
    };

    for outcome in &outcomes {
        if let Err(e) = &outcome.result {
            tracing::error!(
                resource = %outcome.target,
                error = %e,
                "failed to {} {}",
                action,
                outcome.target
            );
        }
    }
    outcomes
}
