use std::time::Duration;

use tracing::{info, warn};

use crate::track::extract::container_times;
use crate::track::metrics::{duration, wall_duration, InvalidInterval};
use crate::types::{
    ContainerState, MetricSet, Outcome, PodPhase, Stamp, StatusSnapshot, COND_POD_SCHEDULED,
};

/// Lifecycle progress as observed by this process (distinct from the
/// orchestrator-reported phase).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackPhase {
    Unscheduled,
    Scheduled,
    Running,
    Succeeded,
    Failed,
}

/// Per-pod tracking state. Stamps are set once and never overwritten;
/// `terminal_handled` flips false -> true exactly once.
#[derive(Debug)]
pub struct TrackingState {
    pub phase_observed: TrackPhase,
    pub first_seen: Option<Stamp>,
    pub scheduled_at: Option<Stamp>,
    pub run_started_at: Option<Stamp>,
    pub completed_at: Option<Stamp>,
    pub terminal_handled: bool,
}

impl TrackingState {
    fn new() -> Self {
        Self {
            phase_observed: TrackPhase::Unscheduled,
            first_seen: None,
            scheduled_at: None,
            run_started_at: None,
            completed_at: None,
            terminal_handled: false,
        }
    }
}

/// What a single snapshot meant for the tracked pod.
#[derive(Debug)]
pub enum Observation {
    /// Nothing noteworthy, or a duplicate/late delivery after terminal.
    None,
    /// The scheduling baseline was just established.
    Scheduled,
    /// The tracked container is up. Informational and repeatable; both fields
    /// are absent when their baseline is missing.
    Running {
        startup_delay: Option<Duration>,
        pull_estimate: Option<Duration>,
    },
    /// Terminal outcome, emitted exactly once per pod. The image-pull field
    /// is left unset; the coordinator fills it from the event log.
    Terminal(MetricSet),
}

/// The lifecycle state machine for one tracked pod. Feed it every status
/// snapshot in delivery order; it decides which transitions matter, stamps
/// observation times and detects the terminal outcome exactly once.
pub struct LifecycleTracker {
    workload: String,
    container: String,
    state: TrackingState,
}

impl LifecycleTracker {
    pub fn new(workload: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            workload: workload.into(),
            container: container.into(),
            state: TrackingState::new(),
        }
    }

    pub fn state(&self) -> &TrackingState {
        &self.state
    }

    pub fn terminal_handled(&self) -> bool {
        self.state.terminal_handled
    }

    pub fn observe(&mut self, snapshot: &StatusSnapshot) -> Observation {
        if self.state.terminal_handled {
            return Observation::None;
        }

        let now = Stamp::now();
        if self.state.first_seen.is_none() {
            self.state.first_seen = Some(now);
        }

        // Scheduling baseline: exactly one condition, PodScheduled, true.
        // Any other condition-list shape means the status object is still
        // being populated and the pod counts as not yet scheduled.
        if self.state.scheduled_at.is_none() {
            if let [cond] = snapshot.conditions.as_slice() {
                if cond.kind == COND_POD_SCHEDULED && cond.status {
                    self.state.scheduled_at = Some(now);
                    if self.state.phase_observed == TrackPhase::Unscheduled {
                        self.state.phase_observed = TrackPhase::Scheduled;
                    }
                    info!(
                        workload = %self.workload,
                        node = snapshot.node_name.as_deref().unwrap_or("<unknown>"),
                        observed = %now.wall,
                        reported = ?cond.last_transition,
                        "pod scheduled"
                    );
                    return Observation::Scheduled;
                }
            }
        }

        match snapshot.phase {
            PodPhase::Running => self.observe_running(snapshot, now),
            PodPhase::Succeeded | PodPhase::Failed => self.observe_terminal(snapshot, now),
            PodPhase::Pending | PodPhase::Unknown => Observation::None,
        }
    }

    fn observe_running(&mut self, snapshot: &StatusSnapshot, now: Stamp) -> Observation {
        self.state.phase_observed = TrackPhase::Running;

        let up = snapshot
            .containers
            .iter()
            .find(|c| c.name == self.container)
            .map(|c| c.ready || matches!(c.state, ContainerState::Running { .. }))
            .unwrap_or(false);
        if !up {
            return Observation::None;
        }

        if self.state.run_started_at.is_none() {
            self.state.run_started_at = Some(now);
        }

        // Startup delay so far, measured on our own clock. Without a
        // scheduling baseline there is nothing to measure against.
        let startup_delay = self
            .state
            .scheduled_at
            .and_then(|s| best_effort("startup_delay", duration(s.mono, now.mono)));

        // Cross-check on the orchestrator's clocks: container start vs pod
        // creation approximates the image pull.
        let times = container_times(snapshot, &self.container);
        let pull_estimate = match (snapshot.created_at, times.running_started_at) {
            (Some(created), Some(started)) => {
                best_effort("pull_estimate", wall_duration(created, started))
            }
            _ => None,
        };

        info!(
            workload = %self.workload,
            startup_delay_ms = startup_delay.map(|d| d.as_millis() as u64),
            pull_estimate_ms = pull_estimate.map(|d| d.as_millis() as u64),
            "container running"
        );

        Observation::Running {
            startup_delay,
            pull_estimate,
        }
    }

    fn observe_terminal(&mut self, snapshot: &StatusSnapshot, now: Stamp) -> Observation {
        let outcome = if snapshot.phase == PodPhase::Succeeded {
            self.state.phase_observed = TrackPhase::Succeeded;
            Outcome::Succeeded
        } else {
            self.state.phase_observed = TrackPhase::Failed;
            Outcome::Failed
        };
        self.state.completed_at = Some(now);
        self.state.terminal_handled = true;

        let times = container_times(snapshot, &self.container);
        if let Some(finished) = times.terminated_finished_at {
            info!(
                workload = %self.workload,
                observed = %now.wall,
                reported_started = ?times.terminated_started_at,
                reported_finished = %finished,
                "container terminated"
            );
        }

        let scheduling_delay = match (self.state.scheduled_at, self.state.run_started_at) {
            (Some(scheduled), Some(run)) => {
                best_effort("scheduling_delay", duration(scheduled.mono, run.mono))
            }
            _ => None,
        };

        // Container start on the orchestrator's clock vs our scheduling
        // observation (pod creation when scheduling was never observed).
        let wall_baseline = self
            .state
            .scheduled_at
            .map(|s| s.wall)
            .or(snapshot.created_at);
        let container_start_delay = match (wall_baseline, times.terminated_started_at) {
            (Some(baseline), Some(started)) => {
                best_effort("container_start_delay", wall_duration(baseline, started))
            }
            _ => None,
        };

        // Earliest baseline we managed to observe; first sight of the pod is
        // the fallback of last resort.
        let baseline = self
            .state
            .scheduled_at
            .or(self.state.run_started_at)
            .or(self.state.first_seen);
        let total_run = baseline.and_then(|b| best_effort("total_run", duration(b.mono, now.mono)));

        Observation::Terminal(MetricSet {
            scheduling_delay,
            image_pull: None,
            container_start_delay,
            total_run,
            outcome,
        })
    }
}

fn best_effort(metric: &str, result: Result<Duration, InvalidInterval>) -> Option<Duration> {
    match result {
        Ok(d) => Some(d),
        Err(e) => {
            warn!(metric, error = %e, "negative interval; metric unavailable");
            None
        }
    }
}
