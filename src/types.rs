use std::time::{Duration, Instant};

use serde::Serialize;
use time::OffsetDateTime;

/// Pod identity (use UID to avoid confusing replaced pods).
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct PodKey {
    pub namespace: String,
    pub name: String,
    pub uid: String,
}

/// One workload to submit and time. The container whose lifecycle is
/// authoritative for timing carries the workload's own name.
#[derive(Clone, Debug)]
pub struct WorkloadSpec {
    pub name: String,
    pub container: String,
    pub image: String,
    pub command: Vec<String>,
}

impl WorkloadSpec {
    pub fn new(name: impl Into<String>, image: impl Into<String>, command: Vec<String>) -> Self {
        let name = name.into();
        Self {
            container: name.clone(),
            name,
            image: image.into(),
            command,
        }
    }
}

/// How each workload is submitted to the cluster.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkloadKind {
    Pod,
    Job,
}

/// Pod phase as reported by the orchestrator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

/// A single pod condition. `last_transition` is the orchestrator's own
/// transition time, kept only for drift logging against our observation
/// clock.
#[derive(Clone, Debug)]
pub struct PodCondition {
    pub kind: String,
    pub status: bool,
    pub last_transition: Option<OffsetDateTime>,
}

pub const COND_POD_SCHEDULED: &str = "PodScheduled";

/// Container state variant from a status snapshot. Timestamps are the
/// orchestrator's wall clocks and may be missing.
#[derive(Clone, Debug)]
pub enum ContainerState {
    Waiting,
    Running {
        started_at: Option<OffsetDateTime>,
    },
    Terminated {
        started_at: Option<OffsetDateTime>,
        finished_at: Option<OffsetDateTime>,
    },
}

#[derive(Clone, Debug)]
pub struct ContainerStatus {
    pub name: String,
    pub ready: bool,
    pub state: ContainerState,
}

/// Immutable point-in-time view of a pod, decoupled from the wire types so
/// the tracker can be driven without a cluster.
#[derive(Clone, Debug)]
pub struct StatusSnapshot {
    pub phase: PodPhase,
    pub conditions: Vec<PodCondition>,
    pub containers: Vec<ContainerStatus>,
    pub node_name: Option<String>,
    pub created_at: Option<OffsetDateTime>,
}

/// A free-text cluster event tied to an object.
#[derive(Clone, Debug)]
pub struct EventRecord {
    pub reason: String,
    pub message: String,
    pub object_kind: String,
    pub object_name: String,
}

/// One observation instant sampled on both clocks: the monotonic half is for
/// interval math, the wall half for reporting.
#[derive(Clone, Copy, Debug)]
pub struct Stamp {
    pub mono: Instant,
    pub wall: OffsetDateTime,
}

impl Stamp {
    pub fn now() -> Self {
        Self {
            mono: Instant::now(),
            wall: OffsetDateTime::now_utc(),
        }
    }
}

/// Final outcome of a tracked workload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Succeeded,
    Failed,
    Aborted,
}

/// Derived timing output for one tracked pod. Absence of a metric is
/// explicit, never zero.
#[derive(Clone, Debug)]
pub struct MetricSet {
    pub scheduling_delay: Option<Duration>,
    pub image_pull: Option<String>,
    pub container_start_delay: Option<Duration>,
    pub total_run: Option<Duration>,
    pub outcome: Outcome,
}

impl MetricSet {
    pub fn aborted() -> Self {
        Self {
            scheduling_delay: None,
            image_pull: None,
            container_start_delay: None,
            total_run: None,
            outcome: Outcome::Aborted,
        }
    }
}

/// Snapshot delivery message: emitted by a snapshot source (watch, poll or
/// dev scenario) and consumed by the run coordinator.
#[derive(Clone, Debug)]
pub struct PodUpdate {
    pub workload: String,
    pub pod: PodKey,
    pub snapshot: StatusSnapshot,
}
