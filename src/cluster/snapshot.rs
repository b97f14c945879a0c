use k8s_openapi::api::core::v1::{ContainerStatus as K8sContainerStatus, Pod};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::ResourceExt;
use time::OffsetDateTime;

use crate::types::{ContainerState, ContainerStatus, PodCondition, PodKey, PodPhase, StatusSnapshot};

/// Identity of a pod delivered by the API server. Pods without a UID are not
/// trackable and yield None.
pub fn pod_key(pod: &Pod, namespace: &str) -> Option<PodKey> {
    let uid = pod.metadata.uid.clone()?;
    Some(PodKey {
        namespace: namespace.to_string(),
        name: pod.name_any(),
        uid,
    })
}

/// Convert an API pod into the crate's own snapshot type. Partially populated
/// status objects are normal during scheduling; every missing field maps to
/// an empty list or None, never an error.
pub fn snapshot_of(pod: &Pod) -> StatusSnapshot {
    let status = pod.status.as_ref();

    let phase = status
        .and_then(|s| s.phase.as_deref())
        .map(phase_of)
        .unwrap_or(PodPhase::Unknown);

    let conditions = status
        .and_then(|s| s.conditions.as_ref())
        .map(|conds| {
            conds
                .iter()
                .map(|c| PodCondition {
                    kind: c.type_.clone(),
                    status: c.status == "True",
                    last_transition: c.last_transition_time.as_ref().and_then(k8s_time),
                })
                .collect()
        })
        .unwrap_or_default();

    let containers = status
        .and_then(|s| s.container_statuses.as_ref())
        .map(|cs| cs.iter().map(container_status_of).collect())
        .unwrap_or_default();

    StatusSnapshot {
        phase,
        conditions,
        containers,
        node_name: pod.spec.as_ref().and_then(|s| s.node_name.clone()),
        created_at: pod.metadata.creation_timestamp.as_ref().and_then(k8s_time),
    }
}

fn phase_of(phase: &str) -> PodPhase {
    match phase {
        "Pending" => PodPhase::Pending,
        "Running" => PodPhase::Running,
        "Succeeded" => PodPhase::Succeeded,
        "Failed" => PodPhase::Failed,
        _ => PodPhase::Unknown,
    }
}

fn container_status_of(cs: &K8sContainerStatus) -> ContainerStatus {
    // Per the Kubernetes API at most one of running/terminated/waiting is
    // set; an empty state object means the container is still waiting.
    let state = match cs.state.as_ref() {
        Some(state) => {
            if let Some(running) = &state.running {
                ContainerState::Running {
                    started_at: running.started_at.as_ref().and_then(k8s_time),
                }
            } else if let Some(terminated) = &state.terminated {
                ContainerState::Terminated {
                    started_at: terminated.started_at.as_ref().and_then(k8s_time),
                    finished_at: terminated.finished_at.as_ref().and_then(k8s_time),
                }
            } else {
                ContainerState::Waiting
            }
        }
        None => ContainerState::Waiting,
    };

    ContainerStatus {
        name: cs.name.clone(),
        ready: cs.ready,
        state,
    }
}

fn k8s_time(t: &Time) -> Option<OffsetDateTime> {
    let nanos =
        i128::from(t.0.timestamp()) * 1_000_000_000 + i128::from(t.0.timestamp_subsec_nanos());
    OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()
}
