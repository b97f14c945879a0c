use time::OffsetDateTime;

use crate::types::{ContainerState, StatusSnapshot};

/// Timestamps the orchestrator reported for one container. Every field may be
/// absent; nothing is inferred.
#[derive(Clone, Copy, Debug, Default)]
pub struct ContainerTimes {
    pub running_started_at: Option<OffsetDateTime>,
    pub terminated_started_at: Option<OffsetDateTime>,
    pub terminated_finished_at: Option<OffsetDateTime>,
}

/// Scan the snapshot's container statuses for an exact name match. A missing
/// container is not an error; statuses may simply not be reported yet.
pub fn container_times(snapshot: &StatusSnapshot, container: &str) -> ContainerTimes {
    let Some(status) = snapshot.containers.iter().find(|c| c.name == container) else {
        return ContainerTimes::default();
    };

    match status.state {
        ContainerState::Waiting => ContainerTimes::default(),
        ContainerState::Running { started_at } => ContainerTimes {
            running_started_at: started_at,
            ..Default::default()
        },
        ContainerState::Terminated {
            started_at,
            finished_at,
        } => ContainerTimes {
            terminated_started_at: started_at,
            terminated_finished_at: finished_at,
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContainerStatus, PodPhase};

    fn snapshot(containers: Vec<ContainerStatus>) -> StatusSnapshot {
        StatusSnapshot {
            phase: PodPhase::Running,
            conditions: vec![],
            containers,
            node_name: None,
            created_at: None,
        }
    }

    fn ts(secs: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(secs).unwrap()
    }

    #[test]
    fn missing_container_yields_no_timestamps() {
        let snap = snapshot(vec![ContainerStatus {
            name: "other".into(),
            ready: true,
            state: ContainerState::Running {
                started_at: Some(ts(100)),
            },
        }]);

        let times = container_times(&snap, "app");
        assert!(times.running_started_at.is_none());
        assert!(times.terminated_started_at.is_none());
        assert!(times.terminated_finished_at.is_none());
    }

    #[test]
    fn terminated_container_reports_both_ends() {
        let snap = snapshot(vec![ContainerStatus {
            name: "app".into(),
            ready: false,
            state: ContainerState::Terminated {
                started_at: Some(ts(100)),
                finished_at: Some(ts(130)),
            },
        }]);

        let times = container_times(&snap, "app");
        assert_eq!(times.terminated_started_at, Some(ts(100)));
        assert_eq!(times.terminated_finished_at, Some(ts(130)));
        assert!(times.running_started_at.is_none());
    }

    #[test]
    fn name_match_is_exact() {
        let snap = snapshot(vec![ContainerStatus {
            name: "app-sidecar".into(),
            ready: true,
            state: ContainerState::Running {
                started_at: Some(ts(100)),
            },
        }]);

        assert!(container_times(&snap, "app").running_started_at.is_none());
    }
}
