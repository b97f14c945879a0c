use time::OffsetDateTime;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::types::{
    ContainerState, ContainerStatus, PodCondition, PodKey, PodPhase, PodUpdate, StatusSnapshot,
    COND_POD_SCHEDULED,
};

/// Simulated submission, mirroring the real contract: a failed create aborts
/// the batch after "deleting" whatever was already created.
pub fn submit_all(config: &Config) -> AppResult<()> {
    let mut created: Vec<&str> = Vec::new();

    for spec in &config.workloads {
        if config.dev.fail_create.as_deref() == Some(spec.name.as_str()) {
            tracing::error!(workload = %spec.name, "simulated create failure");
            for name in created {
                tracing::info!(workload = %name, "deleting previously created workload (dev)");
            }
            return Err(AppError::Create {
                workload: spec.name.clone(),
                reason: "simulated create failure".into(),
            });
        }

        tracing::info!(workload = %spec.name, "created workload (dev)");
        created.push(&spec.name);
    }

    Ok(())
}

/// Offline snapshot source: plays scheduled -> running -> terminal for every
/// workload, delivering the terminal snapshot twice the way a restarted watch
/// would.
pub fn spawn_dev_snapshots(config: Config, tx: mpsc::Sender<PodUpdate>) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!("starting dev-mode snapshot source");

        let rate = Duration::from_millis(config.dev.rate_ms.max(1));

        for spec in &config.workloads {
            let pod = PodKey {
                namespace: config.namespace.clone(),
                name: spec.name.clone(),
                uid: format!("dev-uid-{}", spec.name),
            };
            let created = OffsetDateTime::now_utc();

            let update = |snapshot: StatusSnapshot| PodUpdate {
                workload: spec.name.clone(),
                pod: pod.clone(),
                snapshot,
            };

            tx.send(update(scheduled(created))).await.ok();
            sleep(rate).await;

            let started = OffsetDateTime::now_utc();
            tx.send(update(running(&spec.container, created, started)))
                .await
                .ok();
            sleep(rate).await;

            let failed = config.dev.fail.as_deref() == Some(spec.name.as_str());
            tx.send(update(terminal(&spec.container, created, started, failed)))
                .await
                .ok();
            // Watch redelivery of the terminal snapshot.
            tx.send(update(terminal(&spec.container, created, started, failed)))
                .await
                .ok();
        }

        tracing::info!("dev-mode scenario finished");
    })
}

fn scheduled(created: OffsetDateTime) -> StatusSnapshot {
    StatusSnapshot {
        phase: PodPhase::Pending,
        conditions: vec![PodCondition {
            kind: COND_POD_SCHEDULED.into(),
            status: true,
            last_transition: Some(OffsetDateTime::now_utc()),
        }],
        containers: vec![],
        node_name: Some("dev-node".into()),
        created_at: Some(created),
    }
}

fn running(container: &str, created: OffsetDateTime, started: OffsetDateTime) -> StatusSnapshot {
    StatusSnapshot {
        phase: PodPhase::Running,
        conditions: vec![],
        containers: vec![ContainerStatus {
            name: container.into(),
            ready: true,
            state: ContainerState::Running {
                started_at: Some(started),
            },
        }],
        node_name: Some("dev-node".into()),
        created_at: Some(created),
    }
}

fn terminal(
    container: &str,
    created: OffsetDateTime,
    started: OffsetDateTime,
    failed: bool,
) -> StatusSnapshot {
    StatusSnapshot {
        phase: if failed {
            PodPhase::Failed
        } else {
            PodPhase::Succeeded
        },
        conditions: vec![],
        containers: vec![ContainerStatus {
            name: container.into(),
            ready: false,
            state: ContainerState::Terminated {
                started_at: Some(started),
                finished_at: Some(OffsetDateTime::now_utc()),
            },
        }],
        node_name: Some("dev-node".into()),
        created_at: Some(created),
    }
}
