use std::time::Duration;

use k8s_openapi::api::core::v1::Pod;
use kube::api::ListParams;
use kube::core::ErrorResponse;
use kube::{Api, Client, ResourceExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::cluster::snapshot;
use crate::types::{PodUpdate, WorkloadKind, WorkloadSpec};

/// Poll delivery: fetch the current snapshot per tracked pod at a fixed
/// interval. No concurrency hazards, at the cost of the tick's latency and
/// extra API load. Fetch failures are transient; the next tick retries.
pub fn spawn_poll_loop(
    client: Client,
    config: Config,
    tx: mpsc::Sender<PodUpdate>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let api: Api<Pod> = Api::namespaced(client, &config.namespace);

        loop {
            for spec in &config.workloads {
                match fetch(&api, config.kind, spec).await {
                    Ok(Some(pod)) => {
                        let Some(key) = snapshot::pod_key(&pod, &config.namespace) else {
                            continue;
                        };
                        let update = PodUpdate {
                            workload: spec.name.clone(),
                            pod: key,
                            snapshot: snapshot::snapshot_of(&pod),
                        };
                        if tx.send(update).await.is_err() {
                            return; // coordinator is done
                        }
                    }
                    Ok(None) => {
                        tracing::debug!(workload = %spec.name, "pod not visible yet");
                    }
                    Err(e) => {
                        tracing::warn!(
                            workload = %spec.name,
                            error = %e,
                            "poll fetch failed; retrying next tick"
                        );
                    }
                }
            }

            sleep_or_cancel(config.poll_interval, &cancel).await;
            if cancel.is_cancelled() {
                return;
            }
        }
    })
}

async fn fetch(
    api: &Api<Pod>,
    kind: WorkloadKind,
    spec: &WorkloadSpec,
) -> Result<Option<Pod>, kube::Error> {
    match kind {
        WorkloadKind::Pod => match api.get(&spec.name).await {
            Ok(pod) => Ok(Some(pod)),
            Err(kube::Error::Api(ErrorResponse { code: 404, .. })) => Ok(None),
            Err(e) => Err(e),
        },
        // The job controller names its pod; find it by label.
        WorkloadKind::Job => {
            let lp = ListParams::default()
                .labels(&format!("{}={}", crate::workload::JOB_NAME_LABEL, spec.name));
            let list = api.list(&lp).await?;
            let mut pods = list.items;
            pods.sort_by_key(|p| p.name_any());
            Ok(pods.into_iter().next())
        }
    }
}

async fn sleep_or_cancel(d: Duration, cancel: &CancellationToken) {
    tokio::select! {
        _ = sleep(d) => {}
        _ = cancel.cancelled() => {}
    }
}
