use futures::{pin_mut, StreamExt};
use k8s_openapi::api::core::v1::Pod;
use kube::{Api, Client, ResourceExt};
use kube_runtime::watcher;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::cluster::snapshot;
use crate::types::PodUpdate;
use crate::workload;

/// Push delivery: follow the namespace's pod stream and forward snapshots for
/// the pods that belong to tracked workloads. Watch errors are transient;
/// the stream recovers on its own, so they are logged and skipped.
pub fn spawn_pod_watcher(
    client: Client,
    config: Config,
    tx: mpsc::Sender<PodUpdate>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let api: Api<Pod> = Api::namespaced(client, &config.namespace);

        let stream = watcher(api, watcher::Config::default());
        pin_mut!(stream);

        loop {
            let item = tokio::select! {
                _ = cancel.cancelled() => return,
                item = stream.next() => item,
            };

            let Some(item) = item else {
                tracing::warn!("pod watch stream ended");
                return;
            };

            match item {
                Ok(watcher::Event::Applied(pod)) => forward(&config, &pod, &tx).await,
                Ok(watcher::Event::Restarted(pods)) => {
                    for pod in pods {
                        forward(&config, &pod, &tx).await;
                    }
                }
                // Deletion is the echo of our own cleanup; nothing to time.
                Ok(watcher::Event::Deleted(_)) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "watch delivery failed; continuing");
                }
            }
        }
    })
}

async fn forward(config: &Config, pod: &Pod, tx: &mpsc::Sender<PodUpdate>) {
    let name = pod.name_any();
    let Some(spec) = workload::workload_for(&config.workloads, config.kind, &name, pod.labels())
    else {
        return;
    };
    let Some(key) = snapshot::pod_key(pod, &config.namespace) else {
        return;
    };

    let update = PodUpdate {
        workload: spec.name.clone(),
        pod: key,
        snapshot: snapshot::snapshot_of(pod),
    };

    let _ = tx.send(update).await;
}
