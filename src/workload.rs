use std::collections::BTreeMap;

use k8s_openapi::api::batch::v1::{Job, JobSpec};
use k8s_openapi::api::core::v1::{Container, Pod, PodSpec, PodTemplateSpec};
use kube::api::{DeleteParams, ObjectMeta, PostParams};
use kube::core::ErrorResponse;
use kube::{Api, Client};
use tracing::{debug, info, warn};

use crate::errors::{AppError, AppResult};
use crate::types::{WorkloadKind, WorkloadSpec};

/// Label the job controller stamps on the pods it spawns.
pub const JOB_NAME_LABEL: &str = "job-name";

fn container_of(spec: &WorkloadSpec) -> Container {
    Container {
        name: spec.container.clone(),
        image: Some(spec.image.clone()),
        command: if spec.command.is_empty() {
            None
        } else {
            Some(spec.command.clone())
        },
        ..Default::default()
    }
}

pub fn pod_manifest(spec: &WorkloadSpec) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(spec.name.clone()),
            ..Default::default()
        },
        spec: Some(PodSpec {
            containers: vec![container_of(spec)],
            restart_policy: Some("Never".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn job_manifest(spec: &WorkloadSpec) -> Job {
    Job {
        metadata: ObjectMeta {
            name: Some(spec.name.clone()),
            ..Default::default()
        },
        spec: Some(JobSpec {
            // One attempt; retries would fold a second pull/start into the
            // measurement.
            backoff_limit: Some(0),
            template: PodTemplateSpec {
                metadata: None,
                spec: Some(PodSpec {
                    containers: vec![container_of(spec)],
                    restart_policy: Some("Never".to_string()),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Fire-and-forget creation. A failure here is fatal to the whole session;
/// the caller deletes anything already created in the same batch.
pub async fn submit(
    client: Client,
    namespace: &str,
    kind: WorkloadKind,
    spec: &WorkloadSpec,
) -> AppResult<()> {
    let pp = PostParams::default();
    let result = match kind {
        WorkloadKind::Pod => {
            let api: Api<Pod> = Api::namespaced(client, namespace);
            api.create(&pp, &pod_manifest(spec)).await.map(|_| ())
        }
        WorkloadKind::Job => {
            let api: Api<Job> = Api::namespaced(client, namespace);
            api.create(&pp, &job_manifest(spec)).await.map(|_| ())
        }
    };

    match result {
        Ok(()) => {
            info!(workload = %spec.name, kind = ?kind, "created workload");
            Ok(())
        }
        Err(e) => Err(AppError::Create {
            workload: spec.name.clone(),
            reason: e.to_string(),
        }),
    }
}

/// Resolve which tracked workload an incoming pod belongs to: bare pods match
/// by exact name, job pods by the job-name label.
pub fn workload_for<'a>(
    workloads: &'a [WorkloadSpec],
    kind: WorkloadKind,
    pod_name: &str,
    labels: &BTreeMap<String, String>,
) -> Option<&'a WorkloadSpec> {
    match kind {
        WorkloadKind::Pod => workloads.iter().find(|w| w.name == pod_name),
        WorkloadKind::Job => {
            let job = labels.get(JOB_NAME_LABEL)?;
            workloads.iter().find(|w| &w.name == job)
        }
    }
}

/// Delete whatever the workload created. A missing resource is success (the
/// cluster may have collected it first); any other failure is logged so
/// operators know a resource may be orphaned, and never affects the exit
/// status.
pub async fn cleanup(
    client: Client,
    namespace: &str,
    kind: WorkloadKind,
    workload: &str,
    pod_name: Option<&str>,
) {
    let dp = DeleteParams::default();

    if kind == WorkloadKind::Job {
        let api: Api<Job> = Api::namespaced(client.clone(), namespace);
        log_delete("job", workload, api.delete(workload, &dp).await);
    }

    let pod = match kind {
        WorkloadKind::Pod => Some(workload),
        WorkloadKind::Job => pod_name,
    };
    if let Some(pod) = pod {
        let api: Api<Pod> = Api::namespaced(client, namespace);
        log_delete("pod", pod, api.delete(pod, &dp).await);
    }
}

fn log_delete<T>(what: &str, name: &str, result: Result<T, kube::Error>) {
    match result {
        Ok(_) => info!(%what, %name, "deleted"),
        Err(kube::Error::Api(ErrorResponse { code: 404, .. })) => {
            debug!(%what, %name, "already gone")
        }
        Err(e) => warn!(%what, %name, error = %e, "delete failed; resource may be orphaned"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs() -> Vec<WorkloadSpec> {
        vec![
            WorkloadSpec::new("bin-bash", "busybox", vec![]),
            WorkloadSpec::new("python-print", "busybox", vec![]),
        ]
    }

    #[test]
    fn bare_pods_match_by_exact_name() {
        let workloads = specs();
        let labels = BTreeMap::new();

        let found = workload_for(&workloads, WorkloadKind::Pod, "python-print", &labels);
        assert_eq!(found.map(|w| w.name.as_str()), Some("python-print"));
        assert!(workload_for(&workloads, WorkloadKind::Pod, "python", &labels).is_none());
    }

    #[test]
    fn job_pods_match_by_job_name_label() {
        let workloads = specs();
        let labels =
            BTreeMap::from([(JOB_NAME_LABEL.to_string(), "bin-bash".to_string())]);

        let found = workload_for(&workloads, WorkloadKind::Job, "bin-bash-x7k2p", &labels);
        assert_eq!(found.map(|w| w.name.as_str()), Some("bin-bash"));

        let unlabeled = BTreeMap::new();
        assert!(workload_for(&workloads, WorkloadKind::Job, "bin-bash-x7k2p", &unlabeled).is_none());
    }

    #[test]
    fn manifests_carry_the_tracked_container() {
        let spec = WorkloadSpec::new("w", "busybox", vec!["sh".into(), "-c".into(), "true".into()]);

        let pod = pod_manifest(&spec);
        let containers = pod.spec.unwrap().containers;
        assert_eq!(containers.len(), 1);
        assert_eq!(containers[0].name, "w");
        assert_eq!(containers[0].command.as_ref().unwrap().len(), 3);

        let job = job_manifest(&spec);
        let tmpl = job.spec.unwrap().template.spec.unwrap();
        assert_eq!(tmpl.containers[0].name, "w");
        assert_eq!(tmpl.restart_policy.as_deref(), Some("Never"));
    }
}
