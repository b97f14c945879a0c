pub mod cli;
pub mod cluster;
pub mod config;
pub mod dev;
pub mod errors;
pub mod events;
pub mod logging;
pub mod report;
pub mod shutdown;
pub mod track;
pub mod types;
pub mod watch;
pub mod workload;

use std::collections::HashMap;

use tokio::sync::mpsc;

use crate::config::{Config, DeliveryMode};
use crate::errors::{AppError, AppResult};
use crate::report::Report;
use crate::shutdown::{Shutdown, ShutdownReason};
use crate::track::tracker::{LifecycleTracker, Observation};
use crate::types::{MetricSet, Outcome, PodKey, PodUpdate, WorkloadSpec};

struct PodSession {
    tracker: LifecycleTracker,
    pod: Option<PodKey>,
    done: bool,
}

impl PodSession {
    fn new(spec: &WorkloadSpec) -> Self {
        Self {
            tracker: LifecycleTracker::new(&spec.name, &spec.container),
            pod: None,
            done: false,
        }
    }
}

/// Drive one measurement session: submit the workloads, feed their snapshots
/// through the lifecycle trackers, report and clean up each pod exactly once,
/// and exit when every tracked pod is terminal (or the operator aborts).
pub async fn run(config: Config) -> AppResult<()> {
    let shutdown = Shutdown::new();
    {
        let sd = shutdown.clone();
        tokio::spawn(async move {
            let reason = tokio::select! {
                r = shutdown::wait_ctrl_c(&sd) => r,
                r = shutdown::wait_sigterm(&sd) => r,
            };
            tracing::info!(reason = ?reason, "shutdown signal received");
        });
    }

    let (tx, mut rx) = mpsc::channel::<PodUpdate>(128);

    // Submit the batch and start the snapshot source. Creation is
    // fire-and-forget; a single failure aborts the session after cleaning up
    // whatever was already created.
    let client = if config.dev.enabled {
        dev::scenario::submit_all(&config)?;
        dev::scenario::spawn_dev_snapshots(config.clone(), tx.clone());
        None
    } else {
        let client = cluster::client::make_client().await?;
        submit_batch(&client, &config).await?;

        match config.mode {
            DeliveryMode::Watch => {
                watch::watcher::spawn_pod_watcher(
                    client.clone(),
                    config.clone(),
                    tx.clone(),
                    shutdown.token(),
                );
            }
            DeliveryMode::Poll => {
                watch::poll::spawn_poll_loop(
                    client.clone(),
                    config.clone(),
                    tx.clone(),
                    shutdown.token(),
                );
            }
        }
        Some(client)
    };
    drop(tx);

    let mut sessions: HashMap<String, PodSession> = config
        .workloads
        .iter()
        .map(|spec| (spec.name.clone(), PodSession::new(spec)))
        .collect();

    let mut remaining = sessions.len();
    let mut failed: Vec<String> = Vec::new();
    let mut aborted = false;
    let cancelled = shutdown.token();

    while remaining > 0 {
        let update = tokio::select! {
            biased;

            _ = cancelled.cancelled() => {
                aborted = true;
                break;
            }
            update = rx.recv() => update,
        };

        let Some(update) = update else {
            // A source that dies with pods still tracked leaves the session
            // incomplete; treat it like an abort so cleanup still happens.
            tracing::warn!(
                reason = ?ShutdownReason::SourceEnded,
                "snapshot source ended before all workloads completed"
            );
            aborted = true;
            break;
        };

        let Some(session) = sessions.get_mut(&update.workload) else {
            continue;
        };
        if session.done {
            continue;
        }

        if session.pod.is_none() {
            tracing::info!(
                workload = %update.workload,
                pod = %update.pod.name,
                "tracking pod"
            );
            session.pod = Some(update.pod.clone());
        }

        match session.tracker.observe(&update.snapshot) {
            // Non-terminal observations are logged by the tracker itself.
            Observation::None | Observation::Scheduled | Observation::Running { .. } => {}

            Observation::Terminal(mut metrics) => {
                if let Some(client) = &client {
                    let pod_name = session
                        .pod
                        .as_ref()
                        .map(|p| p.name.clone())
                        .unwrap_or_else(|| update.workload.clone());
                    match events::correlator::find_pull_duration(
                        client.clone(),
                        &config.namespace,
                        &pod_name,
                    )
                    .await
                    {
                        Ok(pull) => metrics.image_pull = pull,
                        Err(e) => {
                            tracing::warn!(
                                workload = %update.workload,
                                error = %e,
                                "event lookup failed; image pull time unavailable"
                            );
                        }
                    }
                }

                if metrics.outcome == Outcome::Failed {
                    failed.push(update.workload.clone());
                }

                emit_report(&config, &update.workload, session, metrics)?;

                if let Some(client) = &client {
                    workload::cleanup(
                        client.clone(),
                        &config.namespace,
                        config.kind,
                        &update.workload,
                        session.pod.as_ref().map(|p| p.name.as_str()),
                    )
                    .await;
                }

                session.done = true;
                remaining -= 1;
            }
        }
    }

    // Stop whichever source is still running.
    shutdown.cancel();
    if !aborted {
        tracing::debug!(reason = ?ShutdownReason::SessionComplete, "all workloads terminal");
    }

    if aborted {
        tracing::warn!("aborting session; cleaning up created workloads");

        let unfinished: Vec<String> = sessions
            .iter()
            .filter(|(_, s)| !s.done)
            .map(|(name, _)| name.clone())
            .collect();

        for name in &unfinished {
            let session = &sessions[name];
            emit_report(&config, name, session, MetricSet::aborted())?;
        }

        // Cleanup is best-effort and attempted for everything created,
        // tracked or not; pods already reported were cleaned up above.
        if let Some(client) = &client {
            for name in &unfinished {
                let pod = sessions
                    .get(name)
                    .and_then(|s| s.pod.as_ref())
                    .map(|p| p.name.clone());
                workload::cleanup(
                    client.clone(),
                    &config.namespace,
                    config.kind,
                    name,
                    pod.as_deref(),
                )
                .await;
            }
        }

        return Err(AppError::Aborted);
    }

    if !failed.is_empty() {
        return Err(AppError::WorkloadFailed(failed.join(", ")));
    }

    Ok(())
}

async fn submit_batch(client: &kube::Client, config: &Config) -> AppResult<()> {
    for (i, spec) in config.workloads.iter().enumerate() {
        if let Err(e) = workload::submit(client.clone(), &config.namespace, config.kind, spec).await
        {
            tracing::error!(workload = %spec.name, error = %e, "create failed; aborting batch");
            for created in &config.workloads[..i] {
                workload::cleanup(
                    client.clone(),
                    &config.namespace,
                    config.kind,
                    &created.name,
                    None,
                )
                .await;
            }
            return Err(e);
        }
    }
    Ok(())
}

fn emit_report(
    config: &Config,
    workload: &str,
    session: &PodSession,
    metrics: MetricSet,
) -> AppResult<()> {
    let report = Report {
        workload: workload.to_string(),
        pod: session.pod.as_ref().map(|p| p.name.clone()),
        metrics,
    };
    report::emit(&report, &config.output)?;
    Ok(())
}
