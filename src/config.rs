use std::collections::HashSet;
use std::io::IsTerminal;
use std::time::Duration;

use crate::cli::Cli;
use crate::errors::{AppError, AppResult};
use crate::types::{WorkloadKind, WorkloadSpec};

#[derive(Clone, Copy, Debug)]
pub enum OutputMode {
    Human,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryMode {
    Watch,
    Poll,
}

#[derive(Clone, Copy, Debug)]
pub struct OutputConfig {
    pub mode: OutputMode,
    pub color: bool,
}

#[derive(Clone, Debug)]
pub struct DevConfig {
    pub enabled: bool,
    pub rate_ms: u64,
    pub fail: Option<String>,
    pub fail_create: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub namespace: String,
    pub workloads: Vec<WorkloadSpec>,
    pub kind: WorkloadKind,
    pub mode: DeliveryMode,
    pub poll_interval: Duration,

    pub output: OutputConfig,
    pub dev: DevConfig,
}

impl TryFrom<Cli> for Config {
    type Error = AppError;

    fn try_from(cli: Cli) -> AppResult<Self> {
        let mut seen = HashSet::new();
        for name in &cli.workloads {
            if !seen.insert(name.as_str()) {
                return Err(AppError::Cli(format!("duplicate workload name {name:?}")));
            }
        }

        let image = match (&cli.image, cli.dev) {
            (Some(image), _) => image.clone(),
            // Dev mode never pulls anything; the image is only echoed in logs.
            (None, true) => "dev/noop:latest".to_string(),
            (None, false) => {
                return Err(AppError::Cli("--image is required unless --dev".into()));
            }
        };

        let workloads = cli
            .workloads
            .iter()
            .map(|name| WorkloadSpec::new(name.clone(), image.clone(), cli.command.clone()))
            .collect();

        let mode = if cli.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };

        // Default: enable color only if stdout is a terminal and user didn't disable it.
        let stdout_is_tty = std::io::stdout().is_terminal();
        let enable_color = !cli.no_color && stdout_is_tty;

        Ok(Self {
            namespace: cli.namespace,
            workloads,
            kind: if cli.job {
                WorkloadKind::Job
            } else {
                WorkloadKind::Pod
            },
            mode: cli.mode.into(),
            poll_interval: Duration::from_millis(cli.poll_interval_ms.max(1)),

            output: OutputConfig {
                mode,
                color: enable_color,
            },
            dev: DevConfig {
                enabled: cli.dev,
                rate_ms: cli.dev_rate_ms,
                fail: cli.dev_fail,
                fail_create: cli.dev_fail_create,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn rejects_duplicate_workload_names() {
        let cli = Cli::parse_from(["kube-podtime", "--dev", "a", "a"]);
        assert!(matches!(Config::try_from(cli), Err(AppError::Cli(_))));
    }

    #[test]
    fn requires_image_outside_dev_mode() {
        let cli = Cli::parse_from(["kube-podtime", "a"]);
        assert!(matches!(Config::try_from(cli), Err(AppError::Cli(_))));
    }

    #[test]
    fn container_name_matches_workload_name() {
        let cli = Cli::parse_from(["kube-podtime", "--image", "busybox", "a", "b"]);
        let config = Config::try_from(cli).unwrap();
        assert_eq!(config.workloads.len(), 2);
        assert_eq!(config.workloads[0].container, "a");
        assert_eq!(config.workloads[1].container, "b");
    }
}
