use clap::{Parser, ValueEnum};

use crate::config::DeliveryMode;

#[derive(Debug, Parser)]
#[command(
    name = "kube-podtime",
    version,
    about = "Measure scheduling, image-pull and startup latency of Kubernetes workloads"
)]
pub struct Cli {
    /// Workload names; each becomes one pod (or job) with a container of the
    /// same name
    #[arg(required = true)]
    pub workloads: Vec<String>,

    /// Namespace
    #[arg(short = 'n', long = "namespace", default_value = "default")]
    pub namespace: String,

    /// Container image (required unless --dev)
    #[arg(long = "image")]
    pub image: Option<String>,

    /// Container command and arguments
    #[arg(long = "command", num_args = 1.., allow_hyphen_values = true)]
    pub command: Vec<String>,

    /// Submit each workload as a batch Job instead of a bare Pod
    #[arg(long = "job", default_value_t = false)]
    pub job: bool,

    /// Snapshot delivery: watch stream or fixed-interval polling
    #[arg(long = "mode", value_enum, default_value_t = ModeArg::Watch)]
    pub mode: ModeArg,

    /// Poll interval in milliseconds (poll mode only)
    #[arg(long = "poll-interval-ms", default_value_t = 2000)]
    pub poll_interval_ms: u64,

    /// Emit NDJSON reports
    #[arg(long = "json", default_value_t = false)]
    pub json: bool,

    /// Disable colors
    #[arg(long = "no-color", default_value_t = false)]
    pub no_color: bool,

    /// Dev mode: simulate the cluster without a client
    #[arg(long = "dev", default_value_t = false)]
    pub dev: bool,

    /// Dev: milliseconds between simulated snapshots
    #[arg(long = "dev-rate-ms", default_value_t = 50)]
    pub dev_rate_ms: u64,

    /// Dev: this workload terminates Failed
    #[arg(long = "dev-fail")]
    pub dev_fail: Option<String>,

    /// Dev: creating this workload fails
    #[arg(long = "dev-fail-create")]
    pub dev_fail_create: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum ModeArg {
    Watch,
    Poll,
}

impl From<ModeArg> for DeliveryMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Watch => DeliveryMode::Watch,
            ModeArg::Poll => DeliveryMode::Poll,
        }
    }
}
