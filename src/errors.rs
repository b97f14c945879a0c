use std::io;

use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Cli(String),

    #[error("kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    #[error("failed to create workload {workload}: {reason}")]
    Create { workload: String, reason: String },

    #[error("workload(s) failed: {0}")]
    WorkloadFailed(String),

    #[error("session aborted")]
    Aborted,

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}
