use invsync_directory::{DirectoryError, JobStatus, ResourceKind};
use std::time::Duration;
use thiserror::Error;

/// Errors produced by reconciliation, job control and teardown
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("invalid desired state: {0}")]
    Validation(String),

    #[error("{kind} '{name}' not found")]
    NotFound { kind: ResourceKind, name: String },

    #[error("failed to {operation} {kind} '{target}': {source}")]
    Remote {
        operation: &'static str,
        kind: ResourceKind,
        target: String,
        #[source]
        source: DirectoryError,
    },

    #[error("job {job} finished with status '{status}'")]
    JobFailed { job: i64, status: JobStatus },

    #[error("job {job} did not reach a terminal state within {timeout:?}{}", status_suffix(.last_status))]
    Timeout {
        job: i64,
        timeout: Duration,
        last_status: Option<JobStatus>,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("run of template '{template}' against inventory '{inventory}' failed: {source}")]
    Run {
        inventory: String,
        template: String,
        #[source]
        source: Box<SyncError>,
    },

    #[error("teardown of inventory '{inventory}' failed: {source}")]
    Teardown {
        inventory: String,
        #[source]
        source: Box<SyncError>,
    },
}

impl SyncError {
    /// Wrap a Directory Service failure with the step that produced it.
    /// Cancellation is surfaced as [`SyncError::Cancelled`].
    pub fn remote(
        operation: &'static str,
        kind: ResourceKind,
        target: impl Into<String>,
        source: DirectoryError,
    ) -> Self {
        match source {
            DirectoryError::Cancelled => SyncError::Cancelled,
            source => SyncError::Remote {
                operation,
                kind,
                target: target.into(),
                source,
            },
        }
    }

    /// The innermost error, with the `Run`/`Teardown` context removed
    pub fn root_cause(&self) -> &SyncError {
        match self {
            SyncError::Run { source, .. } | SyncError::Teardown { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }
}

fn status_suffix(status: &Option<JobStatus>) -> String {
    status
        .map(|s| format!(" (last status: {})", s))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors raised while reading a KDL run file
#[derive(Error, Debug)]
pub enum RunFileError {
    #[error("KDL parse error: {0}")]
    KdlParse(#[from] kdl::KdlError),

    #[error("failed to read run file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid run file: {0}")]
    InvalidConfig(String),
}
