//! Job completion polling
//!
//! The waiter polls a launched job until it reaches a terminal state, the
//! timeout elapses, or the cancellation token fires. A timed out job is left
//! running on the platform.

use crate::error::{Result, SyncError};
use invsync_directory::{CancellationToken, DirectoryClient, DirectoryError, JobStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep, sleep_until};
use tracing::{debug, info, warn};

/// Default delay between two status polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Deadline horizon used when `now + timeout` does not fit in an `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

pub struct JobWaiter {
    client: Arc<dyn DirectoryClient>,
    poll_interval: Duration,
}

impl JobWaiter {
    pub fn new(client: Arc<dyn DirectoryClient>) -> Self {
        Self {
            client,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Wait until `job` finishes.
    ///
    /// * `Ok(Successful)` when the job succeeded
    /// * `JobFailed` for any other terminal status
    /// * `Timeout` when `timeout` elapses first
    /// * `Cancelled` as soon as `cancel` fires
    ///
    /// Poll failures are logged and retried until the timeout runs out.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn wait_for_terminal(
        &self,
        job: i64,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<JobStatus> {
        let now = Instant::now();
        let deadline = now
            .checked_add(timeout)
            .unwrap_or_else(|| now + FAR_FUTURE);
        let mut last_status = None;
        let timed_out = |last_status| SyncError::Timeout {
            job,
            timeout,
            last_status,
        };

        loop {
            let polled = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(SyncError::Cancelled),
                _ = sleep_until(deadline) => return Err(timed_out(last_status)),
                result = self.client.get_job_status(job, cancel) => result,
            };

            match polled {
                Ok(status) if status.is_success() => {
                    info!(job, %status, "job finished");
                    return Ok(status);
                }
                Ok(status) if status.is_terminal() => {
                    warn!(job, %status, "job finished without success");
                    return Err(SyncError::JobFailed { job, status });
                }
                Ok(status) => {
                    debug!(job, %status, "job still in progress");
                    last_status = Some(status);
                }
                Err(DirectoryError::Cancelled) => return Err(SyncError::Cancelled),
                Err(e) => {
                    warn!(job, error = %e, "failed to poll job status, retrying");
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(timed_out(last_status));
            }

            let pause = self.poll_interval.min(deadline - now);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(SyncError::Cancelled),
                _ = sleep(pause) => {}
            }
        }
    }
}
