//! Top-level entry points: `run` and `teardown`
//!
//! Every error leaving the runner carries the operation and the identifying
//! arguments (inventory and template names).

use crate::error::{Result, SyncError};
use crate::launch::JobLauncher;
use crate::model::DesiredState;
use crate::reconcile::{InventoryReconciler, ReconcileReport};
use crate::teardown::{TeardownController, TeardownReport};
use crate::wait::{DEFAULT_POLL_INTERVAL, JobWaiter};
use invsync_directory::{CancellationToken, DirectoryClient, Inventory, Job, JobStatus};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Organization used when the organization is not given elsewhere
pub const DEFAULT_ORGANIZATION: &str = "Default";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Organization used when a desired state does not name one
    pub organization: String,
    pub poll_interval: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            organization: DEFAULT_ORGANIZATION.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub inventory: Inventory,
    pub job: Job,
    pub status: JobStatus,
    pub report: ReconcileReport,
}

/// Reconcile, launch, wait
pub struct Runner {
    reconciler: InventoryReconciler,
    launcher: JobLauncher,
    waiter: JobWaiter,
    teardown: TeardownController,
}

impl Runner {
    pub fn new(client: Arc<dyn DirectoryClient>, config: RunnerConfig) -> Self {
        Self {
            reconciler: InventoryReconciler::new(client.clone(), config.organization.clone()),
            launcher: JobLauncher::new(client.clone()),
            waiter: JobWaiter::new(client.clone()).with_poll_interval(config.poll_interval),
            teardown: TeardownController::new(client, config.organization),
        }
    }

    /// Converge the inventory, launch the template against it and wait for
    /// the job to finish within `state.timeout`.
    pub async fn run(&self, state: &DesiredState, cancel: &CancellationToken) -> Result<RunOutcome> {
        self.run_steps(state, cancel)
            .await
            .map_err(|source| SyncError::Run {
                inventory: state.inventory.clone(),
                template: state.template.clone(),
                source: Box::new(source),
            })
    }

    async fn run_steps(&self, state: &DesiredState, cancel: &CancellationToken) -> Result<RunOutcome> {
        let reconciled = self.reconciler.reconcile(state, cancel).await?;
        let hosts = state.host_names();
        let job = self
            .launcher
            .launch(
                reconciled.inventory.id,
                &state.template,
                &hosts,
                &state.extra_vars,
                cancel,
            )
            .await?;

        let status = self
            .waiter
            .wait_for_terminal(job.id, state.timeout, cancel)
            .await?;

        info!(
            inventory = %state.inventory,
            template = %state.template,
            job = job.id,
            "run completed"
        );

        Ok(RunOutcome {
            inventory: reconciled.inventory,
            job,
            status,
            report: reconciled.report,
        })
    }

    /// Delete the named inventory of `organization` (default: the configured
    /// organization) with its hosts and groups
    pub async fn teardown(
        &self,
        inventory: &str,
        organization: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<TeardownReport> {
        let result = if inventory.trim().is_empty() {
            Err(SyncError::Validation("no inventory name specified".to_string()))
        } else {
            self.teardown.teardown(inventory, organization, cancel).await
        };

        result.map_err(|source| SyncError::Teardown {
            inventory: inventory.to_string(),
            source: Box::new(source),
        })
    }
}
