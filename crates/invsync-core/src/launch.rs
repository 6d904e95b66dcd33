//! Job template resolution and launch

use crate::error::{Result, SyncError};
use invsync_directory::{
    CancellationToken, DirectoryClient, Job, JobTemplate, LaunchJob, ListFilter, ResourceKind,
    Variables,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Build the launch arguments for a run against `inventory`
pub fn launch_request(inventory: i64, hosts: &[&str], extra_vars: &Variables) -> LaunchJob {
    LaunchJob {
        inventory: Some(inventory),
        limit: Some(hosts.join(",")),
        extra_vars: Some(extra_vars.clone()),
    }
}

pub struct JobLauncher {
    client: Arc<dyn DirectoryClient>,
}

impl JobLauncher {
    pub fn new(client: Arc<dyn DirectoryClient>) -> Self {
        Self { client }
    }

    /// Look up a job template by exact name. The first match wins.
    pub async fn resolve_template(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<JobTemplate> {
        let templates = self
            .client
            .list_job_templates(&ListFilter::by_name(name), cancel)
            .await
            .map_err(|e| SyncError::remote("look up", ResourceKind::JobTemplate, name, e))?;

        let mut matching = templates.into_iter().filter(|t| t.name == name);
        let template = matching.next().ok_or_else(|| SyncError::NotFound {
            kind: ResourceKind::JobTemplate,
            name: name.to_string(),
        })?;

        let others: Vec<i64> = matching.map(|t| t.id).collect();
        if !others.is_empty() {
            warn!(
                template = name,
                chosen = template.id,
                ignored = ?others,
                "several job templates share this name, using the first"
            );
        }

        Ok(template)
    }

    /// Launch `template` against `inventory`, limited to `hosts`.
    ///
    /// Returns as soon as the platform has accepted the job; use
    /// [`JobWaiter`](crate::wait::JobWaiter) to follow it.
    #[tracing::instrument(skip(self, hosts, extra_vars, cancel))]
    pub async fn launch(
        &self,
        inventory: i64,
        template: &str,
        hosts: &[&str],
        extra_vars: &Variables,
        cancel: &CancellationToken,
    ) -> Result<Job> {
        let resolved = self.resolve_template(template, cancel).await?;
        let request = launch_request(inventory, hosts, extra_vars);

        let job = self
            .client
            .launch_job_template(resolved.id, &request, cancel)
            .await
            .map_err(|e| SyncError::remote("launch", ResourceKind::JobTemplate, template, e))?;

        info!(
            job = job.id,
            template_id = resolved.id,
            limit = request.limit.as_deref().unwrap_or_default(),
            "job launched"
        );
        Ok(job)
    }
}
