//! Directory Service capability trait

use crate::error::Result;
use crate::model::{Group, Host, Inventory, Job, JobStatus, JobTemplate, Organization};
use crate::request::{
    AddHostToGroup, CreateGroup, CreateHost, CreateInventory, LaunchJob, ListFilter, UpdateHost,
};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Remote inventory/job platform abstraction
///
/// Implementations own transport, authentication, pagination and
/// serialization. Every call receives the caller's cancellation token and
/// should return [`DirectoryError::Cancelled`](crate::DirectoryError::Cancelled)
/// once it fires.
///
/// Deleting a resource that no longer exists must succeed, so that
/// interrupted teardowns can be retried.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Find an organization by exact name; `NotFound` when absent
    async fn find_organization_by_name(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Organization>;

    async fn list_inventories(
        &self,
        filter: &ListFilter,
        cancel: &CancellationToken,
    ) -> Result<Vec<Inventory>>;

    async fn create_inventory(
        &self,
        request: &CreateInventory,
        cancel: &CancellationToken,
    ) -> Result<Inventory>;

    async fn delete_inventory(&self, id: i64, cancel: &CancellationToken) -> Result<()>;

    /// Groups belonging to an inventory
    async fn list_groups(&self, inventory: i64, cancel: &CancellationToken) -> Result<Vec<Group>>;

    async fn create_group(
        &self,
        request: &CreateGroup,
        cancel: &CancellationToken,
    ) -> Result<Group>;

    async fn delete_group(&self, id: i64, cancel: &CancellationToken) -> Result<()>;

    async fn add_host_to_group(
        &self,
        group: i64,
        request: &AddHostToGroup,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// Hosts belonging to an inventory
    async fn list_hosts(&self, inventory: i64, cancel: &CancellationToken) -> Result<Vec<Host>>;

    async fn create_host(&self, request: &CreateHost, cancel: &CancellationToken) -> Result<Host>;

    async fn update_host(
        &self,
        id: i64,
        request: &UpdateHost,
        cancel: &CancellationToken,
    ) -> Result<Host>;

    async fn delete_host(&self, id: i64, cancel: &CancellationToken) -> Result<()>;

    async fn list_job_templates(
        &self,
        filter: &ListFilter,
        cancel: &CancellationToken,
    ) -> Result<Vec<JobTemplate>>;

    /// Start a job from a template; returns without waiting for completion
    async fn launch_job_template(
        &self,
        id: i64,
        request: &LaunchJob,
        cancel: &CancellationToken,
    ) -> Result<Job>;

    async fn get_job_status(&self, job: i64, cancel: &CancellationToken) -> Result<JobStatus>;
}
