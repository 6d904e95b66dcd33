//! [`DirectoryClient`] over the AWX REST API

use crate::api::{
    ApiGroup, ApiHost, ApiInventory, ApiJob, ApiJobTemplate, ApiLaunched, ApiOrganization,
    AssociateBody, HostBody, HostVariablesBody, LaunchBody,
};
use crate::client::AwxClient;
use crate::vars;
use async_trait::async_trait;
use invsync_directory::{
    AddHostToGroup, CreateGroup, CreateHost, CreateInventory, DirectoryClient, DirectoryError,
    Group, Host, Inventory, Job, JobStatus, JobTemplate, LaunchJob, ListFilter, Organization,
    ResourceKind, Result, UpdateHost,
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

fn filter_query(filter: &ListFilter) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(name) = &filter.name {
        query.push(("name", name.clone()));
    }
    if let Some(organization) = filter.organization {
        query.push(("organization", organization.to_string()));
    }
    query
}

#[async_trait]
impl DirectoryClient for AwxClient {
    async fn find_organization_by_name(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Organization> {
        let organizations: Vec<ApiOrganization> = self
            .list("/organizations/", &[("name", name.to_string())], cancel)
            .await?;
        organizations
            .into_iter()
            .find(|o| o.name == name)
            .map(Organization::from)
            .ok_or_else(|| DirectoryError::not_found(ResourceKind::Organization, name))
    }

    async fn list_inventories(
        &self,
        filter: &ListFilter,
        cancel: &CancellationToken,
    ) -> Result<Vec<Inventory>> {
        let inventories: Vec<ApiInventory> = self
            .list("/inventories/", &filter_query(filter), cancel)
            .await?;
        Ok(inventories.into_iter().map(Inventory::from).collect())
    }

    async fn create_inventory(
        &self,
        request: &CreateInventory,
        cancel: &CancellationToken,
    ) -> Result<Inventory> {
        let created: ApiInventory = self.post("/inventories/", request, cancel).await?;
        Ok(created.into())
    }

    async fn delete_inventory(&self, id: i64, cancel: &CancellationToken) -> Result<()> {
        Ok(self.delete(&format!("/inventories/{}/", id), cancel).await?)
    }

    async fn list_groups(&self, inventory: i64, cancel: &CancellationToken) -> Result<Vec<Group>> {
        let groups: Vec<ApiGroup> = self
            .list(&format!("/inventories/{}/groups/", inventory), &[], cancel)
            .await?;
        Ok(groups.into_iter().map(Group::from).collect())
    }

    async fn create_group(
        &self,
        request: &CreateGroup,
        cancel: &CancellationToken,
    ) -> Result<Group> {
        let created: ApiGroup = self.post("/groups/", request, cancel).await?;
        Ok(created.into())
    }

    async fn delete_group(&self, id: i64, cancel: &CancellationToken) -> Result<()> {
        Ok(self.delete(&format!("/groups/{}/", id), cancel).await?)
    }

    /// Posting a name to the group's host list creates the host; an existing
    /// host has to be attached by id instead.
    async fn add_host_to_group(
        &self,
        group: i64,
        request: &AddHostToGroup,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let path = format!("/groups/{}/hosts/", group);
        let existing: Vec<ApiHost> = self
            .list(
                &format!("/inventories/{}/hosts/", request.inventory),
                &[("name", request.name.clone())],
                cancel,
            )
            .await?;

        match existing.into_iter().find(|h| h.name == request.name) {
            Some(host) => {
                debug!(host = %request.name, group, "attaching existing host");
                self.post_unit(&path, &AssociateBody { id: host.id }, cancel)
                    .await?
            }
            None => self.post_unit(&path, request, cancel).await?,
        }
        Ok(())
    }

    async fn list_hosts(&self, inventory: i64, cancel: &CancellationToken) -> Result<Vec<Host>> {
        let hosts: Vec<ApiHost> = self
            .list(&format!("/inventories/{}/hosts/", inventory), &[], cancel)
            .await?;
        let hosts = hosts
            .into_iter()
            .map(ApiHost::into_host)
            .collect::<crate::error::Result<Vec<_>>>()?;
        Ok(hosts)
    }

    async fn create_host(&self, request: &CreateHost, cancel: &CancellationToken) -> Result<Host> {
        let body = HostBody {
            name: request.name.clone(),
            inventory: request.inventory,
            variables: vars::encode(&request.variables)?,
            description: request.description.clone(),
            enabled: request.enabled,
        };
        let created: ApiHost = self.post("/hosts/", &body, cancel).await?;
        Ok(created.into_host()?)
    }

    async fn update_host(
        &self,
        id: i64,
        request: &UpdateHost,
        cancel: &CancellationToken,
    ) -> Result<Host> {
        let body = HostVariablesBody {
            variables: vars::encode(&request.variables)?,
        };
        let updated: ApiHost = self.patch(&format!("/hosts/{}/", id), &body, cancel).await?;
        Ok(updated.into_host()?)
    }

    async fn delete_host(&self, id: i64, cancel: &CancellationToken) -> Result<()> {
        Ok(self.delete(&format!("/hosts/{}/", id), cancel).await?)
    }

    async fn list_job_templates(
        &self,
        filter: &ListFilter,
        cancel: &CancellationToken,
    ) -> Result<Vec<JobTemplate>> {
        let templates: Vec<ApiJobTemplate> = self
            .list("/job_templates/", &filter_query(filter), cancel)
            .await?;
        Ok(templates.into_iter().map(JobTemplate::from).collect())
    }

    async fn launch_job_template(
        &self,
        id: i64,
        request: &LaunchJob,
        cancel: &CancellationToken,
    ) -> Result<Job> {
        let body = LaunchBody {
            inventory: request.inventory,
            limit: request.limit.clone(),
            extra_vars: request.extra_vars.as_ref().map(vars::encode).transpose()?,
        };
        let launched: ApiLaunched = self
            .post(&format!("/job_templates/{}/launch/", id), &body, cancel)
            .await?;

        Ok(Job {
            id: launched.job.unwrap_or(launched.id),
            template: id,
            status: launched.status.unwrap_or(JobStatus::Pending),
        })
    }

    async fn get_job_status(&self, job: i64, cancel: &CancellationToken) -> Result<JobStatus> {
        let job: ApiJob = self.get(&format!("/jobs/{}/", job), cancel).await?;
        Ok(job.status)
    }
}
