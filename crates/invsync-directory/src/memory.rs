//! In-memory Directory Service
//!
//! A complete [`DirectoryClient`] backed by process memory. Every call is
//! journaled so callers can assert on the exact remote traffic, failures can
//! be injected per operation, and launched jobs replay a scripted sequence
//! of statuses.

use crate::client::DirectoryClient;
use crate::error::{DirectoryError, Result};
use crate::model::{
    Group, Host, Inventory, Job, JobStatus, JobTemplate, Organization, ResourceKind, Variables,
};
use crate::request::{
    AddHostToGroup, CreateGroup, CreateHost, CreateInventory, LaunchJob, ListFilter, UpdateHost,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Directory operation, one per [`DirectoryClient`] method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FindOrganization,
    ListInventories,
    CreateInventory,
    DeleteInventory,
    ListGroups,
    CreateGroup,
    DeleteGroup,
    AddHostToGroup,
    ListHosts,
    CreateHost,
    UpdateHost,
    DeleteHost,
    ListJobTemplates,
    LaunchJobTemplate,
    GetJobStatus,
}

impl Operation {
    /// Whether the operation changes remote state
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Operation::CreateInventory
                | Operation::DeleteInventory
                | Operation::CreateGroup
                | Operation::DeleteGroup
                | Operation::AddHostToGroup
                | Operation::CreateHost
                | Operation::UpdateHost
                | Operation::DeleteHost
                | Operation::LaunchJobTemplate
        )
    }

    pub fn is_delete(&self) -> bool {
        matches!(
            self,
            Operation::DeleteInventory | Operation::DeleteGroup | Operation::DeleteHost
        )
    }
}

/// A journaled call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub operation: Operation,
    /// Name or id the call was about
    pub target: String,
}

/// A recorded job template launch
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchRecord {
    pub template: i64,
    pub request: LaunchJob,
    pub job: i64,
}

#[derive(Debug)]
struct JobEntry {
    job: Job,
    remaining: VecDeque<JobStatus>,
}

#[derive(Debug)]
struct State {
    next_id: i64,
    organizations: Vec<Organization>,
    inventories: Vec<Inventory>,
    groups: Vec<Group>,
    hosts: Vec<Host>,
    /// group id → host ids
    memberships: BTreeMap<i64, BTreeSet<i64>>,
    templates: Vec<JobTemplate>,
    jobs: HashMap<i64, JobEntry>,
    job_script: Vec<JobStatus>,
    failures: HashMap<Operation, u32>,
    calls: Vec<Call>,
    launches: Vec<LaunchRecord>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            next_id: 1,
            organizations: Vec::new(),
            inventories: Vec::new(),
            groups: Vec::new(),
            hosts: Vec::new(),
            memberships: BTreeMap::new(),
            templates: Vec::new(),
            jobs: HashMap::new(),
            job_script: vec![JobStatus::Successful],
            failures: HashMap::new(),
            calls: Vec::new(),
            launches: Vec::new(),
        }
    }
}

impl State {
    fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Journal the call and consume an injected failure, if any
    fn enter(
        &mut self,
        operation: Operation,
        target: impl Into<String>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(DirectoryError::Cancelled);
        }

        let target = target.into();
        debug!(?operation, %target, "directory call");
        self.calls.push(Call { operation, target });

        if let Some(remaining) = self.failures.get_mut(&operation)
            && *remaining > 0
        {
            *remaining -= 1;
            debug!(?operation, remaining = *remaining, "injecting failure");
            return Err(DirectoryError::Api {
                status: 500,
                message: format!("injected failure: {:?}", operation),
            });
        }

        Ok(())
    }

    fn insert_host(&mut self, name: &str, inventory: i64, variables: Variables) -> Host {
        let host = Host {
            id: self.allocate_id(),
            name: name.to_string(),
            inventory,
            variables,
        };
        self.hosts.push(host.clone());
        host
    }
}

/// Directory Service held entirely in memory
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    state: Mutex<State>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    // ============ Seeding ============

    pub fn seed_organization(&self, name: &str) -> Organization {
        let mut state = self.state.lock();
        let org = Organization {
            id: state.allocate_id(),
            name: name.to_string(),
        };
        state.organizations.push(org.clone());
        org
    }

    pub fn seed_inventory(&self, name: &str, organization: i64) -> Inventory {
        let mut state = self.state.lock();
        let inventory = Inventory {
            id: state.allocate_id(),
            name: name.to_string(),
            organization,
        };
        state.inventories.push(inventory.clone());
        inventory
    }

    pub fn seed_group(&self, inventory: i64, name: &str) -> Group {
        let mut state = self.state.lock();
        let group = Group {
            id: state.allocate_id(),
            name: name.to_string(),
            inventory,
        };
        state.groups.push(group.clone());
        group
    }

    pub fn seed_host(&self, inventory: i64, name: &str, variables: Variables) -> Host {
        self.state.lock().insert_host(name, inventory, variables)
    }

    pub fn seed_job_template(&self, name: &str) -> JobTemplate {
        let mut state = self.state.lock();
        let template = JobTemplate {
            id: state.allocate_id(),
            name: name.to_string(),
        };
        state.templates.push(template.clone());
        template
    }

    /// Link a host to a group directly, bypassing the journal
    pub fn link(&self, group: i64, host: i64) {
        self.state
            .lock()
            .memberships
            .entry(group)
            .or_default()
            .insert(host);
    }

    /// Remove a host from a group directly, bypassing the journal
    pub fn unlink(&self, group: i64, host: i64) {
        if let Some(members) = self.state.lock().memberships.get_mut(&group) {
            members.remove(&host);
        }
    }

    /// Statuses returned by successive polls of every job launched afterwards.
    /// The last status repeats once the script is exhausted.
    pub fn script_job_statuses(&self, statuses: Vec<JobStatus>) {
        self.state.lock().job_script = statuses;
    }

    /// Make the next `times` calls of `operation` fail with an API error
    pub fn fail_next(&self, operation: Operation, times: u32) {
        self.state.lock().failures.insert(operation, times);
    }

    // ============ Inspection ============

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn count(&self, operation: Operation) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn launches(&self) -> Vec<LaunchRecord> {
        self.state.lock().launches.clone()
    }

    pub fn inventories(&self) -> Vec<Inventory> {
        self.state.lock().inventories.clone()
    }

    pub fn groups(&self, inventory: i64) -> Vec<Group> {
        self.state
            .lock()
            .groups
            .iter()
            .filter(|g| g.inventory == inventory)
            .cloned()
            .collect()
    }

    pub fn hosts(&self, inventory: i64) -> Vec<Host> {
        self.state
            .lock()
            .hosts
            .iter()
            .filter(|h| h.inventory == inventory)
            .cloned()
            .collect()
    }

    pub fn host(&self, inventory: i64, name: &str) -> Option<Host> {
        self.state
            .lock()
            .hosts
            .iter()
            .find(|h| h.inventory == inventory && h.name == name)
            .cloned()
    }

    /// Names of the groups a host is a member of, sorted
    pub fn host_groups(&self, inventory: i64, name: &str) -> Vec<String> {
        let state = self.state.lock();
        let Some(host) = state
            .hosts
            .iter()
            .find(|h| h.inventory == inventory && h.name == name)
        else {
            return Vec::new();
        };

        let mut names: Vec<String> = state
            .groups
            .iter()
            .filter(|g| {
                state
                    .memberships
                    .get(&g.id)
                    .is_some_and(|members| members.contains(&host.id))
            })
            .map(|g| g.name.clone())
            .collect();
        names.sort();
        names
    }
}

fn conflict(kind: ResourceKind, name: &str) -> DirectoryError {
    DirectoryError::Api {
        status: 400,
        message: format!("{} with this name already exists: {}", kind, name),
    }
}

#[async_trait]
impl DirectoryClient for InMemoryDirectory {
    async fn find_organization_by_name(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Organization> {
        let mut state = self.state.lock();
        state.enter(Operation::FindOrganization, name, cancel)?;
        state
            .organizations
            .iter()
            .find(|o| o.name == name)
            .cloned()
            .ok_or_else(|| DirectoryError::not_found(ResourceKind::Organization, name))
    }

    async fn list_inventories(
        &self,
        filter: &ListFilter,
        cancel: &CancellationToken,
    ) -> Result<Vec<Inventory>> {
        let mut state = self.state.lock();
        state.enter(
            Operation::ListInventories,
            filter.name.clone().unwrap_or_default(),
            cancel,
        )?;
        Ok(state
            .inventories
            .iter()
            .filter(|i| filter.name.as_ref().is_none_or(|n| &i.name == n))
            .filter(|i| filter.organization.is_none_or(|o| i.organization == o))
            .cloned()
            .collect())
    }

    async fn create_inventory(
        &self,
        request: &CreateInventory,
        cancel: &CancellationToken,
    ) -> Result<Inventory> {
        let mut state = self.state.lock();
        state.enter(Operation::CreateInventory, &request.name, cancel)?;

        if !state
            .organizations
            .iter()
            .any(|o| o.id == request.organization)
        {
            return Err(DirectoryError::not_found(
                ResourceKind::Organization,
                request.organization.to_string(),
            ));
        }
        if state
            .inventories
            .iter()
            .any(|i| i.name == request.name && i.organization == request.organization)
        {
            return Err(conflict(ResourceKind::Inventory, &request.name));
        }

        let inventory = Inventory {
            id: state.allocate_id(),
            name: request.name.clone(),
            organization: request.organization,
        };
        state.inventories.push(inventory.clone());
        Ok(inventory)
    }

    async fn delete_inventory(&self, id: i64, cancel: &CancellationToken) -> Result<()> {
        let mut state = self.state.lock();
        state.enter(Operation::DeleteInventory, id.to_string(), cancel)?;

        let has_children = state.hosts.iter().any(|h| h.inventory == id)
            || state.groups.iter().any(|g| g.inventory == id);
        if has_children {
            return Err(DirectoryError::Api {
                status: 409,
                message: format!("inventory {} still has hosts or groups", id),
            });
        }

        state.inventories.retain(|i| i.id != id);
        Ok(())
    }

    async fn list_groups(&self, inventory: i64, cancel: &CancellationToken) -> Result<Vec<Group>> {
        let mut state = self.state.lock();
        state.enter(Operation::ListGroups, inventory.to_string(), cancel)?;
        Ok(state
            .groups
            .iter()
            .filter(|g| g.inventory == inventory)
            .cloned()
            .collect())
    }

    async fn create_group(
        &self,
        request: &CreateGroup,
        cancel: &CancellationToken,
    ) -> Result<Group> {
        let mut state = self.state.lock();
        state.enter(Operation::CreateGroup, &request.name, cancel)?;

        if state
            .groups
            .iter()
            .any(|g| g.inventory == request.inventory && g.name == request.name)
        {
            return Err(conflict(ResourceKind::Group, &request.name));
        }

        let group = Group {
            id: state.allocate_id(),
            name: request.name.clone(),
            inventory: request.inventory,
        };
        state.groups.push(group.clone());
        Ok(group)
    }

    async fn delete_group(&self, id: i64, cancel: &CancellationToken) -> Result<()> {
        let mut state = self.state.lock();
        state.enter(Operation::DeleteGroup, id.to_string(), cancel)?;
        state.groups.retain(|g| g.id != id);
        state.memberships.remove(&id);
        Ok(())
    }

    async fn add_host_to_group(
        &self,
        group: i64,
        request: &AddHostToGroup,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut state = self.state.lock();
        state.enter(Operation::AddHostToGroup, &request.name, cancel)?;

        if !state.groups.iter().any(|g| g.id == group) {
            return Err(DirectoryError::not_found(
                ResourceKind::Group,
                group.to_string(),
            ));
        }

        // The platform creates the host on the fly when it does not exist yet
        let existing = state
            .hosts
            .iter()
            .find(|h| h.inventory == request.inventory && h.name == request.name)
            .map(|h| h.id);
        let host_id = match existing {
            Some(id) => id,
            None => {
                state
                    .insert_host(&request.name, request.inventory, Variables::new())
                    .id
            }
        };

        state.memberships.entry(group).or_default().insert(host_id);
        Ok(())
    }

    async fn list_hosts(&self, inventory: i64, cancel: &CancellationToken) -> Result<Vec<Host>> {
        let mut state = self.state.lock();
        state.enter(Operation::ListHosts, inventory.to_string(), cancel)?;
        Ok(state
            .hosts
            .iter()
            .filter(|h| h.inventory == inventory)
            .cloned()
            .collect())
    }

    async fn create_host(&self, request: &CreateHost, cancel: &CancellationToken) -> Result<Host> {
        let mut state = self.state.lock();
        state.enter(Operation::CreateHost, &request.name, cancel)?;

        if state
            .hosts
            .iter()
            .any(|h| h.inventory == request.inventory && h.name == request.name)
        {
            return Err(conflict(ResourceKind::Host, &request.name));
        }

        Ok(state.insert_host(&request.name, request.inventory, request.variables.clone()))
    }

    async fn update_host(
        &self,
        id: i64,
        request: &UpdateHost,
        cancel: &CancellationToken,
    ) -> Result<Host> {
        let mut state = self.state.lock();
        state.enter(Operation::UpdateHost, id.to_string(), cancel)?;

        let host = state
            .hosts
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| DirectoryError::not_found(ResourceKind::Host, id.to_string()))?;
        host.variables = request.variables.clone();
        Ok(host.clone())
    }

    async fn delete_host(&self, id: i64, cancel: &CancellationToken) -> Result<()> {
        let mut state = self.state.lock();
        state.enter(Operation::DeleteHost, id.to_string(), cancel)?;
        state.hosts.retain(|h| h.id != id);
        for members in state.memberships.values_mut() {
            members.remove(&id);
        }
        Ok(())
    }

    async fn list_job_templates(
        &self,
        filter: &ListFilter,
        cancel: &CancellationToken,
    ) -> Result<Vec<JobTemplate>> {
        let mut state = self.state.lock();
        state.enter(
            Operation::ListJobTemplates,
            filter.name.clone().unwrap_or_default(),
            cancel,
        )?;
        Ok(state
            .templates
            .iter()
            .filter(|t| filter.name.as_ref().is_none_or(|n| &t.name == n))
            .cloned()
            .collect())
    }

    async fn launch_job_template(
        &self,
        id: i64,
        request: &LaunchJob,
        cancel: &CancellationToken,
    ) -> Result<Job> {
        let mut state = self.state.lock();
        state.enter(Operation::LaunchJobTemplate, id.to_string(), cancel)?;

        if !state.templates.iter().any(|t| t.id == id) {
            return Err(DirectoryError::not_found(
                ResourceKind::JobTemplate,
                id.to_string(),
            ));
        }

        let job = Job {
            id: state.allocate_id(),
            template: id,
            status: JobStatus::Pending,
        };
        let remaining = state.job_script.iter().copied().collect();
        state.jobs.insert(
            job.id,
            JobEntry {
                job: job.clone(),
                remaining,
            },
        );
        state.launches.push(LaunchRecord {
            template: id,
            request: request.clone(),
            job: job.id,
        });
        Ok(job)
    }

    async fn get_job_status(&self, job: i64, cancel: &CancellationToken) -> Result<JobStatus> {
        let mut state = self.state.lock();
        state.enter(Operation::GetJobStatus, job.to_string(), cancel)?;

        let entry = state
            .jobs
            .get_mut(&job)
            .ok_or_else(|| DirectoryError::not_found(ResourceKind::Job, job.to_string()))?;

        if entry.remaining.len() > 1 {
            if let Some(status) = entry.remaining.pop_front() {
                entry.job.status = status;
            }
        } else if let Some(status) = entry.remaining.front() {
            entry.job.status = *status;
        }
        Ok(entry.job.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Variables {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::json!(v)))
            .collect()
    }

    #[tokio::test]
    async fn test_organization_lookup() {
        let dir = InMemoryDirectory::new();
        let cancel = CancellationToken::new();
        let org = dir.seed_organization("Default");

        let found = dir.find_organization_by_name("Default", &cancel).await.unwrap();
        assert_eq!(found, org);

        let err = dir
            .find_organization_by_name("Missing", &cancel)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(dir.count(Operation::FindOrganization), 2);
    }

    #[tokio::test]
    async fn test_duplicate_host_is_conflict() {
        let dir = InMemoryDirectory::new();
        let cancel = CancellationToken::new();
        let org = dir.seed_organization("Default");
        let inv = dir.seed_inventory("lab", org.id);

        let req = CreateHost {
            name: "a.example.com".to_string(),
            inventory: inv.id,
            variables: vars(&[("role", "web")]),
            description: None,
            enabled: None,
        };
        dir.create_host(&req, &cancel).await.unwrap();
        let err = dir.create_host(&req, &cancel).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Api { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_add_host_to_group_creates_missing_host() {
        let dir = InMemoryDirectory::new();
        let cancel = CancellationToken::new();
        let org = dir.seed_organization("Default");
        let inv = dir.seed_inventory("lab", org.id);
        let group = dir.seed_group(inv.id, "web");

        dir.add_host_to_group(
            group.id,
            &AddHostToGroup {
                inventory: inv.id,
                name: "a.example.com".to_string(),
            },
            &cancel,
        )
        .await
        .unwrap();

        assert!(dir.host(inv.id, "a.example.com").is_some());
        assert_eq!(dir.host_groups(inv.id, "a.example.com"), vec!["web"]);
    }

    #[tokio::test]
    async fn test_delete_inventory_with_children_is_rejected() {
        let dir = InMemoryDirectory::new();
        let cancel = CancellationToken::new();
        let org = dir.seed_organization("Default");
        let inv = dir.seed_inventory("lab", org.id);
        let host = dir.seed_host(inv.id, "a.example.com", Variables::new());

        assert!(dir.delete_inventory(inv.id, &cancel).await.is_err());

        dir.delete_host(host.id, &cancel).await.unwrap();
        dir.delete_inventory(inv.id, &cancel).await.unwrap();
        assert!(dir.inventories().is_empty());

        // deleting again is tolerated
        dir.delete_inventory(inv.id, &cancel).await.unwrap();
    }

    #[tokio::test]
    async fn test_scripted_job_statuses() {
        let dir = InMemoryDirectory::new();
        let cancel = CancellationToken::new();
        let template = dir.seed_job_template("deploy");
        dir.script_job_statuses(vec![JobStatus::Running, JobStatus::Failed]);

        let job = dir
            .launch_job_template(template.id, &LaunchJob::default(), &cancel)
            .await
            .unwrap();
        assert_eq!(job.status, JobStatus::Pending);

        let first = dir.get_job_status(job.id, &cancel).await.unwrap();
        let second = dir.get_job_status(job.id, &cancel).await.unwrap();
        let third = dir.get_job_status(job.id, &cancel).await.unwrap();
        assert_eq!(first, JobStatus::Running);
        assert_eq!(second, JobStatus::Failed);
        assert_eq!(third, JobStatus::Failed);
        assert_eq!(dir.launches().len(), 1);
    }

    #[tokio::test]
    async fn test_injected_failures_and_cancellation() {
        let dir = InMemoryDirectory::new();
        let cancel = CancellationToken::new();
        dir.seed_organization("Default");
        dir.fail_next(Operation::FindOrganization, 1);

        assert!(dir.find_organization_by_name("Default", &cancel).await.is_err());
        assert!(dir.find_organization_by_name("Default", &cancel).await.is_ok());

        cancel.cancel();
        let err = dir
            .find_organization_by_name("Default", &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::Cancelled));
    }
}
