//! Desired state model
//!
//! What the caller wants the remote inventory to look like, plus the job
//! template to run against it.

use crate::error::{Result, SyncError};
use invsync_directory::Variables;
use std::collections::HashSet;
use std::time::Duration;

/// A host the inventory should contain
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DesiredHost {
    /// Host name (FQDN), unique within a run
    pub name: String,

    /// Group the host is placed in when it is first created
    pub group: Option<String>,

    pub variables: Variables,
}

impl DesiredHost {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    /// Group name, if one is set and non-empty
    pub fn group_name(&self) -> Option<&str> {
        self.group.as_deref().filter(|g| !g.is_empty())
    }
}

/// One run: the inventory to converge and the job to launch against it
#[derive(Debug, Clone, PartialEq)]
pub struct DesiredState {
    pub inventory: String,

    /// Overrides the runner's default organization
    pub organization: Option<String>,

    /// Job template name
    pub template: String,

    /// How long to wait for the job to reach a terminal state
    pub timeout: Duration,

    pub hosts: Vec<DesiredHost>,

    pub extra_vars: Variables,
}

impl DesiredState {
    pub fn new(
        inventory: impl Into<String>,
        template: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            inventory: inventory.into(),
            organization: None,
            template: template.into(),
            timeout,
            hosts: Vec::new(),
            extra_vars: Variables::new(),
        }
    }

    pub fn with_host(mut self, host: DesiredHost) -> Self {
        self.hosts.push(host);
        self
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn with_extra_var(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.extra_vars.insert(key.into(), value.into());
        self
    }

    /// Non-empty host names, in desired order
    pub fn host_names(&self) -> Vec<&str> {
        self.hosts
            .iter()
            .map(|h| h.name.as_str())
            .filter(|n| !n.is_empty())
            .collect()
    }

    /// Distinct non-empty group names, in order of first appearance
    pub fn group_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.hosts
            .iter()
            .filter_map(DesiredHost::group_name)
            .filter(|g| seen.insert(*g))
            .collect()
    }

    /// Reject states that must never reach the Directory Service
    pub fn validate(&self) -> Result<()> {
        if self.inventory.trim().is_empty() {
            return Err(SyncError::Validation("no inventory name specified".to_string()));
        }
        if self.template.trim().is_empty() {
            return Err(SyncError::Validation("no template name specified".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(SyncError::Validation("timeout must be positive".to_string()));
        }
        if let Some(org) = &self.organization
            && org.trim().is_empty()
        {
            return Err(SyncError::Validation(
                "organization override is empty".to_string(),
            ));
        }

        let names = self.host_names();
        if names.is_empty() {
            return Err(SyncError::Validation("no hosts specified".to_string()));
        }

        let mut seen = HashSet::new();
        for name in names {
            if !seen.insert(name) {
                return Err(SyncError::Validation(format!(
                    "host '{}' is listed more than once",
                    name
                )));
            }
        }

        Ok(())
    }
}
