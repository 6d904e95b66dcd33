//! Typed request payloads for Directory Service operations

use crate::model::Variables;
use serde::{Deserialize, Serialize};

/// Server-side filter for list operations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFilter {
    pub name: Option<String>,
    pub organization: Option<i64>,
}

impl ListFilter {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn in_organization(mut self, organization: i64) -> Self {
        self.organization = Some(organization);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateInventory {
    pub name: String,
    pub organization: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateGroup {
    pub name: String,
    pub inventory: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateHost {
    pub name: String,
    pub inventory: i64,
    pub variables: Variables,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// Host update; only variables are ever changed by reconciliation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateHost {
    pub variables: Variables,
}

/// Associates a host (by name) with a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddHostToGroup {
    pub inventory: i64,
    pub name: String,
}

/// Launch-time overrides for a job template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LaunchJob {
    pub inventory: Option<i64>,
    /// Host limit expression, e.g. `"a.example.com,b.example.com"`
    pub limit: Option<String>,
    pub extra_vars: Option<Variables>,
}
