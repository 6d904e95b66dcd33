//! AWX wire types

use crate::error::Result;
use crate::vars;
use invsync_directory::{Group, Host, Inventory, JobStatus, JobTemplate, Organization};
use serde::{Deserialize, Serialize};

/// A page of a list endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct Page<T> {
    #[serde(default)]
    pub next: Option<String>,
    pub results: Vec<T>,
}

/// Error body, e.g. `{"detail": "Not found."}` or `{"name": ["..."]}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ApiErrorBody {
    Detail { detail: String },
    Fields(serde_json::Map<String, serde_json::Value>),
}

impl ApiErrorBody {
    pub fn message(&self) -> String {
        match self {
            ApiErrorBody::Detail { detail } => detail.clone(),
            ApiErrorBody::Fields(fields) => fields
                .iter()
                .map(|(field, value)| match value {
                    serde_json::Value::Array(items) => format!(
                        "{}: {}",
                        field,
                        items
                            .iter()
                            .map(|i| i.as_str().map(str::to_string).unwrap_or_else(|| i.to_string()))
                            .collect::<Vec<_>>()
                            .join(" ")
                    ),
                    serde_json::Value::String(s) => format!("{}: {}", field, s),
                    other => format!("{}: {}", field, other),
                })
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

// ============ Resources ============

#[derive(Debug, Deserialize)]
pub(crate) struct ApiOrganization {
    pub id: i64,
    pub name: String,
}

impl From<ApiOrganization> for Organization {
    fn from(o: ApiOrganization) -> Self {
        Organization {
            id: o.id,
            name: o.name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiInventory {
    pub id: i64,
    pub name: String,
    pub organization: i64,
}

impl From<ApiInventory> for Inventory {
    fn from(i: ApiInventory) -> Self {
        Inventory {
            id: i.id,
            name: i.name,
            organization: i.organization,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiGroup {
    pub id: i64,
    pub name: String,
    pub inventory: i64,
}

impl From<ApiGroup> for Group {
    fn from(g: ApiGroup) -> Self {
        Group {
            id: g.id,
            name: g.name,
            inventory: g.inventory,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiHost {
    pub id: i64,
    pub name: String,
    pub inventory: i64,
    #[serde(default)]
    pub variables: String,
}

impl ApiHost {
    pub fn into_host(self) -> Result<Host> {
        Ok(Host {
            id: self.id,
            variables: vars::decode(&self.variables)?,
            name: self.name,
            inventory: self.inventory,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiJobTemplate {
    pub id: i64,
    pub name: String,
}

impl From<ApiJobTemplate> for JobTemplate {
    fn from(t: ApiJobTemplate) -> Self {
        JobTemplate {
            id: t.id,
            name: t.name,
        }
    }
}

/// Response of `POST /job_templates/{id}/launch/`
#[derive(Debug, Deserialize)]
pub(crate) struct ApiLaunched {
    pub id: i64,
    /// Older AWX versions report the job id here
    #[serde(default)]
    pub job: Option<i64>,
    #[serde(default)]
    pub status: Option<JobStatus>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiJob {
    pub status: JobStatus,
}

// ============ Requests ============

#[derive(Debug, Serialize)]
pub(crate) struct HostBody {
    pub name: String,
    pub inventory: i64,
    pub variables: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct HostVariablesBody {
    pub variables: String,
}

/// Attach an existing host to a group
#[derive(Debug, Serialize)]
pub(crate) struct AssociateBody {
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct LaunchBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_vars: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_body_messages() {
        let detail: ApiErrorBody = serde_json::from_value(json!({"detail": "Not found."})).unwrap();
        assert_eq!(detail.message(), "Not found.");

        let fields: ApiErrorBody = serde_json::from_value(json!({
            "name": ["Host with this Name and Inventory already exists."]
        }))
        .unwrap();
        assert_eq!(
            fields.message(),
            "name: Host with this Name and Inventory already exists."
        );
    }

    #[test]
    fn test_host_variables_decoded() {
        let api: ApiHost = serde_json::from_value(json!({
            "id": 3,
            "name": "a.example.com",
            "inventory": 1,
            "variables": "role: primary",
        }))
        .unwrap();
        let host = api.into_host().unwrap();
        assert_eq!(host.variables["role"], "primary");
    }
}
