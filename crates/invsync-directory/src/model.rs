//! Resource types exposed by the Directory Service

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque key → value mapping used for host variables and job extra vars.
///
/// The wire encoding (JSON text, YAML text, nested object) is the concern of
/// the `DirectoryClient` implementation.
pub type Variables = serde_json::Map<String, serde_json::Value>;

/// Kind of remote resource, used for error context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Organization,
    Inventory,
    Group,
    Host,
    JobTemplate,
    Job,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Organization => write!(f, "organization"),
            ResourceKind::Inventory => write!(f, "inventory"),
            ResourceKind::Group => write!(f, "group"),
            ResourceKind::Host => write!(f, "host"),
            ResourceKind::JobTemplate => write!(f, "job template"),
            ResourceKind::Job => write!(f, "job"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub id: i64,
    pub name: String,
    /// Owning organization id
    pub organization: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    /// Owning inventory id
    pub inventory: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Host {
    pub id: i64,
    pub name: String,
    /// Owning inventory id
    pub inventory: i64,
    #[serde(default)]
    pub variables: Variables,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTemplate {
    pub id: i64,
    pub name: String,
}

/// A job run started from a template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    /// Template the job was launched from
    pub template: i64,
    pub status: JobStatus,
}

/// Job status as reported by the platform
///
/// ```text
/// new ─▶ pending ─▶ waiting ─▶ running ─┬─▶ successful
///                                       ├─▶ failed
///                                       ├─▶ error
///                                       └─▶ canceled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    New,
    Pending,
    Waiting,
    Running,
    Successful,
    Failed,
    Error,
    Canceled,
    /// Status string this crate does not know; treated as non-terminal
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// No further transition happens from a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Successful | JobStatus::Failed | JobStatus::Error | JobStatus::Canceled
        )
    }

    pub fn is_success(&self) -> bool {
        *self == JobStatus::Successful
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::New => "new",
            JobStatus::Pending => "pending",
            JobStatus::Waiting => "waiting",
            JobStatus::Running => "running",
            JobStatus::Successful => "successful",
            JobStatus::Failed => "failed",
            JobStatus::Error => "error",
            JobStatus::Canceled => "canceled",
            JobStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "new" => JobStatus::New,
            "pending" => JobStatus::Pending,
            "waiting" => JobStatus::Waiting,
            "running" => JobStatus::Running,
            "successful" => JobStatus::Successful,
            "failed" => JobStatus::Failed,
            "error" => JobStatus::Error,
            "canceled" => JobStatus::Canceled,
            _ => JobStatus::Unknown,
        })
    }
}
