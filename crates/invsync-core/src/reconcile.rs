//! Inventory reconciliation
//!
//! Converges the remote Organization → Inventory → Group → Host graph towards
//! a [`DesiredState`] using only create and update operations.
//!
//! Order of side effects:
//!
//! 1. organization lookup (never created)
//! 2. inventory lookup / create
//! 3. every missing group is created
//! 4. hosts are created (and linked to their group) or have their variables
//!    updated
//!
//! Membership of hosts that already exist is left alone, so a host moved to a
//! different group in the desired state keeps its remote group.

use crate::ensure::{ensure, optional, resolve};
use crate::error::{Result, SyncError};
use crate::model::DesiredState;
use invsync_directory::{
    AddHostToGroup, CancellationToken, CreateGroup, CreateHost, CreateInventory, DirectoryClient,
    DirectoryError, Group, Host, Inventory, ListFilter, Organization, ResourceKind, UpdateHost,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Something reconciliation noticed but did not treat as a failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileWarning {
    /// A newly created host could not be linked to any known group
    UngroupedHost { host: String, group: Option<String> },
    /// A desired host entry had an empty name and was skipped
    UnnamedHost { index: usize },
}

impl fmt::Display for ReconcileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileWarning::UngroupedHost { host, group: None } => {
                write!(f, "host '{}' has no group and was left ungrouped", host)
            }
            ReconcileWarning::UngroupedHost {
                host,
                group: Some(group),
            } => write!(
                f,
                "host '{}' references unknown group '{}' and was left ungrouped",
                host, group
            ),
            ReconcileWarning::UnnamedHost { index } => {
                write!(f, "host entry #{} has no name and was skipped", index)
            }
        }
    }
}

/// What a reconciliation changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub inventory_created: bool,
    pub groups_created: Vec<String>,
    pub hosts_created: Vec<String>,
    pub hosts_updated: Vec<String>,
    pub warnings: Vec<ReconcileWarning>,
}

impl fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "inventory {}, {} groups created, {} hosts created, {} hosts updated, {} warnings",
            if self.inventory_created {
                "created"
            } else {
                "reused"
            },
            self.groups_created.len(),
            self.hosts_created.len(),
            self.hosts_updated.len(),
            self.warnings.len()
        )
    }
}

/// Result of a successful reconciliation
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub inventory: Inventory,
    pub report: ReconcileReport,
}

/// Converges a remote inventory towards a desired host/group set
pub struct InventoryReconciler {
    client: Arc<dyn DirectoryClient>,
    default_organization: String,
}

impl InventoryReconciler {
    pub fn new(client: Arc<dyn DirectoryClient>, default_organization: impl Into<String>) -> Self {
        Self {
            client,
            default_organization: default_organization.into(),
        }
    }

    /// Make the remote inventory contain every desired group and host.
    ///
    /// `state` is validated before any remote call. Idempotent: re-running with the same state issues only host variable
    /// updates. A failure part way through leaves earlier creates in place;
    /// running again converges.
    #[tracing::instrument(skip_all, fields(inventory = %state.inventory))]
    pub async fn reconcile(
        &self,
        state: &DesiredState,
        cancel: &CancellationToken,
    ) -> Result<Reconciliation> {
        state.validate()?;
        let mut report = ReconcileReport::default();

        let org_name = state
            .organization
            .as_deref()
            .unwrap_or(&self.default_organization);
        let organization = self.resolve_organization(org_name, cancel).await?;

        let inventory = self
            .ensure_inventory(&state.inventory, &organization, &mut report, cancel)
            .await?;
        let groups = self
            .ensure_groups(&inventory, state, &mut report, cancel)
            .await?;
        self.sync_hosts(&inventory, state, &groups, &mut report, cancel)
            .await?;

        info!(inventory_id = inventory.id, %report, "inventory reconciled");
        Ok(Reconciliation { inventory, report })
    }

    async fn resolve_organization(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Organization> {
        let client = &self.client;
        resolve(ResourceKind::Organization, name, move || async move {
            optional(client.find_organization_by_name(name, cancel).await)
        })
        .await
    }

    async fn ensure_inventory(
        &self,
        name: &str,
        organization: &Organization,
        report: &mut ReconcileReport,
        cancel: &CancellationToken,
    ) -> Result<Inventory> {
        let client = &self.client;
        let org_id = organization.id;
        let filter = ListFilter::by_name(name).in_organization(org_id);

        let ensured = ensure(
            ResourceKind::Inventory,
            name,
            move || async move {
                let inventories = client.list_inventories(&filter, cancel).await?;
                Ok::<_, DirectoryError>(
                    inventories
                        .into_iter()
                        .find(|i| i.name == name && i.organization == org_id),
                )
            },
            move || async move {
                let request = CreateInventory {
                    name: name.to_string(),
                    organization: org_id,
                    description: None,
                };
                client.create_inventory(&request, cancel).await
            },
        )
        .await?;

        report.inventory_created = ensured.created;
        Ok(ensured.resource)
    }

    /// Create every desired group missing from the inventory.
    /// Returns group name → id for all groups of the inventory.
    async fn ensure_groups(
        &self,
        inventory: &Inventory,
        state: &DesiredState,
        report: &mut ReconcileReport,
        cancel: &CancellationToken,
    ) -> Result<HashMap<String, i64>> {
        let client = &self.client;
        let inventory_id = inventory.id;

        let existing: Vec<Group> = client
            .list_groups(inventory_id, cancel)
            .await
            .map_err(|e| {
                SyncError::remote("list groups of", ResourceKind::Inventory, &inventory.name, e)
            })?;

        let mut ids: HashMap<String, i64> =
            existing.iter().map(|g| (g.name.clone(), g.id)).collect();

        for name in state.group_names() {
            let known = existing.iter().find(|g| g.name == name).cloned();
            let ensured = ensure(
                ResourceKind::Group,
                name,
                move || async move { Ok::<_, DirectoryError>(known) },
                move || async move {
                    let request = CreateGroup {
                        name: name.to_string(),
                        inventory: inventory_id,
                        description: None,
                    };
                    client.create_group(&request, cancel).await
                },
            )
            .await?;

            if ensured.created {
                report.groups_created.push(name.to_string());
            }
            ids.insert(name.to_string(), ensured.resource.id);
        }

        Ok(ids)
    }

    async fn sync_hosts(
        &self,
        inventory: &Inventory,
        state: &DesiredState,
        groups: &HashMap<String, i64>,
        report: &mut ReconcileReport,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let client = &self.client;
        let inventory_id = inventory.id;

        let existing: Vec<Host> = client
            .list_hosts(inventory_id, cancel)
            .await
            .map_err(|e| {
                SyncError::remote("list hosts of", ResourceKind::Inventory, &inventory.name, e)
            })?;

        for (index, desired) in state.hosts.iter().enumerate() {
            if desired.name.is_empty() {
                warn!(index, "skipping desired host without a name");
                report.warnings.push(ReconcileWarning::UnnamedHost { index });
                continue;
            }

            let name = desired.name.as_str();
            let known = existing.iter().find(|h| h.name == name).cloned();
            let ensured = ensure(
                ResourceKind::Host,
                name,
                move || async move { Ok::<_, DirectoryError>(known) },
                move || async move {
                    let request = CreateHost {
                        name: name.to_string(),
                        inventory: inventory_id,
                        variables: desired.variables.clone(),
                        description: None,
                        enabled: None,
                    };
                    client.create_host(&request, cancel).await
                },
            )
            .await?;

            if !ensured.created {
                // Existing hosts keep their group membership
                let request = UpdateHost {
                    variables: desired.variables.clone(),
                };
                client
                    .update_host(ensured.resource.id, &request, cancel)
                    .await
                    .map_err(|e| SyncError::remote("update", ResourceKind::Host, name, e))?;
                report.hosts_updated.push(name.to_string());
                continue;
            }

            report.hosts_created.push(name.to_string());

            match desired.group_name().and_then(|g| groups.get(g)) {
                Some(&group_id) => {
                    let request = AddHostToGroup {
                        inventory: inventory_id,
                        name: name.to_string(),
                    };
                    client
                        .add_host_to_group(group_id, &request, cancel)
                        .await
                        .map_err(|e| {
                            SyncError::remote("add to group", ResourceKind::Host, name, e)
                        })?;
                }
                None => {
                    warn!(
                        host = name,
                        group = ?desired.group,
                        inventory = %inventory.name,
                        known_groups = ?groups.keys().collect::<Vec<_>>(),
                        "host is not a member of any known group"
                    );
                    report.warnings.push(ReconcileWarning::UngroupedHost {
                        host: name.to_string(),
                        group: desired.group_name().map(str::to_string),
                    });
                }
            }
        }

        Ok(())
    }
}
