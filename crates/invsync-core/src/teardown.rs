//! Inventory teardown
//!
//! Deletes an inventory and everything in it, children first:
//! hosts, then groups, then the inventory itself. The inventory is looked up
//! by (organization, name), the same key reconciliation creates it under.

use crate::ensure::{optional, resolve};
use crate::error::{Result, SyncError};
use invsync_directory::{
    CancellationToken, DirectoryClient, Inventory, ListFilter, Organization, ResourceKind,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// What a teardown deleted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub hosts_deleted: Vec<String>,
    pub groups_deleted: Vec<String>,
    pub inventory_deleted: bool,
}

impl TeardownReport {
    /// Whether the inventory was already absent
    pub fn is_noop(&self) -> bool {
        !self.inventory_deleted && self.hosts_deleted.is_empty() && self.groups_deleted.is_empty()
    }
}

impl fmt::Display for TeardownReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_noop() {
            return write!(f, "nothing to delete");
        }
        write!(
            f,
            "{} hosts, {} groups deleted, inventory {}",
            self.hosts_deleted.len(),
            self.groups_deleted.len(),
            if self.inventory_deleted {
                "deleted"
            } else {
                "kept"
            }
        )
    }
}

fn describe(name: &str, id: i64) -> String {
    format!("{} (id {})", name, id)
}

pub struct TeardownController {
    client: Arc<dyn DirectoryClient>,
    default_organization: String,
}

impl TeardownController {
    pub fn new(client: Arc<dyn DirectoryClient>, default_organization: impl Into<String>) -> Self {
        Self {
            client,
            default_organization: default_organization.into(),
        }
    }

    /// Delete the inventory named `name` in `organization` (or the default
    /// organization) with all its hosts and groups.
    ///
    /// A missing inventory is not an error, a missing organization is. The
    /// first failed delete stops the sequence; running again picks up where
    /// it stopped.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn teardown(
        &self,
        name: &str,
        organization: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<TeardownReport> {
        let mut report = TeardownReport::default();

        let org_name = organization.unwrap_or(&self.default_organization);
        let organization = self.resolve_organization(org_name, cancel).await?;

        let Some(inventory) = self.find_inventory(name, &organization, cancel).await? else {
            info!("inventory not found, nothing to delete");
            return Ok(report);
        };

        let hosts = self
            .client
            .list_hosts(inventory.id, cancel)
            .await
            .map_err(|e| SyncError::remote("list hosts of", ResourceKind::Inventory, name, e))?;
        for host in hosts {
            self.client
                .delete_host(host.id, cancel)
                .await
                .map_err(|e| {
                    SyncError::remote("delete", ResourceKind::Host, describe(&host.name, host.id), e)
                })?;
            debug!(host = %host.name, "host deleted");
            report.hosts_deleted.push(host.name);
        }

        let groups = self
            .client
            .list_groups(inventory.id, cancel)
            .await
            .map_err(|e| SyncError::remote("list groups of", ResourceKind::Inventory, name, e))?;
        for group in groups {
            self.client
                .delete_group(group.id, cancel)
                .await
                .map_err(|e| {
                    SyncError::remote(
                        "delete",
                        ResourceKind::Group,
                        describe(&group.name, group.id),
                        e,
                    )
                })?;
            debug!(group = %group.name, "group deleted");
            report.groups_deleted.push(group.name);
        }

        self.client
            .delete_inventory(inventory.id, cancel)
            .await
            .map_err(|e| {
                SyncError::remote("delete", ResourceKind::Inventory, describe(name, inventory.id), e)
            })?;
        report.inventory_deleted = true;

        info!(inventory_id = inventory.id, %report, "inventory deleted");
        Ok(report)
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

    /// The inventory named exactly `name` owned by `organization`
    async fn find_inventory(
        &self,
        name: &str,
        organization: &Organization,
        cancel: &CancellationToken,
    ) -> Result<Option<Inventory>> {
        let filter = ListFilter::by_name(name).in_organization(organization.id);
        let inventories = self
            .client
            .list_inventories(&filter, cancel)
            .await
            .map_err(|e| SyncError::remote("look up", ResourceKind::Inventory, name, e))?;
        Ok(inventories
            .into_iter()
            .find(|i| i.name == name && i.organization == organization.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invsync_directory::{InMemoryDirectory, Operation, Variables};

    fn populated() -> (Arc<InMemoryDirectory>, Inventory) {
        let dir = Arc::new(InMemoryDirectory::new());
        let org = dir.seed_organization("Default");
        let inv = dir.seed_inventory("lab", org.id);
        let web = dir.seed_group(inv.id, "web");
        let a = dir.seed_host(inv.id, "a.example.com", Variables::new());
        let b = dir.seed_host(inv.id, "b.example.com", Variables::new());
        dir.link(web.id, a.id);
        dir.link(web.id, b.id);
        (dir, inv)
    }

    #[tokio::test]
    async fn test_missing_inventory_is_noop() {
        let dir = Arc::new(InMemoryDirectory::new());
        dir.seed_organization("Default");
        let controller = TeardownController::new(dir.clone(), "Default");

        let report = controller
            .teardown("lab", None, &CancellationToken::new())
            .await
            .unwrap();

        assert!(report.is_noop());
        assert!(dir.calls().iter().all(|c| !c.operation.is_mutation()));
    }

    #[tokio::test]
    async fn test_deletes_children_before_inventory() {
        let (dir, inv) = populated();
        let controller = TeardownController::new(dir.clone(), "Default");

        let report = controller
            .teardown("lab", None, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.hosts_deleted, vec!["a.example.com", "b.example.com"]);
        assert_eq!(report.groups_deleted, vec!["web"]);
        assert!(report.inventory_deleted);
        assert!(dir.inventories().is_empty());
        assert!(dir.hosts(inv.id).is_empty());

        let deletes: Vec<Operation> = dir
            .calls()
            .into_iter()
            .map(|c| c.operation)
            .filter(Operation::is_delete)
            .collect();
        assert_eq!(
            deletes,
            vec![
                Operation::DeleteHost,
                Operation::DeleteHost,
                Operation::DeleteGroup,
                Operation::DeleteInventory,
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_delete_stops_and_retry_completes() {
        let (dir, inv) = populated();
        let controller = TeardownController::new(dir.clone(), "Default");
        let cancel = CancellationToken::new();
        dir.fail_next(Operation::DeleteGroup, 1);

        let err = controller.teardown("lab", None, &cancel).await.unwrap_err();
        match err {
            SyncError::Remote { kind, target, .. } => {
                assert_eq!(kind, ResourceKind::Group);
                assert!(target.starts_with("web (id "));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(dir.count(Operation::DeleteInventory), 0);
        assert_eq!(dir.inventories().len(), 1);
        assert!(dir.hosts(inv.id).is_empty());

        let report = controller.teardown("lab", None, &cancel).await.unwrap();
        assert!(report.hosts_deleted.is_empty());
        assert!(report.inventory_deleted);
        assert!(dir.inventories().is_empty());
    }

    #[tokio::test]
    async fn test_only_deletes_inventory_of_its_organization() {
        let (dir, default_inv) = populated();
        let ops = dir.seed_organization("Ops");
        let ops_inv = dir.seed_inventory("lab", ops.id);
        dir.seed_host(ops_inv.id, "c.example.com", Variables::new());
        let cancel = CancellationToken::new();

        let controller = TeardownController::new(dir.clone(), "Ops");
        let report = controller.teardown("lab", None, &cancel).await.unwrap();

        assert_eq!(report.hosts_deleted, vec!["c.example.com"]);
        let remaining: Vec<i64> = dir.inventories().iter().map(|i| i.id).collect();
        assert_eq!(remaining, vec![default_inv.id]);
        assert_eq!(dir.hosts(default_inv.id).len(), 2);

        let report = controller
            .teardown("lab", Some("Default"), &cancel)
            .await
            .unwrap();
        assert_eq!(report.hosts_deleted.len(), 2);
        assert!(dir.inventories().is_empty());
    }

    #[tokio::test]
    async fn test_missing_organization_is_not_found() {
        let (dir, _inv) = populated();
        let controller = TeardownController::new(dir.clone(), "Ops");

        let err = controller
            .teardown("lab", None, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SyncError::NotFound {
                kind: ResourceKind::Organization,
                ..
            }
        ));
        assert_eq!(dir.count(Operation::ListInventories), 0);
        assert_eq!(dir.inventories().len(), 1);
    }
}
