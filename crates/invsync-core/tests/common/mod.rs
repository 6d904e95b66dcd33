use invsync_core::{DesiredHost, DesiredState, Runner, RunnerConfig};
use invsync_directory::{InMemoryDirectory, Inventory, JobTemplate, Organization};
use std::sync::Arc;
use std::time::Duration;

/// An in-memory platform with the `Default` organization and a
/// `deploy-web` job template
pub struct TestPlatform {
    pub directory: Arc<InMemoryDirectory>,
    pub organization: Organization,
    pub template: JobTemplate,
}

impl TestPlatform {
    pub fn new() -> Self {
        let directory = Arc::new(InMemoryDirectory::new());
        let organization = directory.seed_organization("Default");
        let template = directory.seed_job_template("deploy-web");
        Self {
            directory,
            organization,
            template,
        }
    }

    pub fn runner(&self) -> Runner {
        Runner::new(
            self.directory.clone(),
            RunnerConfig {
                poll_interval: Duration::from_secs(1),
                ..RunnerConfig::default()
            },
        )
    }

    /// The single inventory named `name`
    pub fn inventory(&self, name: &str) -> Inventory {
        let matching: Vec<Inventory> = self
            .directory
            .inventories()
            .into_iter()
            .filter(|i| i.name == name)
            .collect();
        assert_eq!(matching.len(), 1, "expected exactly one inventory '{name}'");
        matching.into_iter().next().unwrap()
    }

    /// Sorted (host, groups) pairs of an inventory
    #[allow(dead_code)]
    pub fn snapshot(&self, inventory: i64) -> Vec<(String, Vec<String>)> {
        let mut hosts: Vec<(String, Vec<String>)> = self
            .directory
            .hosts(inventory)
            .into_iter()
            .map(|h| {
                let groups = self.directory.host_groups(inventory, &h.name);
                (h.name, groups)
            })
            .collect();
        hosts.sort();
        hosts
    }
}

/// inventory "lab", two hosts in "web"
pub fn lab_state() -> DesiredState {
    DesiredState::new("lab", "deploy-web", Duration::from_secs(300))
        .with_host(DesiredHost::new("a.example.com").in_group("web"))
        .with_host(DesiredHost::new("b.example.com").in_group("web"))
        .with_extra_var("release", "1.4.2")
}
