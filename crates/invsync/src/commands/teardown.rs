use crate::utils;
use colored::Colorize;
use invsync_config::Settings;
use invsync_core::{Runner, RunnerConfig};
use tokio_util::sync::CancellationToken;

pub async fn handle(
    inventory: &str,
    organization: Option<&str>,
    yes: bool,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let settings = Settings::load()?;
    let org_name = organization.unwrap_or(&settings.organization);

    if !yes {
        let prompt = format!(
            "Delete inventory '{}' of organization '{}' with all of its hosts and groups?",
            inventory, org_name
        );
        if !utils::confirm(&prompt)? {
            println!("{}", "Aborted.".yellow());
            return Ok(());
        }
    }

    let client = utils::connect(&settings)?;
    let runner = Runner::new(
        client,
        RunnerConfig {
            organization: settings.organization.clone(),
            poll_interval: settings.poll_interval,
        },
    );

    println!(
        "{}",
        format!("Tearing down inventory '{}' ({})...", inventory, org_name).yellow()
    );
    let report = runner.teardown(inventory, Some(org_name), cancel).await?;

    if report.is_noop() {
        println!("{}", "Inventory not found, nothing to delete".dimmed());
    } else {
        for host in &report.hosts_deleted {
            println!("  ✓ host {}", host);
        }
        for group in &report.groups_deleted {
            println!("  ✓ group {}", group);
        }
        println!("{}", format!("✓ {}", report).green().bold());
    }

    Ok(())
}
