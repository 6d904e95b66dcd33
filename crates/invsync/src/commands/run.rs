use crate::utils;
use colored::Colorize;
use invsync_config::Settings;
use invsync_core::{Runner, RunnerConfig};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct RunOptions {
    pub file: Option<PathBuf>,
    pub timeout: Option<Duration>,
    pub organization: Option<String>,
    pub yes: bool,
}

pub async fn handle(options: RunOptions, cancel: &CancellationToken) -> anyhow::Result<()> {
    let settings = Settings::load()?;

    let (path, mut state) = utils::load_run_file(options.file)?;
    if let Some(timeout) = options.timeout {
        state.timeout = timeout;
    }
    if let Some(organization) = options.organization {
        state.organization = Some(organization);
    }
    state.validate()?;

    let organization = state
        .organization
        .clone()
        .unwrap_or_else(|| settings.organization.clone());

    println!("Run file: {}", path.display().to_string().cyan());
    utils::print_state(&state, &organization);
    println!();

    if !options.yes {
        let prompt = format!(
            "Reconcile inventory '{}' and launch '{}'?",
            state.inventory, state.template
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

    println!("{}", "Reconciling inventory...".blue());
    let outcome = runner.run(&state, cancel).await?;

    println!();
    println!(
        "{} {} (id {})",
        "Inventory:".bold(),
        outcome.inventory.name.cyan(),
        outcome.inventory.id
    );
    println!("  {}", outcome.report);
    for warning in &outcome.report.warnings {
        println!("  {} {}", "⚠".yellow(), warning.to_string().yellow());
    }
    println!(
        "{}",
        format!("✓ Job {} finished: {}", outcome.job.id, outcome.status)
            .green()
            .bold()
    );

    Ok(())
}
