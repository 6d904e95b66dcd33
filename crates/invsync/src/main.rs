mod commands;
mod utils;

use clap::{Parser, Subcommand};
use colored::Colorize;
use invsync_core::SyncError;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "invsync")]
#[command(about = "Sync hosts into an AWX inventory and run a job template against it", long_about = None)]
struct Cli {
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile the inventory, launch the template and wait for the job
    Run {
        /// Run file (defaults to run.kdl discovery)
        file: Option<PathBuf>,
        /// Job timeout, e.g. "30m" (overrides the run file)
        #[arg(short, long, env = "INVSYNC_TIMEOUT", value_parser = humantime::parse_duration)]
        timeout: Option<Duration>,
        /// Organization (overrides the run file and AWX_ORGANIZATION)
        #[arg(short, long)]
        organization: Option<String>,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Delete an inventory with all of its hosts and groups
    Teardown {
        /// Inventory name
        inventory: String,
        /// Organization owning the inventory (overrides AWX_ORGANIZATION)
        #[arg(short, long)]
        organization: Option<String>,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Check a run file without contacting AWX
    Validate {
        /// Run file (defaults to run.kdl discovery)
        file: Option<PathBuf>,
    },
    /// Show version information
    Version,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "invsync=debug" } else { "invsync=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Cancel `token` on the first Ctrl-C
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!();
            eprintln!("{}", "Interrupted, cancelling...".yellow());
            token.cancel();
        }
    });
}

/// Print an error and its causes, skipping causes already in the message
fn report_error(err: &anyhow::Error) {
    eprintln!("{} {}", "✗".red().bold(), err.to_string().red());
    let mut shown = err.to_string();
    for cause in err.chain().skip(1) {
        let text = cause.to_string();
        if !shown.contains(&text) {
            eprintln!("  {} {}", "caused by:".dimmed(), text);
        }
        shown = text;
    }
}

fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<SyncError>().map(SyncError::root_cause) {
        Some(SyncError::Cancelled) => 130,
        _ => 1,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let result = match cli.command {
        Commands::Version => {
            println!("invsync {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Validate { file } => commands::validate::handle(file),
        Commands::Run {
            file,
            timeout,
            organization,
            yes,
        } => {
            let options = commands::run::RunOptions {
                file,
                timeout,
                organization,
                yes,
            };
            commands::run::handle(options, &cancel).await
        }
        Commands::Teardown {
            inventory,
            organization,
            yes,
        } => commands::teardown::handle(&inventory, organization.as_deref(), yes, &cancel).await,
    };

    if let Err(e) = result {
        report_error(&e);
        std::process::exit(exit_code(&e));
    }
}
