use anyhow::Context;
use colored::Colorize;
use invsync_awx::{Auth, AwxClient, AwxConfig};
use invsync_config::{Credentials, Settings};
use invsync_core::DesiredState;
use invsync_directory::DirectoryClient;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

/// Parse the given run file, or the discovered one
pub fn load_run_file(file: Option<PathBuf>) -> anyhow::Result<(PathBuf, DesiredState)> {
    let path = match file {
        Some(path) => path,
        None => invsync_config::find_run_file()?,
    };
    let state = invsync_core::parse_run_file(&path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    Ok((path, state))
}

/// Build an AWX client from the loaded settings
pub fn connect(settings: &Settings) -> anyhow::Result<Arc<dyn DirectoryClient>> {
    let auth = match settings.credentials()? {
        Credentials::Token(token) => Auth::Token(token),
        Credentials::Basic { username, password } => Auth::Basic { username, password },
    };
    let config = AwxConfig::new(settings.url()?, auth).with_verify_ssl(settings.verify_ssl);
    let client = AwxClient::new(config)?;
    tracing::debug!(url = client.base_url(), "connected to AWX");
    Ok(Arc::new(client))
}

/// Ask a yes/no question; anything but "y" is a no
pub fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{} [y/N]: ", prompt);
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

/// Print a desired state the way `run` and `validate` show it
pub fn print_state(state: &DesiredState, organization: &str) {
    println!("  inventory:    {}", state.inventory.cyan());
    println!("  organization: {}", organization.cyan());
    println!("  template:     {}", state.template.cyan());
    println!(
        "  timeout:      {}",
        humantime::format_duration(state.timeout).to_string().cyan()
    );
    if !state.extra_vars.is_empty() {
        let keys: Vec<&str> = state.extra_vars.keys().map(String::as_str).collect();
        println!("  extra vars:   {}", keys.join(", "));
    }

    println!();
    println!("{}", format!("Hosts ({}):", state.host_names().len()).bold());
    for host in &state.hosts {
        if host.name.is_empty() {
            println!("  • {}", "(unnamed, skipped)".dimmed());
            continue;
        }
        let group = host.group_name().unwrap_or("(no group)");
        println!("  • {} [{}]", host.name.cyan(), group);
    }
}
