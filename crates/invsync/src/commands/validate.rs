use crate::utils;
use colored::Colorize;
use std::path::PathBuf;

pub fn handle(file: Option<PathBuf>) -> anyhow::Result<()> {
    println!("{}", "Validating run file...".blue());

    let (path, state) = utils::load_run_file(file)?;
    println!("Run file: {}", path.display().to_string().cyan());

    state.validate()?;

    println!("{}", "✓ Run file is valid".green().bold());
    println!();
    let organization = state
        .organization
        .clone()
        .unwrap_or_else(|| "(from settings)".to_string());
    utils::print_state(&state, &organization);

    Ok(())
}
