//! Run file parser
//!
//! A run file is a KDL document describing one [`DesiredState`]:
//!
//! ```kdl
//! inventory "lab"
//! organization "Default"
//! template "deploy-web"
//! timeout "30m"
//! vars { release "1.4.2"; canary #true }
//! host "a.example.com" group="web" {
//!     vars { role "primary" }
//! }
//! host "b.example.com" group="web"
//! ```

mod host;
mod vars;


use crate::error::RunFileError;
use crate::model::DesiredState;
use host::parse_host;
use kdl::{KdlDocument, KdlNode};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

pub use vars::{kdl_value_to_json, parse_vars};

type Result<T> = std::result::Result<T, RunFileError>;

/// Timeout applied when the run file has no `timeout` node
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Read and parse a run file
pub fn parse_run_file<P: AsRef<Path>>(path: P) -> Result<DesiredState> {
    let content = fs::read_to_string(path.as_ref())?;
    debug!(path = %path.as_ref().display(), "parsing run file");
    parse_run(&content)
}

/// Parse a run file from a string
pub fn parse_run(content: &str) -> Result<DesiredState> {
    let doc: KdlDocument = content.parse()?;

    let mut inventory = None;
    let mut organization = None;
    let mut template = None;
    let mut timeout = DEFAULT_RUN_TIMEOUT;
    let mut hosts = Vec::new();
    let mut extra_vars = invsync_directory::Variables::new();

    for node in doc.nodes() {
        match node.name().value() {
            "inventory" => inventory = Some(required_string(node)?),
            "organization" => organization = Some(required_string(node)?),
            "template" => template = Some(required_string(node)?),
            "timeout" => timeout = parse_timeout(node)?,
            "vars" => extra_vars.extend(parse_vars(node)?),
            "host" => hosts.push(parse_host(node)?),
            other => {
                debug!(node = other, "skipping unknown run file node");
            }
        }
    }

    let inventory =
        inventory.ok_or_else(|| RunFileError::InvalidConfig("missing `inventory` node".to_string()))?;
    let template =
        template.ok_or_else(|| RunFileError::InvalidConfig("missing `template` node".to_string()))?;

    let mut state = DesiredState::new(inventory, template, timeout);
    state.organization = organization;
    state.hosts = hosts;
    state.extra_vars = extra_vars;
    Ok(state)
}

/// First argument of `node` as a string
fn required_string(node: &KdlNode) -> Result<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(str::to_string)
        .ok_or_else(|| {
            RunFileError::InvalidConfig(format!(
                "`{}` needs a string argument",
                node.name().value()
            ))
        })
}

/// `timeout 600` (seconds) or `timeout "10m"`
fn parse_timeout(node: &KdlNode) -> Result<Duration> {
    let value = node
        .entries()
        .first()
        .map(|e| e.value())
        .ok_or_else(|| RunFileError::InvalidConfig("`timeout` needs a value".to_string()))?;

    if let Some(seconds) = value.as_integer() {
        let seconds = u64::try_from(seconds).map_err(|_| {
            RunFileError::InvalidConfig(format!("timeout must not be negative: {}", seconds))
        })?;
        return Ok(Duration::from_secs(seconds));
    }

    if let Some(text) = value.as_string() {
        return humantime::parse_duration(text)
            .map_err(|e| RunFileError::InvalidConfig(format!("invalid timeout '{}': {}", text, e)));
    }

    Err(RunFileError::InvalidConfig(format!(
        "timeout must be seconds or a duration string, got {}",
        value
    )))
}
