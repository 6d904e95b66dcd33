//! `host` node

use super::Result;
use super::vars::parse_vars;
use crate::error::RunFileError;
use crate::model::DesiredHost;
use kdl::KdlNode;

/// Parse `host "name" group="web" { vars { ... } }`.
///
/// The group may also be given as a `group "web"` child node. An empty name
/// is accepted here; reconciliation skips such hosts with a warning.
pub(super) fn parse_host(node: &KdlNode) -> Result<DesiredHost> {
    let name = node
        .entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .ok_or_else(|| RunFileError::InvalidConfig("host needs a name".to_string()))?;

    let mut host = DesiredHost::new(name);

    for entry in node.entries() {
        if let Some(key) = entry.name()
            && key.value() == "group"
        {
            host.group = entry.value().as_string().map(str::to_string);
        }
    }

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "group" => {
                    host.group = child
                        .entries()
                        .first()
                        .and_then(|e| e.value().as_string())
                        .map(str::to_string);
                }
                "vars" => host.variables.extend(parse_vars(child)?),
                _ => {}
            }
        }
    }

    Ok(host)
}
