//! `vars` blocks
//!
//! Each child of a `vars` node becomes one variable:
//!
//! * `key "value"` → scalar
//! * `key 1 2 3` → array
//! * `key { ... }` → nested object
//! * `key` → null

use super::Result;
use crate::error::RunFileError;
use invsync_directory::Variables;
use kdl::{KdlNode, KdlValue};
use serde_json::{Number, Value};

/// Convert the children of a `vars` node into variables
pub fn parse_vars(node: &KdlNode) -> Result<Variables> {
    let mut vars = Variables::new();
    if let Some(children) = node.children() {
        for child in children.nodes() {
            vars.insert(child.name().value().to_string(), node_value(child)?);
        }
    }
    Ok(vars)
}

fn node_value(node: &KdlNode) -> Result<Value> {
    if node.children().is_some() {
        return Ok(Value::Object(parse_vars(node)?));
    }

    let mut values = node
        .entries()
        .iter()
        .filter(|e| e.name().is_none())
        .map(|e| kdl_value_to_json(e.value()))
        .collect::<Result<Vec<_>>>()?;

    Ok(match values.len() {
        0 => Value::Null,
        1 => values.remove(0),
        _ => Value::Array(values),
    })
}

/// Convert a single KDL value to JSON
pub fn kdl_value_to_json(value: &KdlValue) -> Result<Value> {
    Ok(match value {
        KdlValue::String(s) => Value::String(s.clone()),
        KdlValue::Integer(i) => {
            if let Ok(v) = i64::try_from(*i) {
                Value::from(v)
            } else if let Ok(v) = u64::try_from(*i) {
                Value::from(v)
            } else {
                return Err(RunFileError::InvalidConfig(format!(
                    "integer out of range: {}",
                    i
                )));
            }
        }
        KdlValue::Float(f) => Number::from_f64(*f).map(Value::Number).ok_or_else(|| {
            RunFileError::InvalidConfig(format!("unsupported float value: {}", f))
        })?,
        KdlValue::Bool(b) => Value::Bool(*b),
        KdlValue::Null => Value::Null,
    })
}
