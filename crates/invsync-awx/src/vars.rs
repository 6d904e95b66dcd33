//! Variable encoding
//!
//! AWX stores host variables and `extra_vars` as text holding either JSON or
//! YAML. invsync always writes JSON and accepts both on read.

use crate::error::{AwxError, Result};
use invsync_directory::Variables;
use serde_json::Value;

pub fn encode(vars: &Variables) -> Result<String> {
    Ok(serde_json::to_string(vars)?)
}

pub fn decode(text: &str) -> Result<Variables> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "---" {
        return Ok(Variables::new());
    }

    if let Ok(vars) = serde_json::from_str::<Variables>(trimmed) {
        return Ok(vars);
    }

    match serde_yaml::from_str::<Value>(trimmed) {
        Ok(Value::Object(vars)) => Ok(vars),
        Ok(Value::Null) => Ok(Variables::new()),
        Ok(other) => Err(AwxError::Decode(format!(
            "variables must be a mapping, got {}",
            other
        ))),
        Err(e) => Err(AwxError::Decode(format!("invalid variables: {}", e))),
    }
}
