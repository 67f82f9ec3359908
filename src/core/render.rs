//! Rendering of plaintext field maps for output.

use std::collections::BTreeMap;

use crate::core::aggregate::EnvMap;
use crate::error::Result;

/// Pretty-printed JSON object, keys in map order.
pub fn fields_to_json(fields: &BTreeMap<String, String>) -> Result<String> {
    Ok(serde_json::to_string_pretty(fields)?)
}

/// Pretty-printed JSON object for an environment map, keys sorted.
pub fn env_to_json(vars: &EnvMap) -> Result<String> {
    let map: BTreeMap<&str, &str> = vars.iter().collect();
    Ok(serde_json::to_string_pretty(&map)?)
}

/// `KEY=VALUE` lines in map order. Values are not escaped or quoted.
pub fn to_env_lines<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    pairs
        .into_iter()
        .map(|(key, value)| format!("{}={}\n", key, value))
        .collect()
}
