//! Decoding of `terraform output -json`.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::IacResult;

/// One entry of `terraform output -json`.
#[derive(Debug, Clone, Deserialize)]
pub struct TerraformOutput {
    #[serde(default)]
    pub sensitive: bool,
    #[serde(rename = "type", default)]
    pub output_type: Value,
    pub value: Value,
}

/// Decode output JSON into a name to value mapping.
///
/// Empty output and `{}` both mean "no outputs". String values are returned
/// verbatim, anything else as compact JSON.
pub fn decode_outputs(stdout: &str) -> IacResult<BTreeMap<String, String>> {
    if stdout.trim().is_empty() {
        return Ok(BTreeMap::new());
    }

    let raw: BTreeMap<String, TerraformOutput> = serde_json::from_str(stdout)?;
    Ok(raw
        .into_iter()
        .map(|(name, output)| (name, render_value(&output.value)))
        .collect())
}

pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
