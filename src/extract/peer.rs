//! Peer-comparison table parsed from the last output section

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JSON table comparing the startup with its peers.
///
/// Expected shape is `{"comparison": {"columns": [...], "companies": [...]}}`,
/// but any JSON value the model produced is kept as-is. Text that is not
/// JSON becomes an empty object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerComparisonTable(Value);

impl Default for PeerComparisonTable {
    fn default() -> Self {
        Self::empty()
    }
}

impl PeerComparisonTable {
    pub fn empty() -> Self {
        Self(Value::Object(Map::new()))
    }

    /// Parse section text; never fails, logging and substituting `{}` instead.
    pub fn parse(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => Self(value),
            Err(e) => {
                tracing::warn!(error = %e, "peer comparison is not valid JSON, using empty table");
                Self::empty()
            }
        }
    }

    /// True for the empty-object table
    pub fn is_empty(&self) -> bool {
        self.0.as_object().is_some_and(Map::is_empty)
    }

    /// Column headings, in order
    pub fn columns(&self) -> Vec<&str> {
        self.0
            .pointer("/comparison/columns")
            .and_then(Value::as_array)
            .map(|cols| cols.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Company rows, in order
    pub fn companies(&self) -> &[Value] {
        self.0
            .pointer("/comparison/companies")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for PeerComparisonTable {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
