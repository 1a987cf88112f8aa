use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::{Map, Value};

/// One tabular query response: ordered rows of named cells.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct QueryResult {
    #[serde(default)]
    pub data: Vec<Map<String, Value>>,
    #[serde(default)]
    pub metadata: Vec<String>,
}

impl QueryResult {
    pub fn columns(&self) -> Vec<String> {
        self.data
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn cells(&self) -> impl Iterator<Item = &Value> {
        self.data.iter().flat_map(|row| row.values())
    }
}

/// Accepts either a bare `{data, metadata}` object or one wrapped in a
/// `result` field, the way the query endpoint returns it.
pub fn parse_query_result(raw: &str) -> Result<QueryResult> {
    let parsed: Value = serde_json::from_str(raw).context("invalid JSON in query result")?;
    let object = parsed
        .as_object()
        .ok_or_else(|| anyhow!("query result must be a JSON object"))?;

    let body = match object.get("result") {
        Some(inner) if inner.is_object() => inner,
        _ => &parsed,
    };

    QueryResult::deserialize(body).context("query result does not match {data, metadata}")
}

pub fn read_query_result(path: &Path) -> Result<QueryResult> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read query result {}", path.display()))?;
    parse_query_result(&raw).with_context(|| format!("failed to parse {}", path.display()))
}
