//! Crawl filter description

use super::json;
use crate::error::{Result, SiteInsightError};
use crate::table::{AggregateOp, FilterSpec, DEFAULT_ROW_LIMIT};
use serde_json::Value;
use std::collections::BTreeMap;

pub const SYSTEM_PROMPT: &str = "You turn questions about a website crawl export into \
    table filters. Use only the column names you are given. Output ONLY valid JSON with \
    the fields filters (object of column to exact value), group_by (column or null), \
    aggregate_column (column or null), operation (count, sum, avg, min or max) and limit.";

pub fn build_prompt(text: &str, columns: &[String]) -> String {
    format!(
        r#"Describe how to filter a Screaming Frog crawl export to answer this question:

Question: "{}"

Columns: {}

Rules:
- filters only test equality (case-insensitive)
- set group_by to summarise rows per value of a column, otherwise leave it null
- limit caps the number of returned rows (default {})

Examples:
Input: "Which pages return 404?"
Output: {{"filters": {{"Status Code": "404"}}, "group_by": null, "aggregate_column": null, "operation": "count", "limit": 100}}

Input: "How many pages per status code?"
Output: {{"filters": {{}}, "group_by": "Status Code", "aggregate_column": null, "operation": "count", "limit": 100}}

Input: "Show non-indexable pages"
Output: {{"filters": {{"Indexability": "Non-Indexable"}}, "group_by": null, "aggregate_column": null, "operation": "count", "limit": 50}}

Now describe the filter for the question above. Output only JSON:"#,
        text,
        columns.join(", "),
        DEFAULT_ROW_LIMIT
    )
}

pub fn parse_response(response: &str) -> Result<FilterSpec> {
    let value = json::parse_object(response).map_err(SiteInsightError::Llm)?;

    let filters = match value.get("filters") {
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(column, v)| json::scalar_to_string(v).map(|s| (column.clone(), s)))
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| {
                let column = json::field(item, &["column", "field"])?.as_str()?;
                let value = json::scalar_to_string(item.get("value")?)?;
                Some((column.to_string(), value))
            })
            .collect(),
        _ => BTreeMap::new(),
    };

    let column = |keys: &[&str]| {
        json::field(&value, keys)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let operation = value
        .get("operation")
        .and_then(|v| v.as_str())
        .and_then(AggregateOp::from_label)
        .unwrap_or_default();

    let limit = value
        .get("limit")
        .and_then(|v| v.as_u64().or_else(|| v.as_str()?.trim().parse().ok()))
        .filter(|n| *n > 0)
        .map(|n| n as usize)
        .unwrap_or(DEFAULT_ROW_LIMIT);

    Ok(FilterSpec {
        filters,
        group_by: column(&["group_by", "groupBy"]),
        aggregate_column: column(&["aggregate_column", "aggregateColumn"]),
        operation,
        limit,
    })
}
