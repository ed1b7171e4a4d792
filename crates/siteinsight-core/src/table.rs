//! Tabular results and local filtering
//!
//! Both data sources hand back a [`TabularResult`]. The SEO agent narrows a
//! crawl table with a [`FilterSpec`] via [`apply_filter`], which always
//! produces a new table.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Rows returned when a filter does not set a limit
pub const DEFAULT_ROW_LIMIT: usize = 100;

/// A single cell: text or number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Numeric cells for anything that parses as a number, text otherwise
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() && !trimmed.is_empty() => CellValue::Number(n),
            _ => CellValue::Text(raw.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Text(s) if s.trim().is_empty())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

/// One row: column name to value
pub type Row = BTreeMap<String, CellValue>;

/// Rows plus the column order they were produced in
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TabularResult {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub row_count: usize,
}

impl TabularResult {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let row_count = rows.len();
        Self {
            columns,
            rows,
            row_count,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Resolve a column name case-insensitively to its exact spelling
    pub fn column(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        self.columns
            .iter()
            .find(|c| c.as_str() == name)
            .or_else(|| self.columns.iter().find(|c| c.eq_ignore_ascii_case(name)))
            .map(String::as_str)
    }

    /// Sum of the numeric values in a column
    pub fn sum(&self, column: &str) -> f64 {
        self.rows
            .iter()
            .filter_map(|row| row.get(column).and_then(CellValue::as_f64))
            .sum()
    }

    /// First `n` rows as a new table
    pub fn head(&self, n: usize) -> Self {
        Self::new(
            self.columns.clone(),
            self.rows.iter().take(n).cloned().collect(),
        )
    }
}

/// Aggregation applied to grouped rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateOp {
    #[default]
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateOp {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "count" => Some(Self::Count),
            "sum" | "total" => Some(Self::Sum),
            "avg" | "average" | "mean" => Some(Self::Avg),
            "min" | "minimum" => Some(Self::Min),
            "max" | "maximum" => Some(Self::Max),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    fn apply(&self, values: &[f64]) -> Option<f64> {
        match self {
            Self::Count => Some(values.len() as f64),
            Self::Sum => Some(values.iter().sum()),
            Self::Avg if values.is_empty() => None,
            Self::Avg => Some(values.iter().sum::<f64>() / values.len() as f64),
            Self::Min => values.iter().copied().reduce(f64::min),
            Self::Max => values.iter().copied().reduce(f64::max),
        }
    }
}

/// Filter and aggregation instructions for a crawl table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Column name to required value
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
    #[serde(default)]
    pub group_by: Option<String>,
    #[serde(default)]
    pub aggregate_column: Option<String>,
    #[serde(default)]
    pub operation: AggregateOp,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_ROW_LIMIT
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            filters: BTreeMap::new(),
            group_by: None,
            aggregate_column: None,
            operation: AggregateOp::Count,
            limit: DEFAULT_ROW_LIMIT,
        }
    }
}

/// Apply a filter spec to a table, returning a new table
pub fn apply_filter(table: &TabularResult, spec: &FilterSpec) -> TabularResult {
    let mut filters: Vec<(&str, &str)> = Vec::new();
    for (column, value) in &spec.filters {
        match table.column(column) {
            Some(resolved) => filters.push((resolved, value.trim())),
            None => tracing::warn!("Filter column '{}' not in crawl data, ignoring", column),
        }
    }

    let matching: Vec<&Row> = table
        .rows
        .iter()
        .filter(|row| {
            filters.iter().all(|(column, expected)| {
                row.get(*column)
                    .map(|cell| cell.to_string().trim().eq_ignore_ascii_case(expected))
                    .unwrap_or(false)
            })
        })
        .collect();

    tracing::debug!(
        "Filtered crawl data: {} of {} rows match {} filter(s)",
        matching.len(),
        table.row_count,
        filters.len()
    );

    if let Some(group_by) = spec.group_by.as_deref() {
        match table.column(group_by) {
            Some(group_col) => return group(table, &matching, group_col, spec),
            None => tracing::warn!("Group-by column '{}' not in crawl data, ignoring", group_by),
        }
    }

    // A zero limit means "unset"
    let limit = match spec.limit {
        0 => DEFAULT_ROW_LIMIT,
        n => n,
    };

    TabularResult::new(
        table.columns.clone(),
        matching.into_iter().take(limit).cloned().collect(),
    )
}

fn group(table: &TabularResult, rows: &[&Row], group_col: &str, spec: &FilterSpec) -> TabularResult {
    let mut operation = spec.operation;
    let value_col = match (operation, spec.aggregate_column.as_deref()) {
        (AggregateOp::Count, _) => None,
        (_, Some(col)) => match table.column(col) {
            Some(resolved) => Some(resolved.to_string()),
            None => {
                tracing::warn!("Aggregate column '{}' not in crawl data, counting instead", col);
                operation = AggregateOp::Count;
                None
            }
        },
        (_, None) => {
            tracing::warn!("No aggregate column for '{}', counting instead", operation.as_str());
            operation = AggregateOp::Count;
            None
        }
    };

    // Groups in order of first appearance
    let mut order: Vec<String> = Vec::new();
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for row in rows {
        let key = row
            .get(group_col)
            .map(|c| c.to_string())
            .unwrap_or_default();
        let values = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Vec::new()
        });
        match &value_col {
            Some(col) => {
                if let Some(v) = row.get(col).and_then(CellValue::as_f64) {
                    values.push(v);
                }
            }
            None => values.push(1.0),
        }
    }

    let out_col = match &value_col {
        Some(col) => format!("{}_{}", operation.as_str(), col),
        None => "count".to_string(),
    };

    let out_rows = order
        .into_iter()
        .map(|key| {
            let mut row = Row::new();
            let value = groups
                .get(&key)
                .and_then(|values| operation.apply(values))
                .map(CellValue::Number)
                .unwrap_or_else(|| CellValue::Text(String::new()));
            row.insert(group_col.to_string(), CellValue::parse(&key));
            row.insert(out_col.clone(), value);
            row
        })
        .collect();

    TabularResult::new(vec![group_col.to_string(), out_col], out_rows)
}
