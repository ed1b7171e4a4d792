//! GA4 report parameter extraction

use super::json;
use crate::error::{Result, SiteInsightError};
use crate::query::{DateRange, ExtractedParameters};
use chrono::NaiveDate;
use serde_json::Value;

pub const SYSTEM_PROMPT: &str = "You translate questions into Google Analytics 4 Data API \
    report parameters. Use only metric and dimension names from the lists you are given. \
    Output ONLY valid JSON with the fields metrics (array), dimensions (array) and \
    date_range (object with start_date and end_date).";

pub fn build_prompt(
    text: &str,
    allowed_metrics: &[&str],
    allowed_dimensions: &[&str],
    today: NaiveDate,
) -> String {
    format!(
        r#"Extract GA4 report parameters for this question:

Question: "{}"
Today's date: {}

Allowed metrics: {}
Allowed dimensions: {}

Dates may be "today", "yesterday", "NdaysAgo" or YYYY-MM-DD.
"last week" means start_date "7daysAgo" and end_date "yesterday".
Use no dimensions for a single total. Use "date" for trends over time and "pagePath" for per-page questions.

Examples:
Input: "How many users visited last week?"
Output: {{"metrics": ["activeUsers"], "dimensions": [], "date_range": {{"start_date": "7daysAgo", "end_date": "yesterday"}}}}

Input: "Sessions by country this month"
Output: {{"metrics": ["sessions"], "dimensions": ["country"], "date_range": {{"start_date": "30daysAgo", "end_date": "today"}}}}

Input: "Top pages by views"
Output: {{"metrics": ["screenPageViews"], "dimensions": ["pagePath"], "date_range": {{"start_date": "30daysAgo", "end_date": "today"}}}}

Now extract parameters for the question above. Output only JSON:"#,
        text,
        today,
        allowed_metrics.join(", "),
        allowed_dimensions.join(", ")
    )
}

/// Parse the model's parameter JSON, resolving dates relative to `today`.
///
/// Names are returned as given; allow-list validation is the caller's job.
pub fn parse_response(response: &str, today: NaiveDate) -> Result<ExtractedParameters> {
    let value = json::parse_object(response).map_err(SiteInsightError::ParameterExtraction)?;

    let metrics = names(json::field(&value, &["metrics", "metric"]));
    let dimensions = names(json::field(&value, &["dimensions", "dimension"]));

    let range = json::field(&value, &["date_range", "dateRange", "dateRanges"]).map(|r| match r {
        Value::Array(items) => items.first().cloned().unwrap_or(Value::Null),
        other => other.clone(),
    });
    let holder = range.as_ref().unwrap_or(&value);
    let start = json::field(holder, &["start_date", "startDate", "start"])
        .and_then(json::scalar_to_string);
    let end =
        json::field(holder, &["end_date", "endDate", "end"]).and_then(json::scalar_to_string);

    Ok(ExtractedParameters {
        metrics,
        dimensions,
        date_range: DateRange::resolve(start.as_deref(), end.as_deref(), today),
    })
}

/// Names from a list of strings, `{"name": ..}` objects, or a single string
fn names(value: Option<&Value>) -> Vec<String> {
    let items: Vec<&Value> = match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(v @ Value::String(_)) => vec![v],
        _ => return Vec::new(),
    };
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Object(_) => item.get("name").and_then(|n| n.as_str()).map(str::to_string),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect()
}
