//! Query, intent and analytics parameter types

use crate::error::{Result, SiteInsightError};
use chrono::{Duration, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const MIN_QUERY_CHARS: usize = 3;
pub const MAX_QUERY_CHARS: usize = 1000;

lazy_static! {
    static ref PROPERTY_ID: Regex = Regex::new(r"^\d{5,15}$").unwrap();
    static ref SPREADSHEET_ID: Regex = Regex::new(r"^[A-Za-z0-9_-]{20,100}$").unwrap();
    static ref DAYS_AGO: Regex = Regex::new(r"^(\d{1,4})\s*days?\s*ago$").unwrap();
}

/// A caller's question plus optional data-source overrides
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    #[serde(default)]
    pub property_id: Option<String>,
    #[serde(default)]
    pub sheet_id: Option<String>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            property_id: None,
            sheet_id: None,
        }
    }

    pub fn with_property_id(mut self, property_id: impl Into<String>) -> Self {
        self.property_id = Some(property_id.into());
        self
    }

    pub fn with_sheet_id(mut self, sheet_id: impl Into<String>) -> Self {
        self.sheet_id = Some(sheet_id.into());
        self
    }

    /// Sanitize the text and check identifiers, returning the cleaned query
    pub fn validated(self) -> Result<Self> {
        let text = sanitize(&self.text);
        let chars = text.chars().count();
        if chars == 0 {
            return Err(SiteInsightError::InvalidInput(
                "Query cannot be empty".to_string(),
            ));
        }
        if chars < MIN_QUERY_CHARS {
            return Err(SiteInsightError::InvalidInput(format!(
                "Query must contain at least {} non-whitespace characters",
                MIN_QUERY_CHARS
            )));
        }
        if chars > MAX_QUERY_CHARS {
            return Err(SiteInsightError::InvalidInput(format!(
                "Query must not exceed {} characters",
                MAX_QUERY_CHARS
            )));
        }

        let property_id = non_blank(self.property_id);
        if let Some(ref id) = property_id {
            if !PROPERTY_ID.is_match(id) {
                return Err(SiteInsightError::InvalidInput(format!(
                    "Invalid GA4 property id `{}`: expected 5-15 digits",
                    id
                )));
            }
        }

        let sheet_id = non_blank(self.sheet_id);
        if let Some(ref id) = sheet_id {
            if !SPREADSHEET_ID.is_match(id) {
                return Err(SiteInsightError::InvalidInput(format!(
                    "Invalid spreadsheet id `{}`",
                    id
                )));
            }
        }

        Ok(Self {
            text,
            property_id,
            sheet_id,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Collapse whitespace and strip control characters
pub fn sanitize(text: &str) -> String {
    text.split_whitespace()
        .map(|word| word.chars().filter(|c| !c.is_control()).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Which agent(s) a query is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    #[serde(rename = "analytics")]
    Analytics,
    #[serde(rename = "seo")]
    Seo,
    #[serde(rename = "multi")]
    MultiAgent,
}

impl Intent {
    /// Parse a model-produced label; `None` for anything outside the three intents
    pub fn from_label(label: &str) -> Option<Self> {
        match label
            .trim()
            .trim_matches(|c| c == '"' || c == '\'' || c == '.')
            .to_lowercase()
            .replace(['-', ' '], "_")
            .as_str()
        {
            "analytics" => Some(Self::Analytics),
            "seo" => Some(Self::Seo),
            "multi" | "multi_agent" | "multiagent" | "both" => Some(Self::MultiAgent),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Analytics => "analytics",
            Self::Seo => "seo",
            Self::MultiAgent => "multi",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub intent: Intent,
    /// Original label when it was outside the allowed set
    pub coerced_from: Option<String>,
    /// Model-reported confidence in `[0, 1]`
    pub confidence: Option<f64>,
}

impl Classification {
    pub fn new(intent: Intent) -> Self {
        Self {
            intent,
            coerced_from: None,
            confidence: None,
        }
    }

    /// Map a raw label to an intent; unknown labels become `MultiAgent`
    pub fn from_label(label: &str, confidence: Option<f64>) -> Self {
        let confidence = confidence.map(|c| c.clamp(0.0, 1.0));
        match Intent::from_label(label) {
            Some(intent) => Self {
                intent,
                coerced_from: None,
                confidence,
            },
            None => {
                tracing::warn!(
                    "Unrecognised intent label {:?}, routing to both agents",
                    label
                );
                Self {
                    intent: Intent::MultiAgent,
                    coerced_from: Some(label.to_string()),
                    confidence,
                }
            }
        }
    }
}

/// Inclusive calendar date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, swapping the bounds if they arrive inverted
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start > end {
            tracing::warn!("Inverted date range {} > {}, swapping", start, end);
            Self {
                start: end,
                end: start,
            }
        } else {
            Self { start, end }
        }
    }

    /// The `days` full days before `today`, ending yesterday
    pub fn last_days(days: i64, today: NaiveDate) -> Self {
        Self::new(today - Duration::days(days), today - Duration::days(1))
    }

    /// Resolve two date expressions relative to `today`.
    ///
    /// Unparseable expressions fall back to `30daysAgo` and `today`.
    pub fn resolve(start: Option<&str>, end: Option<&str>, today: NaiveDate) -> Self {
        let start_date = start
            .and_then(|s| parse_relative_date(s, today))
            .unwrap_or(today - Duration::days(30));
        let end_date = end.and_then(|s| parse_relative_date(s, today)).unwrap_or(today);
        Self::new(start_date, end_date)
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// The window of the same length ending the day before this one starts
    pub fn preceding(&self) -> Self {
        let end = self.start - Duration::days(1);
        Self::new(end - Duration::days(self.days() - 1), end)
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Parse `today`, `yesterday`, `NdaysAgo` or `YYYY-MM-DD`
pub fn parse_relative_date(expr: &str, today: NaiveDate) -> Option<NaiveDate> {
    let expr = expr.trim();
    let lower = expr.to_lowercase();
    match lower.as_str() {
        "today" => return Some(today),
        "yesterday" => return Some(today - Duration::days(1)),
        _ => {}
    }
    if let Some(caps) = DAYS_AGO.captures(&lower) {
        let days: i64 = caps[1].parse().ok()?;
        return Some(today - Duration::days(days));
    }
    NaiveDate::parse_from_str(expr, "%Y-%m-%d").ok()
}

/// Analytics report parameters produced by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedParameters {
    pub metrics: Vec<String>,
    pub dimensions: Vec<String>,
    pub date_range: DateRange,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_sanitize_collapses_whitespace_and_controls() {
        assert_eq!(sanitize("  how\tmany \u{7}users\n "), "how many users");
    }

    #[test]
    fn test_validated_rejects_short_queries() {
        let err = Query::new(" hi ").validated().unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
        assert!(Query::new("   ").validated().is_err());
    }

    #[test]
    fn test_validated_checks_identifiers() {
        assert!(Query::new("users last week")
            .with_property_id("12ab")
            .validated()
            .is_err());
        assert!(Query::new("404 pages")
            .with_sheet_id("short")
            .validated()
            .is_err());

        let ok = Query::new("users   last week")
            .with_property_id(" 123456789 ")
            .with_sheet_id("1BxiMVs0XRA5nFMdKvBdBZjgmUUqptlbs74OgvE2upms")
            .validated()
            .unwrap();
        assert_eq!(ok.text, "users last week");
        assert_eq!(ok.property_id.as_deref(), Some("123456789"));
    }

    #[test]
    fn test_blank_identifiers_become_none() {
        let q = Query::new("users last week")
            .with_property_id("  ")
            .validated()
            .unwrap();
        assert!(q.property_id.is_none());
    }

    #[test]
    fn test_intent_labels() {
        assert_eq!(Intent::from_label("analytics"), Some(Intent::Analytics));
        assert_eq!(Intent::from_label(" SEO "), Some(Intent::Seo));
        assert_eq!(Intent::from_label("\"multi\""), Some(Intent::MultiAgent));
        assert_eq!(Intent::from_label("multi-agent"), Some(Intent::MultiAgent));
        assert_eq!(Intent::from_label("weather"), None);
    }

    #[test]
    fn test_unknown_label_coerces_to_multi() {
        let c = Classification::from_label("marketing", Some(1.7));
        assert_eq!(c.intent, Intent::MultiAgent);
        assert_eq!(c.coerced_from.as_deref(), Some("marketing"));
        assert_eq!(c.confidence, Some(1.0));

        let c = Classification::from_label("seo", None);
        assert_eq!(c.intent, Intent::Seo);
        assert!(c.coerced_from.is_none());
    }

    #[test]
    fn test_relative_dates() {
        let today = day(2024, 3, 15);
        assert_eq!(parse_relative_date("today", today), Some(today));
        assert_eq!(parse_relative_date("yesterday", today), Some(day(2024, 3, 14)));
        assert_eq!(parse_relative_date("7daysAgo", today), Some(day(2024, 3, 8)));
        assert_eq!(parse_relative_date("30 days ago", today), Some(day(2024, 2, 14)));
        assert_eq!(parse_relative_date("2024-01-01", today), Some(day(2024, 1, 1)));
        assert_eq!(parse_relative_date("last fortnight", today), None);
    }

    #[test]
    fn test_resolve_defaults_and_swaps() {
        let today = day(2024, 3, 15);
        let range = DateRange::resolve(None, None, today);
        assert_eq!(range.start, day(2024, 2, 14));
        assert_eq!(range.end, today);

        let range = DateRange::resolve(Some("today"), Some("7daysAgo"), today);
        assert_eq!(range.start, day(2024, 3, 8));
        assert_eq!(range.end, today);
    }

    #[test]
    fn test_last_days_spans_full_week() {
        let range = DateRange::last_days(7, day(2024, 3, 15));
        assert_eq!(range.start, day(2024, 3, 8));
        assert_eq!(range.end, day(2024, 3, 14));
        assert_eq!(range.days(), 7);
    }

    #[test]
    fn test_preceding_window_has_same_length() {
        let week = DateRange::last_days(7, day(2024, 3, 15));
        let previous = week.preceding();
        assert_eq!(previous.start, day(2024, 3, 1));
        assert_eq!(previous.end, day(2024, 3, 7));

        let single = DateRange::new(day(2024, 3, 1), day(2024, 3, 1)).preceding();
        assert_eq!(single.start, day(2024, 2, 29));
        assert_eq!(single.days(), 1);
    }
}
