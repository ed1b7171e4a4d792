//! The orchestrator's output: answer text, supporting data and metadata

use crate::insights::Insights;
use crate::orchestrator::fusion::FusedRecord;
use crate::query::Intent;
use crate::table::{CellValue, TabularResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A data source an agent reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Analytics,
    Seo,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Analytics => "analytics",
            Self::Seo => "seo",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse confidence in an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Bucket a model-reported score
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Self::High
        } else if score >= 0.5 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Confidence from how many rows a single source returned
    pub fn from_row_count(rows: usize) -> Self {
        match rows {
            0 => Self::Low,
            1..=9 => Self::Medium,
            _ => Self::High,
        }
    }

    /// Confidence from how many of the two sources returned data
    pub fn from_coverage(non_empty_sources: usize) -> Self {
        match non_empty_sources {
            0 => Self::Low,
            1 => Self::Medium,
            _ => Self::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Result of fusing both sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedData {
    pub records: Vec<FusedRecord>,
    pub row_count: usize,
    /// Tables with no page column, keyed by source
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub unjoined: BTreeMap<String, TabularResult>,
}

impl FusedData {
    pub fn new(records: Vec<FusedRecord>, unjoined: BTreeMap<String, TabularResult>) -> Self {
        let row_count = records.len();
        Self {
            records,
            row_count,
            unjoined,
        }
    }

    /// Pages every source reported
    pub fn joined_count(&self) -> usize {
        self.records.iter().filter(|r| r.missing.is_empty()).count()
    }

    /// Records in reading order: pages found in every source first, then
    /// by their largest analytics value, highest first, then by page.
    pub fn ranked(&self) -> Vec<&FusedRecord> {
        let mut ranked: Vec<&FusedRecord> = self.records.iter().collect();
        ranked.sort_by(|a, b| {
            b.missing
                .is_empty()
                .cmp(&a.missing.is_empty())
                .then_with(|| {
                    peak_analytics(b)
                        .partial_cmp(&peak_analytics(a))
                        .unwrap_or(Ordering::Equal)
                })
                .then_with(|| a.page.cmp(&b.page))
        });
        ranked
    }
}

/// Largest numeric `analytics.*` field of a record
fn peak_analytics(record: &FusedRecord) -> Option<f64> {
    let prefix = format!("{}.", SourceKind::Analytics.as_str());
    record
        .fields
        .iter()
        .filter(|(name, _)| name.starts_with(&prefix))
        .filter_map(|(_, value)| match value {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(_) => None,
        })
        .fold(None, |peak: Option<f64>, n| Some(peak.map_or(n, |p| p.max(n))))
}

/// The data an answer is based on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerData {
    Fused(FusedData),
    Table(TabularResult),
}

impl AnswerData {
    pub fn row_count(&self) -> usize {
        match self {
            Self::Table(t) => t.row_count,
            Self::Fused(f) => f.row_count,
        }
    }

    /// Copy with at most `max_rows` rows per table, `row_count` kept.
    ///
    /// Fused records are cut in [`FusedData::ranked`] order.
    pub fn truncated(&self, max_rows: usize) -> Self {
        match self {
            Self::Table(t) => {
                let mut head = t.head(max_rows);
                head.row_count = t.row_count;
                Self::Table(head)
            }
            Self::Fused(f) => Self::Fused(FusedData {
                records: f.ranked().into_iter().take(max_rows).cloned().collect(),
                row_count: f.row_count,
                unjoined: f
                    .unjoined
                    .iter()
                    .map(|(k, t)| (k.clone(), t.head(max_rows)))
                    .collect(),
            }),
        }
    }
}

/// What happened while answering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerMetadata {
    /// Routing label: `analytics`, `seo` or `multi`
    pub agent: String,
    /// Sources that returned data
    pub agents: Vec<SourceKind>,
    pub intent: Intent,
    /// Wall time from classification through synthesis
    pub processing_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification_confidence: Option<f64>,
    /// Set when one branch of a multi-source query failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degraded_source: Option<SourceKind>,
    /// Model label that was outside the known intents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent_coerced_from: Option<String>,
    /// Trends, alerts and crawl findings computed from the data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insights: Option<Insights>,
}

/// Answer text plus the data and metadata behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerBundle {
    pub answer: String,
    pub data: AnswerData,
    pub metadata: AnswerMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::fuse;
    use crate::table::Row;

    /// Sixty crawled pages with no traffic, plus `/zz` which has both
    fn mostly_one_sided() -> FusedData {
        let mut traffic = Row::new();
        traffic.insert("pagePath".into(), CellValue::from("/zz"));
        traffic.insert("screenPageViews".into(), CellValue::Number(40.0));
        let analytics = TabularResult::new(
            vec!["pagePath".into(), "screenPageViews".into()],
            vec![traffic],
        );

        let rows = (0..60)
            .map(|i| format!("https://example.com/a-{:02}", i))
            .chain(std::iter::once("https://example.com/zz".to_string()))
            .map(|url| {
                let mut row = Row::new();
                row.insert("Address".into(), CellValue::from(url));
                row.insert("Status Code".into(), CellValue::Number(200.0));
                row
            })
            .collect();
        let crawl = TabularResult::new(vec!["Address".into(), "Status Code".into()], rows);

        fuse(&analytics, &crawl)
    }

    #[test]
    fn test_confidence_buckets() {
        assert_eq!(Confidence::from_row_count(0), Confidence::Low);
        assert_eq!(Confidence::from_row_count(7), Confidence::Medium);
        assert_eq!(Confidence::from_row_count(10), Confidence::High);
        assert_eq!(Confidence::from_coverage(2), Confidence::High);
        assert_eq!(Confidence::from_score(0.6), Confidence::Medium);
    }

    #[test]
    fn test_table_data_serializes_rows_and_count() {
        let mut row = Row::new();
        row.insert("activeUsers".into(), CellValue::Number(12.0));
        let data = AnswerData::Table(TabularResult::new(vec!["activeUsers".into()], vec![row]));
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["row_count"], 1);
        assert_eq!(json["rows"][0]["activeUsers"], 12.0);
        assert!(json.get("records").is_none());
    }

    #[test]
    fn test_truncated_keeps_total() {
        let rows = (0..5).map(|_| Row::new()).collect();
        let data = AnswerData::Table(TabularResult::new(vec![], rows));
        let short = data.truncated(2);
        match short {
            AnswerData::Table(t) => {
                assert_eq!(t.rows.len(), 2);
                assert_eq!(t.row_count, 5);
            }
            _ => panic!("expected table"),
        }
    }

    #[test]
    fn test_truncation_keeps_joined_pages() {
        let fused = mostly_one_sided();
        assert_eq!(fused.row_count, 61);
        assert_eq!(fused.joined_count(), 1);
        assert_eq!(fused.records.last().unwrap().page, "/zz");

        match AnswerData::Fused(fused).truncated(50) {
            AnswerData::Fused(short) => {
                assert_eq!(short.records.len(), 50);
                assert_eq!(short.row_count, 61);
                assert_eq!(short.records[0].page, "/zz");
                assert_eq!(short.records[1].page, "/a-00");
            }
            _ => panic!("expected fused data"),
        }
    }

    #[test]
    fn test_ranking_prefers_busier_pages() {
        let record = |page: &str, views: Option<f64>, missing: &[&str]| FusedRecord {
            page: page.to_string(),
            fields: views
                .map(|v| ("analytics.screenPageViews".to_string(), CellValue::Number(v)))
                .into_iter()
                .collect(),
            missing: missing.iter().map(|m| m.to_string()).collect(),
        };
        let fused = FusedData::new(
            vec![
                record("/a", None, &["analytics"]),
                record("/b", Some(5.0), &[]),
                record("/c", Some(900.0), &["seo"]),
                record("/d", Some(50.0), &[]),
            ],
            BTreeMap::new(),
        );
        let order: Vec<&str> = fused.ranked().iter().map(|r| r.page.as_str()).collect();
        assert_eq!(order, vec!["/d", "/b", "/c", "/a"]);
    }

    #[test]
    fn test_source_kind_wire_names() {
        assert_eq!(
            serde_json::to_value(SourceKind::Analytics).unwrap(),
            "analytics"
        );
        assert_eq!(serde_json::to_value(Confidence::High).unwrap(), "high");
    }
}
