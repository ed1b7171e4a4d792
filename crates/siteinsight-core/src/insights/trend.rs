//! Period-over-period trends and threshold alerts for analytics reports

use crate::query::DateRange;
use crate::table::{CellValue, TabularResult};
use serde::{Deserialize, Serialize};

/// Change within this many percent either way is reported as flat
pub const FLAT_BAND_PCT: f64 = 5.0;

/// Average bounce rate above which an alert is raised
pub const BOUNCE_RATE_ALERT: f64 = 0.70;

/// Drop in users or sessions, in percent, that raises an alert
pub const TRAFFIC_DROP_ALERT_PCT: f64 = -20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Flat,
}

impl Direction {
    pub fn from_change(change_pct: f64) -> Self {
        if change_pct > FLAT_BAND_PCT {
            Self::Up
        } else if change_pct < -FLAT_BAND_PCT {
            Self::Down
        } else {
            Self::Flat
        }
    }

    pub fn indicator(&self) -> &'static str {
        match self {
            Self::Up => "↑",
            Self::Down => "↓",
            Self::Flat => "→",
        }
    }
}

/// One metric compared with the previous period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricTrend {
    pub metric: String,
    pub current: f64,
    pub previous: f64,
    pub change_pct: f64,
    pub direction: Direction,
}

impl std::fmt::Display for MetricTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} {:.1}% vs previous period",
            self.metric,
            self.direction.indicator(),
            self.change_pct.abs()
        )
    }
}

/// Trends against the window immediately before the queried one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodComparison {
    pub previous_range: DateRange,
    pub trends: Vec<MetricTrend>,
}

/// Rates and averages are averaged across rows; everything else is summed
pub fn is_ratio_metric(metric: &str) -> bool {
    metric.ends_with("Rate") || metric.starts_with("average") || metric.contains("Per")
}

/// Sum, or mean for ratio metrics, of the numeric cells of one column.
///
/// `None` when the column has no numeric cells.
pub fn metric_total(table: &TabularResult, metric: &str) -> Option<f64> {
    let values: Vec<f64> = table
        .rows
        .iter()
        .filter_map(|row| row.get(metric).and_then(CellValue::as_f64))
        .collect();
    if values.is_empty() {
        return None;
    }
    let sum: f64 = values.iter().sum();
    if is_ratio_metric(metric) {
        Some(sum / values.len() as f64)
    } else {
        Some(sum)
    }
}

fn change_pct(current: f64, previous: f64) -> f64 {
    (current - previous) / previous * 100.0
}

/// Per-metric change between two reports with the same metrics.
///
/// Metrics with no previous value, or a previous total of zero, are skipped.
pub fn trends(current: &TabularResult, previous: &TabularResult, metrics: &[String]) -> Vec<MetricTrend> {
    metrics
        .iter()
        .filter_map(|metric| {
            let cur = metric_total(current, metric)?;
            let prev = metric_total(previous, metric)?;
            if prev <= 0.0 || cur < 0.0 {
                tracing::debug!("No trend for {}: current={} previous={}", metric, cur, prev);
                return None;
            }
            let change = change_pct(cur, prev);
            Some(MetricTrend {
                metric: metric.clone(),
                current: cur,
                previous: prev,
                change_pct: change,
                direction: Direction::from_change(change),
            })
        })
        .collect()
}

/// Alerts for a high bounce rate and for a sharp drop in traffic
pub fn threshold_alerts(
    current: &TabularResult,
    previous: Option<&TabularResult>,
    metrics: &[String],
) -> Vec<String> {
    let mut alerts = Vec::new();
    if current.is_empty() {
        return alerts;
    }

    if metrics.iter().any(|m| m == "bounceRate") {
        if let Some(avg) = metric_total(current, "bounceRate") {
            if avg > BOUNCE_RATE_ALERT {
                alerts.push(
                    "Bounce rate exceeds 70% - consider improving page engagement".to_string(),
                );
            }
        }
    }

    let traffic_metric = metrics
        .iter()
        .find(|m| m.to_lowercase().contains("user") || m.as_str() == "sessions");
    if let (Some(prev_table), Some(metric)) = (previous, traffic_metric) {
        let cur = metric_total(current, metric).unwrap_or(0.0);
        if let Some(prev) = metric_total(prev_table, metric).filter(|p| *p > 0.0) {
            let drop = change_pct(cur, prev);
            if drop < TRAFFIC_DROP_ALERT_PCT {
                alerts.push(format!(
                    "{} dropped {:.1}% vs previous period",
                    metric,
                    drop.abs()
                ));
            }
        }
    }

    alerts
}
