//! Deterministic findings computed from retrieved tables
//!
//! Nothing here calls a model. Agents attach [`Insights`] to their output,
//! the orchestrator merges them, and the synthesis prompt and the answer
//! metadata both carry them.

pub mod risk;
pub mod scope;
pub mod trend;

pub use risk::{score_risks, RiskLevel, RiskReport, UrlRisk};
pub use scope::{ColumnScope, SeoCategory};
pub use trend::{threshold_alerts, trends, Direction, MetricTrend, PeriodComparison};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    /// Analytics compared with the preceding period
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<PeriodComparison>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alerts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_risk: Option<RiskReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_scope: Option<ColumnScope>,
}

impl Insights {
    pub fn is_empty(&self) -> bool {
        self.comparison.is_none()
            && self.alerts.is_empty()
            && self.seo_risk.is_none()
            && self.column_scope.is_none()
    }

    /// Combine the findings of two agents; `self` wins where both set a field
    pub fn merge(mut self, other: Insights) -> Self {
        self.comparison = self.comparison.or(other.comparison);
        self.alerts.extend(other.alerts);
        self.seo_risk = self.seo_risk.or(other.seo_risk);
        self.column_scope = self.column_scope.or(other.column_scope);
        self
    }

    /// Human-readable lines, one block per kind of finding
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(comparison) = &self.comparison {
            lines.push(format!("Trend against {}:", comparison.previous_range));
            lines.extend(comparison.trends.iter().map(|t| format!("- {}", t)));
        }
        if !self.alerts.is_empty() {
            lines.push("Alerts:".to_string());
            lines.extend(self.alerts.iter().map(|a| format!("- {}", a)));
        }
        if let Some(risk) = &self.seo_risk {
            lines.extend(risk.summary().lines().map(str::to_string));
        }
        if let Some(scope) = self.column_scope.as_ref().filter(|s| s.limited) {
            lines.push(format!("Crawl data scope: {}", scope.message));
        }
        lines
    }
}
