//! Analytics agent: question to GA4 report

use super::{AgentOutput, DataAgent};
use crate::answer::SourceKind;
use crate::config::schema;
use crate::error::{Result, SiteInsightError};
use crate::insights::{self, Insights, PeriodComparison};
use crate::llm::LlmGateway;
use crate::query::{DateRange, ExtractedParameters, Query};
use crate::sources::AnalyticsSource;
use crate::table::TabularResult;
use async_trait::async_trait;
use std::sync::Arc;

pub struct AnalyticsAgent {
    gateway: Arc<dyn LlmGateway>,
    source: Arc<dyn AnalyticsSource>,
    default_property_id: Option<String>,
}

impl AnalyticsAgent {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        source: Arc<dyn AnalyticsSource>,
        default_property_id: Option<String>,
    ) -> Self {
        Self {
            gateway,
            source,
            default_property_id,
        }
    }

    /// Keep only allow-listed names, warning about the rest
    fn validate(params: ExtractedParameters) -> Result<ExtractedParameters> {
        let (metrics, bad_metrics) = schema::partition_valid(&params.metrics, schema::is_valid_metric);
        let (dimensions, bad_dimensions) =
            schema::partition_valid(&params.dimensions, schema::is_valid_dimension);

        if !bad_metrics.is_empty() {
            tracing::warn!("Dropping unknown GA4 metrics: {:?}", bad_metrics);
        }
        if !bad_dimensions.is_empty() {
            tracing::warn!("Dropping unknown GA4 dimensions: {:?}", bad_dimensions);
        }

        if metrics.is_empty() {
            return Err(SiteInsightError::ParameterExtraction(format!(
                "no valid GA4 metrics in {:?}",
                params.metrics
            )));
        }

        Ok(ExtractedParameters {
            metrics,
            dimensions,
            date_range: params.date_range,
        })
    }

    fn property_id<'a>(&'a self, query: &'a Query) -> Result<&'a str> {
        query
            .property_id
            .as_deref()
            .or(self.default_property_id.as_deref())
            .ok_or_else(|| {
                SiteInsightError::ParameterExtraction(
                    "no GA4 property id given and none configured (set SITEINSIGHT_GA4_PROPERTY_ID)"
                        .to_string(),
                )
            })
    }

    /// Daily active users over the last 30 days
    fn fallback_params(end: chrono::NaiveDate) -> ExtractedParameters {
        ExtractedParameters {
            metrics: vec!["activeUsers".to_string()],
            dimensions: vec!["date".to_string()],
            date_range: DateRange::resolve(Some("30daysAgo"), Some("today"), end),
        }
    }

    /// Retry an empty report as daily active users over 30 days
    async fn fallback(
        &self,
        property_id: &str,
        params: &ExtractedParameters,
        empty: TabularResult,
    ) -> TabularResult {
        let fallback = Self::fallback_params(chrono::Local::now().date_naive());
        if fallback == *params {
            return empty;
        }

        tracing::info!("Report returned no rows; trying daily active users for the last 30 days");
        match self.source.query(property_id, &fallback).await {
            Ok(t) if !t.is_empty() => t,
            Ok(_) => empty,
            Err(e) => {
                tracing::warn!("Fallback report failed: {}", e);
                empty
            }
        }
    }

    /// Trends against the preceding window of the same length, and alerts.
    ///
    /// A failed or empty previous-period report only drops the trends.
    async fn compare(
        &self,
        property_id: &str,
        params: &ExtractedParameters,
        current: &TabularResult,
    ) -> Insights {
        let previous_params = ExtractedParameters {
            date_range: params.date_range.preceding(),
            ..params.clone()
        };

        let previous = match self.source.query(property_id, &previous_params).await {
            Ok(t) if !t.is_empty() => Some(t),
            Ok(_) => {
                tracing::debug!("Previous period {} has no rows", previous_params.date_range);
                None
            }
            Err(e) => {
                tracing::warn!("Previous period report failed, skipping trends: {}", e);
                None
            }
        };

        let comparison = previous
            .as_ref()
            .map(|prev| insights::trends(current, prev, &params.metrics))
            .filter(|trends| !trends.is_empty())
            .map(|trends| PeriodComparison {
                previous_range: previous_params.date_range,
                trends,
            });
        let alerts = insights::threshold_alerts(current, previous.as_ref(), &params.metrics);

        Insights {
            comparison,
            alerts,
            ..Insights::default()
        }
    }
}

#[async_trait]
impl DataAgent for AnalyticsAgent {
    fn source(&self) -> SourceKind {
        SourceKind::Analytics
    }

    async fn fetch(&self, query: &Query) -> Result<AgentOutput> {
        let raw = self
            .gateway
            .extract_parameters(
                &query.text,
                &schema::allowed_metrics(),
                &schema::allowed_dimensions(),
            )
            .await
            .map_err(|e| match e {
                SiteInsightError::ParameterExtraction(_) => e,
                other => SiteInsightError::ParameterExtraction(other.to_string()),
            })?;

        let params = Self::validate(raw)?;
        let property_id = self.property_id(query)?;

        let table = self.source.query(property_id, &params).await?;
        if table.is_empty() {
            return Ok(self.fallback(property_id, &params, table).await.into());
        }

        let insights = self.compare(property_id, &params, &table).await;
        Ok(AgentOutput {
            table,
            insights,
            confidence: None,
        })
    }
}
