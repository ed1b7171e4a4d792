//! GA4 Data API client

use super::{request_error, status_error, AnalyticsSource};
use crate::config::AnalyticsConfig;
use crate::error::{Result, SiteInsightError};
use crate::query::ExtractedParameters;
use crate::retry::{self, RetryPolicy};
use crate::table::{CellValue, Row, TabularResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

const SERVICE: &str = "GA4 Data API";

/// Client for `properties/{id}:runReport`
pub struct Ga4Client {
    client: reqwest::Client,
    config: AnalyticsConfig,
    retry: RetryPolicy,
}

impl Ga4Client {
    pub fn new(config: AnalyticsConfig, retry: RetryPolicy) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("siteinsight/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            config,
            retry,
        })
    }

    async fn run_report_once(&self, url: &str, token: &str, body: &serde_json::Value) -> Result<RunReportResponse> {
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| request_error(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(SERVICE, status, &body));
        }

        response.json::<RunReportResponse>().await.map_err(|e| {
            SiteInsightError::DataSource(format!("Invalid {} response: {}", SERVICE, e))
        })
    }
}

/// `runReport` request body
pub fn build_request(params: &ExtractedParameters, limit: u32) -> serde_json::Value {
    let mut body = json!({
        "dateRanges": [{
            "startDate": params.date_range.start.format("%Y-%m-%d").to_string(),
            "endDate": params.date_range.end.format("%Y-%m-%d").to_string(),
        }],
        "metrics": params.metrics.iter().map(|m| json!({"name": m})).collect::<Vec<_>>(),
        "dimensions": params.dimensions.iter().map(|d| json!({"name": d})).collect::<Vec<_>>(),
        "limit": limit,
    });

    // Time series come back in date order
    if params.dimensions.iter().any(|d| d == "date") {
        body["orderBys"] = json!([{"dimension": {"dimensionName": "date"}}]);
    } else if let Some(first) = params.metrics.first() {
        body["orderBys"] = json!([{"metric": {"metricName": first}, "desc": true}]);
    }
    body
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReportResponse {
    #[serde(default)]
    pub dimension_headers: Vec<Header>,
    #[serde(default)]
    pub metric_headers: Vec<Header>,
    #[serde(default)]
    pub rows: Vec<ReportRow>,
    #[serde(default)]
    pub row_count: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    #[serde(default)]
    pub dimension_values: Vec<ReportValue>,
    #[serde(default)]
    pub metric_values: Vec<ReportValue>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReportValue {
    #[serde(default)]
    pub value: String,
}

/// Flatten a report into a table: dimensions as text, metrics as numbers
pub fn to_table(response: RunReportResponse) -> TabularResult {
    let dims: Vec<String> = response
        .dimension_headers
        .into_iter()
        .map(|h| h.name)
        .collect();
    let metrics: Vec<String> = response.metric_headers.into_iter().map(|h| h.name).collect();

    let rows = response
        .rows
        .into_iter()
        .map(|r| {
            let mut row = Row::new();
            for (name, v) in dims.iter().zip(r.dimension_values) {
                row.insert(name.clone(), CellValue::Text(v.value));
            }
            for (name, v) in metrics.iter().zip(r.metric_values) {
                row.insert(name.clone(), CellValue::parse(&v.value));
            }
            row
        })
        .collect();

    TabularResult::new(dims.into_iter().chain(metrics).collect(), rows)
}

#[async_trait]
impl AnalyticsSource for Ga4Client {
    fn source_type(&self) -> &'static str {
        "ga4"
    }

    async fn query(&self, property_id: &str, params: &ExtractedParameters) -> Result<TabularResult> {
        let token = self.config.access_token.as_deref().ok_or_else(|| {
            SiteInsightError::DataSource(
                "GA4 access token not configured (set SITEINSIGHT_GA4_TOKEN)".to_string(),
            )
        })?;

        let url = format!(
            "{}/v1beta/properties/{}:runReport",
            self.config.base_url.trim_end_matches('/'),
            property_id
        );
        let body = build_request(params, self.config.row_limit);

        tracing::info!(
            "GA4 runReport property={} metrics={:?} dimensions={:?} range={}",
            property_id,
            params.metrics,
            params.dimensions,
            params.date_range
        );

        let response = retry::with_backoff(&self.retry, "GA4 runReport", || {
            self.run_report_once(&url, token, &body)
        })
        .await?;

        let table = to_table(response);
        tracing::debug!("GA4 returned {} rows", table.row_count);
        Ok(table)
    }
}
