//! Data source abstraction
//!
//! Agents read from two kinds of source:
//! - Analytics (GA4 Data API `runReport`)
//! - Crawl exports (Google Sheets values API, local Screaming Frog CSV)
//!
//! Demo mode swaps both for deterministic in-memory data.

use crate::config::Config;
use crate::error::{Result, SiteInsightError};
use crate::query::ExtractedParameters;
use crate::table::TabularResult;
use reqwest::StatusCode;
use std::sync::Arc;

pub mod csv;
pub mod demo;
pub mod ga4;
pub mod sheets;

pub use self::csv::CsvCrawlSource;
pub use demo::{DemoAnalyticsSource, DemoCrawlSource};
pub use ga4::Ga4Client;
pub use sheets::SheetsClient;

/// Source of traffic and behaviour reports
#[async_trait::async_trait]
pub trait AnalyticsSource: Send + Sync {
    /// Source identifier (e.g., "ga4", "demo")
    fn source_type(&self) -> &'static str;

    /// Run one report for a property
    async fn query(&self, property_id: &str, params: &ExtractedParameters) -> Result<TabularResult>;
}

/// Source of crawl export tables
#[async_trait::async_trait]
pub trait CrawlSource: Send + Sync {
    /// Source identifier (e.g., "sheets", "csv", "demo")
    fn source_type(&self) -> &'static str;

    /// Every row of the crawl export; `sheet_id` overrides the configured one
    async fn fetch_all(&self, sheet_id: Option<&str>) -> Result<TabularResult>;
}

/// Build the analytics source the configuration asks for
pub fn analytics_from_config(config: &Config) -> Result<Arc<dyn AnalyticsSource>> {
    if config.demo_mode {
        return Ok(Arc::new(DemoAnalyticsSource::new()));
    }
    Ok(Arc::new(Ga4Client::new(
        config.analytics.clone(),
        (&config.retry).into(),
    )?))
}

/// Build the crawl source the configuration asks for
pub fn crawl_from_config(config: &Config) -> Result<Arc<dyn CrawlSource>> {
    if config.demo_mode {
        return Ok(Arc::new(DemoCrawlSource::new()));
    }
    if let Some(ref path) = config.crawl.csv_path {
        return Ok(Arc::new(CsvCrawlSource::new(path.clone())));
    }
    Ok(Arc::new(SheetsClient::new(
        config.crawl.clone(),
        (&config.retry).into(),
    )?))
}

/// Map a failed request to a data source error that keeps the retry signal
pub(crate) fn request_error(service: &str, e: reqwest::Error) -> SiteInsightError {
    if e.is_timeout() {
        SiteInsightError::DataSource(format!(
            "Request timeout calling {}: server took too long to respond",
            service
        ))
    } else if e.is_connect() {
        SiteInsightError::DataSource(format!(
            "Connection error calling {}: cannot reach server",
            service
        ))
    } else {
        SiteInsightError::DataSource(format!("Failed to call {}: {}", service, e))
    }
}

/// Map a non-success status and body to a data source error
pub(crate) fn status_error(service: &str, status: StatusCode, body: &str) -> SiteInsightError {
    let detail = api_error_message(body).unwrap_or_else(|| body.chars().take(200).collect());
    let msg = match status {
        StatusCode::NOT_FOUND => format!("{} resource not found (404): {}", service, detail),
        StatusCode::FORBIDDEN => format!(
            "Access forbidden (403) by {}: {}. Check the credentials have access.",
            service, detail
        ),
        StatusCode::UNAUTHORIZED => format!(
            "Unauthorized (401) by {}: {}. A valid token is required.",
            service, detail
        ),
        StatusCode::TOO_MANY_REQUESTS => {
            format!("Rate limit exceeded (429) by {}: {}", service, detail)
        }
        s if s.is_server_error() => {
            format!("{} server error ({}): {}", service, s.as_u16(), detail)
        }
        _ => format!("{} HTTP error {}: {}", service, status.as_u16(), detail),
    };
    SiteInsightError::DataSource(msg)
}

/// `error.message` from a Google API error body
fn api_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value["error"]["message"].as_str().map(str::to_string)
}
