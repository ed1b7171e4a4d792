//! Google Sheets values API client for crawl exports

use super::{request_error, status_error, CrawlSource};
use crate::config::CrawlConfig;
use crate::error::{Result, SiteInsightError};
use crate::retry::{self, RetryPolicy};
use crate::table::{CellValue, Row, TabularResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

const SERVICE: &str = "Google Sheets API";

pub struct SheetsClient {
    client: reqwest::Client,
    config: CrawlConfig,
    retry: RetryPolicy,
}

#[derive(Debug, Default, Deserialize)]
pub struct ValueRange {
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

impl SheetsClient {
    pub fn new(config: CrawlConfig, retry: RetryPolicy) -> Result<Self> {
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

    async fn get_values_once(&self, url: &str) -> Result<ValueRange> {
        let mut req = self.client.get(url);
        if let Some(ref token) = self.config.access_token {
            req = req.bearer_auth(token);
        } else if let Some(ref key) = self.config.api_key {
            req = req.query(&[("key", key)]);
        }

        let response = req.send().await.map_err(|e| request_error(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(SERVICE, status, &body));
        }

        response.json::<ValueRange>().await.map_err(|e| {
            SiteInsightError::DataSource(format!("Invalid {} response: {}", SERVICE, e))
        })
    }
}

/// First row as headers, remaining rows as records.
///
/// Short rows are padded with empty text and blank headers get positional names.
pub fn values_to_table(values: Vec<Vec<Value>>) -> TabularResult {
    let mut iter = values.into_iter();
    let headers: Vec<String> = match iter.next() {
        Some(header_row) => header_row
            .iter()
            .enumerate()
            .map(|(i, h)| match cell_text(h) {
                s if s.trim().is_empty() => format!("column_{}", i + 1),
                s => s.trim().to_string(),
            })
            .collect(),
        None => return TabularResult::empty(),
    };

    let rows = iter
        .filter(|r| r.iter().any(|v| !cell_text(v).trim().is_empty()))
        .map(|r| {
            let mut row = Row::new();
            for (i, header) in headers.iter().enumerate() {
                let cell = match r.get(i) {
                    Some(Value::Number(n)) => n
                        .as_f64()
                        .map(CellValue::Number)
                        .unwrap_or_else(|| CellValue::Text(n.to_string())),
                    Some(v) => CellValue::parse(&cell_text(v)),
                    None => CellValue::Text(String::new()),
                };
                row.insert(header.clone(), cell);
            }
            row
        })
        .collect();

    TabularResult::new(headers, rows)
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl CrawlSource for SheetsClient {
    fn source_type(&self) -> &'static str {
        "sheets"
    }

    async fn fetch_all(&self, sheet_id: Option<&str>) -> Result<TabularResult> {
        let sheet_id = sheet_id
            .or(self.config.default_spreadsheet_id.as_deref())
            .ok_or_else(|| {
                SiteInsightError::DataSource(
                    "No spreadsheet id given and none configured (set SITEINSIGHT_SPREADSHEET_ID)"
                        .to_string(),
                )
            })?;

        if self.config.access_token.is_none() && self.config.api_key.is_none() {
            return Err(SiteInsightError::DataSource(
                "Google Sheets credentials not configured (set SITEINSIGHT_SHEETS_API_KEY or SITEINSIGHT_SHEETS_TOKEN)"
                    .to_string(),
            ));
        }

        let url = format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.config.base_url.trim_end_matches('/'),
            sheet_id,
            self.config.range
        );

        tracing::info!("Reading crawl export from sheet {}", sheet_id);

        let range = retry::with_backoff(&self.retry, "Sheets values.get", || {
            self.get_values_once(&url)
        })
        .await?;

        let table = values_to_table(range.values);
        tracing::debug!(
            "Sheet {} has {} rows across {} columns",
            sheet_id,
            table.row_count,
            table.columns.len()
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_values_to_table() {
        let range: ValueRange = serde_json::from_value(json!({
            "range": "Sheet1!A1:ZZ1000",
            "majorDimension": "ROWS",
            "values": [
                ["Address", "Status Code", "Title 1", ""],
                ["https://example.com/", "200", "Home", "x"],
                ["https://example.com/about", "404"],
                [],
                ["https://example.com/blog", 200, "Blog", ""]
            ]
        }))
        .unwrap();

        let table = values_to_table(range.values);
        assert_eq!(table.columns, vec!["Address", "Status Code", "Title 1", "column_4"]);
        assert_eq!(table.row_count, 3);
        assert_eq!(table.rows[1]["Status Code"], CellValue::Number(404.0));
        assert_eq!(table.rows[1]["Title 1"], CellValue::from(""));
        assert_eq!(table.rows[2]["Status Code"], CellValue::Number(200.0));
    }

    #[test]
    fn test_empty_sheet() {
        assert!(values_to_table(Vec::new()).is_empty());
        let only_headers = values_to_table(vec![vec![json!("Address")]]);
        assert_eq!(only_headers.columns, vec!["Address"]);
        assert_eq!(only_headers.row_count, 0);
    }

    #[tokio::test]
    async fn test_missing_sheet_id() {
        let mut config = CrawlConfig::default();
        config.default_spreadsheet_id = None;
        let client = SheetsClient::new(config, RetryPolicy::none()).unwrap();
        let err = client.fetch_all(None).await.unwrap_err();
        assert!(err.to_string().contains("spreadsheet id"));
    }
}
