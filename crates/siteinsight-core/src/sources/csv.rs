//! Local crawl export reader (Screaming Frog "Internal: All" CSV)

use super::CrawlSource;
use crate::error::{Result, SiteInsightError};
use crate::table::{CellValue, Row, TabularResult};
use ::csv::ReaderBuilder;
use async_trait::async_trait;
use std::path::PathBuf;

/// Crawl source backed by a CSV file on disk
pub struct CsvCrawlSource {
    path: PathBuf,
}

impl CsvCrawlSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

/// Parse CSV text with a header row into a table
pub fn parse_csv(content: &str) -> Result<TabularResult> {
    // Screaming Frog exports start with a UTF-8 BOM
    let content = content.trim_start_matches('\u{feff}');

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let h = h.trim();
            if h.is_empty() {
                format!("column_{}", i + 1)
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut rows = Vec::new();
    for (row_num, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            SiteInsightError::DataSource(format!("Failed to parse CSV row {}: {}", row_num + 1, e))
        })?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let mut row = Row::new();
        for (idx, header) in headers.iter().enumerate() {
            row.insert(header.clone(), CellValue::parse(record.get(idx).unwrap_or("")));
        }
        rows.push(row);
    }

    Ok(TabularResult::new(headers, rows))
}

#[async_trait]
impl CrawlSource for CsvCrawlSource {
    fn source_type(&self) -> &'static str {
        "csv"
    }

    async fn fetch_all(&self, sheet_id: Option<&str>) -> Result<TabularResult> {
        if let Some(id) = sheet_id {
            tracing::debug!("Ignoring spreadsheet id {} for local CSV crawl source", id);
        }

        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            SiteInsightError::DataSource(format!(
                "Failed to read crawl CSV {:?}: {}",
                self.path, e
            ))
        })?;

        let table = parse_csv(&content)?;
        tracing::info!(
            "Loaded {} crawl rows from {}",
            table.row_count,
            self.path.display()
        );
        Ok(table)
    }
}
