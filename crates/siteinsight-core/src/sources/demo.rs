//! Deterministic in-memory sources for running without credentials
//!
//! The analytics time series follows a fixed arc: a baseline, a spike after
//! an SEO fix, a regression when 404s appear, then recovery. Per-page data
//! uses the same five pages as the crawl table so multi-source questions
//! have something to join.

use super::{AnalyticsSource, CrawlSource};
use crate::error::Result;
use crate::query::ExtractedParameters;
use crate::table::{CellValue, Row, TabularResult};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};

const DEMO_PAGES: &[&str] = &["/", "/products", "/about", "/contact", "/blog"];
const PAGE_DIMENSIONS: &[&str] = &["pagePath", "pagePathPlusQueryString", "landingPage"];

#[derive(Debug, Default)]
pub struct DemoAnalyticsSource;

impl DemoAnalyticsSource {
    pub fn new() -> Self {
        Self
    }
}

/// Stable pseudo-random fraction in `[0, 1)`
fn jitter(seed: i64) -> f64 {
    let mixed = (seed as u64).wrapping_mul(2_654_435_761).wrapping_add(0x9e37_79b9) % 1000;
    mixed as f64 / 1000.0
}

fn baseline_users(days_ago: i64) -> f64 {
    match days_ago {
        d if d >= 23 => 500.0,
        d if d >= 20 => 1200.0,
        d if d >= 10 => 300.0,
        _ => 800.0,
    }
}

fn metric_value(metric: &str, users: f64, days_ago: i64) -> CellValue {
    let j = jitter(days_ago + 17);
    let value = if metric.to_lowercase().contains("user") || metric == "sessions" {
        users
    } else if metric == "bounceRate" {
        let base = if (10..20).contains(&days_ago) { 0.68 } else { 0.42 };
        ((base + j * 0.10) * 100.0).round() / 100.0
    } else if metric == "screenPageViews" || metric == "pageViews" {
        (users * (2.1 + j * 0.6)).round()
    } else {
        users
    };
    CellValue::Number(value)
}

fn dimension_value(dimension: &str, i: usize) -> String {
    let values: &[&str] = match dimension {
        "country" => &["United States", "India", "United Kingdom", "Canada", "Germany"],
        "city" => &["New York", "London", "Mumbai", "Toronto", "Berlin"],
        "deviceCategory" => &["desktop", "mobile", "tablet"],
        "sessionSource" | "source" => &["google", "(direct)", "bing", "newsletter", "twitter.com"],
        d if PAGE_DIMENSIONS.contains(&d) => DEMO_PAGES,
        _ => return format!("value_{}", i + 1),
    };
    values[i % values.len()].to_string()
}

fn columns(params: &ExtractedParameters) -> Vec<String> {
    params
        .dimensions
        .iter()
        .chain(params.metrics.iter())
        .cloned()
        .collect()
}

fn time_series(params: &ExtractedParameters) -> Vec<Row> {
    let range = params.date_range;
    (0..range.days())
        .map(|offset| {
            let date: NaiveDate = range.start + Duration::days(offset);
            let days_ago = (range.end - date).num_days();
            let users = (baseline_users(days_ago) * (0.9 + jitter(days_ago) * 0.2)).round();

            let mut row = Row::new();
            for dim in &params.dimensions {
                let value = if dim == "date" {
                    date.format("%Y%m%d").to_string()
                } else {
                    dimension_value(dim, 0)
                };
                row.insert(dim.clone(), CellValue::Text(value));
            }
            for metric in &params.metrics {
                row.insert(metric.clone(), metric_value(metric, users, days_ago));
            }
            row
        })
        .collect()
}

fn breakdown(params: &ExtractedParameters) -> Vec<Row> {
    (0..5)
        .map(|i| {
            let mut row = Row::new();
            for dim in &params.dimensions {
                row.insert(dim.clone(), CellValue::Text(dimension_value(dim, i)));
            }
            let users = ((5 - i) * 1234) as f64;
            for metric in &params.metrics {
                row.insert(metric.clone(), metric_value(metric, users, i as i64));
            }
            row
        })
        .collect()
}

fn aggregate(params: &ExtractedParameters) -> Vec<Row> {
    let mut row = Row::new();
    for metric in &params.metrics {
        let value = match metric.as_str() {
            "bounceRate" => 0.52,
            "screenPageViews" | "pageViews" => 1560.0,
            _ => 650.0,
        };
        row.insert(metric.clone(), CellValue::Number(value));
    }
    vec![row]
}

#[async_trait]
impl AnalyticsSource for DemoAnalyticsSource {
    fn source_type(&self) -> &'static str {
        "demo"
    }

    async fn query(&self, property_id: &str, params: &ExtractedParameters) -> Result<TabularResult> {
        tracing::info!("Demo mode: serving mock analytics for property {}", property_id);
        let rows = if params.dimensions.iter().any(|d| d == "date") {
            time_series(params)
        } else if params.dimensions.is_empty() {
            aggregate(params)
        } else {
            breakdown(params)
        };
        Ok(TabularResult::new(columns(params), rows))
    }
}

#[derive(Debug, Default)]
pub struct DemoCrawlSource;

impl DemoCrawlSource {
    pub fn new() -> Self {
        Self
    }

    /// Five crawled pages on example.com; `/about` is broken
    pub fn table() -> TabularResult {
        let columns = ["URL", "Status Code", "Title", "Meta Description", "H1"];
        let data: [[&str; 5]; 5] = [
            ["https://example.com/", "200", "Homepage", "Welcome to our site", "Home"],
            ["https://example.com/products", "200", "Products", "Our products", "Products"],
            ["https://example.com/about", "404", "About Us", "", "About"],
            [
                "https://example.com/contact",
                "200",
                "Contact Us - Very Long Title That Exceeds Recommended Length",
                "Get in touch",
                "Contact",
            ],
            ["https://example.com/blog", "200", "Blog", "Read our blog", "Blog"],
        ];

        let rows = data
            .iter()
            .map(|values| {
                columns
                    .iter()
                    .zip(values.iter())
                    .map(|(c, v)| (c.to_string(), CellValue::parse(v)))
                    .collect::<Row>()
            })
            .collect();
        TabularResult::new(columns.iter().map(|c| c.to_string()).collect(), rows)
    }
}

#[async_trait]
impl CrawlSource for DemoCrawlSource {
    fn source_type(&self) -> &'static str {
        "demo"
    }

    async fn fetch_all(&self, _sheet_id: Option<&str>) -> Result<TabularResult> {
        tracing::info!("Demo mode: serving mock crawl export");
        Ok(Self::table())
    }
}
