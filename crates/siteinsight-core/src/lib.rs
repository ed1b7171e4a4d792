//! Siteinsight Core Library
//!
//! Answers natural-language questions about a website from two data sources:
//! GA4 analytics reports and SEO crawl exports.
//!
//! # Features
//! - Intent routing (keyword rules, then an LLM) to an analytics agent, an
//!   SEO agent, or both
//! - Concurrent fetching when a question spans both sources
//! - Outer join of analytics and crawl rows on the page they describe
//! - Deterministic trends, alerts and SEO risk scores alongside the data
//! - LLM answer synthesis over the retrieved data
//! - Demo mode with deterministic mock data

pub mod agents;
pub mod answer;
pub mod config;
pub mod error;
pub mod insights;
pub mod llm;
pub mod orchestrator;
pub mod query;
pub mod response;
pub mod retry;
pub mod sources;
pub mod table;

pub use agents::{AgentOutput, AnalyticsAgent, DataAgent, SeoAgent};
pub use answer::{AnswerBundle, AnswerData, AnswerMetadata, Confidence, FusedData, SourceKind};
pub use config::{Config, LLMServiceConfig};
pub use error::{Error, Result, SiteInsightError};
pub use insights::Insights;
pub use llm::{
    ChatMessage, CompletionOptions, HttpGateway, HttpLLMClient, LLMClient, LlmGateway,
    MetricsSnapshot,
};
pub use orchestrator::{FusedRecord, Orchestrator};
pub use query::{Classification, DateRange, ExtractedParameters, Intent, Query};
pub use response::{process, QueryRequest, QueryResponse};
pub use sources::{
    AnalyticsSource, CrawlSource, CsvCrawlSource, DemoAnalyticsSource, DemoCrawlSource,
    Ga4Client, SheetsClient,
};
pub use table::{AggregateOp, CellValue, FilterSpec, Row, TabularResult};

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "siteinsight";
