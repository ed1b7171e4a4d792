//! Configuration management

pub mod schema;

use crate::error::{Result, SiteInsightError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
///
/// Built once at startup and handed to each component's constructor.
/// Nothing reads configuration from ambient state after that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// LLM service configuration
    #[serde(default)]
    pub llm_service: LLMServiceConfig,

    /// GA4 Data API configuration
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Crawl export (Google Sheets / CSV) configuration
    #[serde(default)]
    pub crawl: CrawlConfig,

    /// Retry policy for outbound calls
    #[serde(default)]
    pub retry: RetryConfig,

    /// Intent classification options
    #[serde(default)]
    pub intent: IntentConfig,

    /// Serve deterministic mock data instead of calling GA4 and Sheets
    #[serde(default = "default_demo_mode")]
    pub demo_mode: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_service: LLMServiceConfig::default(),
            analytics: AnalyticsConfig::default(),
            crawl: CrawlConfig::default(),
            retry: RetryConfig::default(),
            intent: IntentConfig::default(),
            demo_mode: default_demo_mode(),
        }
    }
}

/// LLM service configuration for an OpenAI-compatible endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMServiceConfig {
    /// Base URL of the LLM service for chat/completions
    pub url: String,

    /// Model name for chat completions
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// API key (optional, for authenticated services)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Upper bound on completion length
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for LLMServiceConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("SITEINSIGHT_LLM_URL")
                .unwrap_or_else(|_| "http://localhost:4000".to_string()),
            model: default_chat_model(),
            api_key: std::env::var("SITEINSIGHT_LLM_API_KEY").ok(),
            timeout_secs: default_timeout(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// GA4 Data API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Base URL of the Analytics Data API
    #[serde(default = "default_ga4_url")]
    pub base_url: String,

    /// OAuth bearer token with `analytics.readonly` scope
    #[serde(default)]
    pub access_token: Option<String>,

    /// Property queried when the caller does not name one
    #[serde(default)]
    pub default_property_id: Option<String>,

    /// Maximum rows requested per report
    #[serde(default = "default_row_limit")]
    pub row_limit: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            base_url: default_ga4_url(),
            access_token: std::env::var("SITEINSIGHT_GA4_TOKEN").ok(),
            default_property_id: std::env::var("SITEINSIGHT_GA4_PROPERTY_ID").ok(),
            row_limit: default_row_limit(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Crawl export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Base URL of the Google Sheets API
    #[serde(default = "default_sheets_url")]
    pub base_url: String,

    /// API key for public sheets
    #[serde(default)]
    pub api_key: Option<String>,

    /// OAuth bearer token for private sheets
    #[serde(default)]
    pub access_token: Option<String>,

    /// Spreadsheet read when the caller does not name one
    #[serde(default)]
    pub default_spreadsheet_id: Option<String>,

    /// A1 range to read (first tab by default)
    #[serde(default = "default_sheet_range")]
    pub range: String,

    /// Read a local crawl CSV export instead of Google Sheets
    #[serde(default)]
    pub csv_path: Option<PathBuf>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: default_sheets_url(),
            api_key: std::env::var("SITEINSIGHT_SHEETS_API_KEY").ok(),
            access_token: std::env::var("SITEINSIGHT_SHEETS_TOKEN").ok(),
            default_spreadsheet_id: std::env::var("SITEINSIGHT_SPREADSHEET_ID").ok(),
            range: default_sheet_range(),
            csv_path: std::env::var("SITEINSIGHT_CRAWL_CSV").ok().map(PathBuf::from),
            timeout_secs: default_timeout(),
        }
    }
}

/// Exponential backoff settings shared by all outbound clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_min_wait_ms")]
    pub min_wait_ms: u64,

    #[serde(default = "default_max_wait_ms")]
    pub max_wait_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            min_wait_ms: default_min_wait_ms(),
            max_wait_ms: default_max_wait_ms(),
        }
    }
}

/// Intent classification options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentConfig {
    /// Try keyword rules before asking the model
    #[serde(default = "default_rule_based")]
    pub rule_based: bool,
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            rule_based: default_rule_based(),
        }
    }
}

fn default_chat_model() -> String {
    std::env::var("SITEINSIGHT_LLM_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string())
}

fn default_timeout() -> u64 {
    30
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_ga4_url() -> String {
    "https://analyticsdata.googleapis.com".to_string()
}

fn default_sheets_url() -> String {
    "https://sheets.googleapis.com".to_string()
}

fn default_sheet_range() -> String {
    "A1:ZZ".to_string()
}

fn default_row_limit() -> u32 {
    100
}

fn default_max_attempts() -> u32 {
    3
}

fn default_min_wait_ms() -> u64 {
    1000
}

fn default_max_wait_ms() -> u64 {
    10_000
}

fn default_rule_based() -> bool {
    true
}

fn default_demo_mode() -> bool {
    std::env::var("SITEINSIGHT_DEMO_MODE")
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

impl Config {
    /// Load config from `$SITEINSIGHT_CONFIG` or the default path
    pub fn load() -> Result<Self> {
        let path = std::env::var("SITEINSIGHT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_path());
        Self::load_from(&path)
    }

    /// Load config from an explicit path, falling back to defaults if absent
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_yaml::from_str(&content)?
        } else {
            Config::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Save config to the given path
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }

    /// Reject settings no client could work with
    pub fn validate(&self) -> Result<()> {
        if self.llm_service.url.trim().is_empty() {
            return Err(SiteInsightError::Config(
                "llm_service.url must not be empty".to_string(),
            ));
        }
        if self.llm_service.model.trim().is_empty() {
            return Err(SiteInsightError::Config(
                "llm_service.model must not be empty".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(SiteInsightError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.retry.min_wait_ms > self.retry.max_wait_ms {
            return Err(SiteInsightError::Config(format!(
                "retry.min_wait_ms ({}) exceeds retry.max_wait_ms ({})",
                self.retry.min_wait_ms, self.retry.max_wait_ms
            )));
        }
        Ok(())
    }
}
