//! Error types for siteinsight

use thiserror::Error;

/// Result type alias using SiteInsightError
pub type Result<T> = std::result::Result<T, SiteInsightError>;

/// Error type alias for convenience
pub type Error = SiteInsightError;

/// Exit codes for CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const UPSTREAM_ERROR: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
}

/// Main error type for siteinsight
#[derive(Debug, Error)]
pub enum SiteInsightError {
    #[error("Intent classification failed: {0}")]
    Classification(String),

    #[error("Parameter extraction failed: {0}")]
    ParameterExtraction(String),

    #[error("Data source error: {0}")]
    DataSource(String),

    #[error("All data sources failed (analytics: {analytics}; seo: {seo})")]
    Upstream { analytics: String, seo: String },

    #[error("Answer synthesis failed: {0}")]
    Synthesis(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl SiteInsightError {
    /// Stable machine-readable name used in structured error responses
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Classification(_) => "classification_error",
            Self::ParameterExtraction(_) => "parameter_extraction_error",
            Self::DataSource(_) | Self::Http(_) | Self::Csv(_) => "data_source_error",
            Self::Upstream { .. } => "upstream_error",
            Self::Synthesis(_) => "synthesis_error",
            Self::InvalidInput(_) => "invalid_input",
            Self::Config(_) | Self::Yaml(_) => "configuration_error",
            Self::Llm(_) | Self::Io(_) | Self::Serialization(_) | Self::Other(_) => {
                "internal_error"
            }
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidInput(_) | Self::Config(_) => exit_codes::INVALID_INPUT,
            Self::DataSource(_) | Self::Upstream { .. } | Self::Http(_) => {
                exit_codes::UPSTREAM_ERROR
            }
            _ => exit_codes::GENERAL_ERROR,
        }
    }

    /// Whether an outbound call that failed with this error may be retried
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status()
                        .map(|s| s.as_u16() == 429 || s.is_server_error())
                        .unwrap_or(false)
            }
            Self::DataSource(msg) | Self::Llm(msg) => is_transient_message(msg),
            _ => false,
        }
    }
}

/// Heuristic for errors that only carry a rendered message
fn is_transient_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    [
        "429",
        "rate limit",
        "quota",
        "timeout",
        "timed out",
        "connection",
        "temporarily unavailable",
        "service unavailable",
        "502",
        "503",
        "504",
    ]
    .iter()
    .any(|needle| lower.contains(needle))
}
