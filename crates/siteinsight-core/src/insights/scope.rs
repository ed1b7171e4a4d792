//! Which kinds of SEO question a crawl export can answer

use crate::answer::Confidence;
use serde::{Deserialize, Serialize};

/// Rows below which a full crawl still only earns medium confidence
const MIN_ROWS_FOR_HIGH: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeoCategory {
    #[serde(rename = "Crawlability/Status Codes")]
    Crawlability,
    #[serde(rename = "Content/Meta Tags")]
    Content,
    #[serde(rename = "Performance/PageSpeed")]
    Performance,
    #[serde(rename = "Accessibility/WCAG")]
    Accessibility,
}

impl SeoCategory {
    pub const ALL: [SeoCategory; 4] = [
        Self::Crawlability,
        Self::Content,
        Self::Performance,
        Self::Accessibility,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Crawlability => "Crawlability/Status Codes",
            Self::Content => "Content/Meta Tags",
            Self::Performance => "Performance/PageSpeed",
            Self::Accessibility => "Accessibility/WCAG",
        }
    }

    /// Lower-case column name prefixes that indicate this category
    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Crawlability => &["status code", "address", "url", "status"],
            Self::Content => &["title", "meta description", "h1", "h2", "word count", "content"],
            Self::Performance => &["psi", "pagespeed", "load time", "speed", "performance"],
            Self::Accessibility => &["wcag", "accessibility", "aria", "alt text", "contrast"],
        }
    }

    fn matches(&self, column: &str) -> bool {
        let column = column.trim().to_lowercase();
        self.keywords().iter().any(|k| column.starts_with(k))
    }
}

fn labels(categories: &[SeoCategory]) -> String {
    categories
        .iter()
        .map(SeoCategory::label)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Categories present in and absent from a crawl export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnScope {
    pub available: Vec<SeoCategory>,
    pub unavailable: Vec<SeoCategory>,
    pub limited: bool,
    pub message: String,
}

impl ColumnScope {
    /// Classify crawl columns. A column counts for a category when its
    /// lower-cased name starts with one of the category's keywords, so
    /// `Title 1` and `H1-1` count as content.
    pub fn analyze(columns: &[String]) -> Self {
        let (available, unavailable): (Vec<SeoCategory>, Vec<SeoCategory>) = SeoCategory::ALL
            .into_iter()
            .partition(|category| columns.iter().any(|c| category.matches(c)));

        let limited = available.len() < SeoCategory::ALL.len();
        let message = if available.is_empty() {
            "No recognized SEO columns found. Analysis will be limited to basic data structure."
                .to_string()
        } else if limited {
            format!(
                "Only {} data available. Cannot provide insights about {}.",
                labels(&available),
                labels(&unavailable)
            )
        } else {
            "Full SEO dataset available.".to_string()
        };

        Self {
            available,
            unavailable,
            limited,
            message,
        }
    }

    /// How far answers from this export can be trusted, given `rows` results
    pub fn confidence(&self, rows: usize) -> Confidence {
        match self.available.as_slice() {
            [] => Confidence::Low,
            [_] | [_, _] => Confidence::Medium,
            _ if rows < MIN_ROWS_FOR_HIGH => Confidence::Medium,
            _ => Confidence::High,
        }
    }
}
