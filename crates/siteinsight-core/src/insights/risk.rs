//! Rule-based SEO risk score per crawled URL

use crate::table::{CellValue, Row, TabularResult};
use serde::{Deserialize, Serialize};

const PSI_ERROR: &[&str] = &["PSI Error"];
const WCAG_VIOLATIONS: &[&str] = &["WCAG* Violations", "WCAG Violations", "All Violations"];
const BEST_PRACTICE_VIOLATIONS: &[&str] = &["Best Practice Violations"];
const URL_COLUMNS: &[&str] = &["Address", "URL"];

/// Cell values that mean "nothing to report"
const BLANK_VALUES: &[&str] = &["", "0", "none", "n/a"];

/// URLs listed in the summary
const TOP_URLS: usize = 3;
/// Longer URLs are shortened in the summary
const MAX_URL_CHARS: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            0 => Self::Low,
            1 | 2 => Self::Medium,
            _ => Self::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlRisk {
    pub url: String,
    pub score: u32,
    pub level: RiskLevel,
}

/// Scored URLs, highest score first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub scored: Vec<UrlRisk>,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub total: usize,
}

fn has_value(cell: Option<&CellValue>) -> bool {
    cell.map(|c| {
        let text = c.to_string().trim().to_lowercase();
        !BLANK_VALUES.contains(&text.as_str())
    })
    .unwrap_or(false)
}

/// Resolved spellings of whichever of `names` the table has
fn resolve<'a>(table: &'a TabularResult, names: &[&str]) -> Vec<&'a str> {
    names.iter().filter_map(|n| table.column(n)).collect()
}

fn score_row(row: &Row, psi: &[&str], wcag: &[&str], best_practice: &[&str]) -> u32 {
    let any = |cols: &[&str]| cols.iter().any(|c| has_value(row.get(*c)));
    let mut score = 0;
    if any(psi) {
        score += 3;
    }
    if any(wcag) {
        score += 2;
    }
    if any(best_practice) {
        score += 1;
    }
    score
}

/// Score every row of a crawl table.
///
/// `None` when the table is empty or carries none of the PageSpeed and
/// accessibility columns the rules read.
pub fn score_risks(table: &TabularResult) -> Option<RiskReport> {
    if table.is_empty() {
        return None;
    }
    let psi = resolve(table, PSI_ERROR);
    let wcag = resolve(table, WCAG_VIOLATIONS);
    let best_practice = resolve(table, BEST_PRACTICE_VIOLATIONS);
    if psi.is_empty() && wcag.is_empty() && best_practice.is_empty() {
        return None;
    }
    let url_col = resolve(table, URL_COLUMNS).first().copied();

    let mut scored: Vec<UrlRisk> = table
        .rows
        .iter()
        .map(|row| {
            let score = score_row(row, &psi, &wcag, &best_practice);
            let url = url_col
                .and_then(|c| row.get(c))
                .filter(|c| !c.is_empty())
                .map(|c| c.to_string())
                .unwrap_or_else(|| "Unknown URL".to_string());
            UrlRisk {
                url,
                score,
                level: RiskLevel::from_score(score),
            }
        })
        .collect();
    scored.sort_by(|a, b| b.score.cmp(&a.score));

    let count = |level: RiskLevel| scored.iter().filter(|r| r.level == level).count();
    let (high, medium, low) = (
        count(RiskLevel::High),
        count(RiskLevel::Medium),
        count(RiskLevel::Low),
    );
    tracing::debug!("SEO risk: {} high, {} medium, {} low", high, medium, low);

    Some(RiskReport {
        total: scored.len(),
        scored,
        high,
        medium,
        low,
    })
}

fn shorten(url: &str) -> String {
    if url.chars().count() > MAX_URL_CHARS {
        let head: String = url.chars().take(MAX_URL_CHARS - 3).collect();
        format!("{}...", head)
    } else {
        url.to_string()
    }
}

impl RiskReport {
    /// Plain-text summary with counts, the top URLs and a recommendation
    pub fn summary(&self) -> String {
        if self.high == 0 && self.medium == 0 {
            return "No critical SEO risks detected. Crawlability is healthy, but ongoing monitoring is recommended."
                .to_string();
        }

        let breakdown: Vec<String> = [
            (self.high, RiskLevel::High),
            (self.medium, RiskLevel::Medium),
            (self.low, RiskLevel::Low),
        ]
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, level)| format!("{} {}-risk URL(s)", n, level.as_str()))
        .collect();

        let mut lines = vec![format!("SEO risk: {}", breakdown.join(" | "))];
        lines.push("Top priority URLs:".to_string());
        for (i, risk) in self
            .scored
            .iter()
            .filter(|r| r.level != RiskLevel::Low)
            .take(TOP_URLS)
            .enumerate()
        {
            lines.push(format!(
                "{}. [{}] {} (score {})",
                i + 1,
                risk.level.as_str(),
                shorten(&risk.url),
                risk.score
            ));
        }

        lines.push(if self.high > 0 {
            "Recommendation: prioritize high-risk URLs to keep accessibility and performance issues from hurting user experience and search visibility.".to_string()
        } else {
            "Recommendation: address medium-risk URLs to improve overall site quality.".to_string()
        });
        lines.join("\n")
    }
}
