//! Intent classification: keyword rules and the model prompt

use super::json;
use crate::error::{Result, SiteInsightError};
use crate::query::{Classification, Intent};

const ANALYTICS_KEYWORDS: &[&str] = &[
    "users",
    "sessions",
    "traffic",
    "visits",
    "visitors",
    "pageviews",
    "page views",
    "bounce",
    "conversion",
    "revenue",
    "ga4",
    "google analytics",
    "analytics",
    "how many",
    "what's the",
    "show me traffic",
];

const SEO_KEYWORDS: &[&str] = &[
    "seo",
    "pages",
    "404",
    "broken",
    "links",
    "meta",
    "title",
    "description",
    "heading",
    "indexability",
    "indexable",
    "crawl",
    "sitemap",
    "canonical",
    "redirect",
    "screaming frog",
    "technical seo",
];

/// Keyword pre-classification.
///
/// Both keyword sets matching means the question spans both sources.
/// Returns `None` when neither set matches and the model has to decide.
pub fn classify_by_keywords(text: &str) -> Option<Intent> {
    let lower = text.to_lowercase();
    let analytics = ANALYTICS_KEYWORDS.iter().any(|k| lower.contains(k));
    let seo = SEO_KEYWORDS.iter().any(|k| lower.contains(k));
    match (analytics, seo) {
        (true, true) => Some(Intent::MultiAgent),
        (true, false) => Some(Intent::Analytics),
        (false, true) => Some(Intent::Seo),
        (false, false) => None,
    }
}

pub const SYSTEM_PROMPT: &str = "You route website questions to data sources. \
    Output ONLY valid JSON with the fields intent (one of \"analytics\", \"seo\", \"multi\") \
    and confidence (0.0-1.0).";

pub fn build_prompt(text: &str) -> String {
    format!(
        r#"Classify this question about a website:

Question: "{}"

Intents:
- analytics: traffic and behaviour from Google Analytics 4 (users, sessions, page views, bounce rate, conversions, revenue, sources, devices, countries)
- seo: technical SEO from a site crawl (status codes, broken links, titles, meta descriptions, headings, indexability, redirects, canonicals)
- multi: needs both, e.g. comparing traffic with crawl issues on the same pages

Examples:
Input: "How many users visited last week?"
Output: {{"intent": "analytics", "confidence": 0.95}}

Input: "Which pages return 404?"
Output: {{"intent": "seo", "confidence": 0.95}}

Input: "Which high-traffic pages have missing meta descriptions?"
Output: {{"intent": "multi", "confidence": 0.9}}

Now classify the question above. Output only JSON:"#,
        text
    )
}

/// Parse the model's answer.
///
/// Accepts a JSON object with an `intent` field or a bare label. Labels
/// outside the three intents are coerced by [`Classification::from_label`].
pub fn parse_response(response: &str) -> Result<Classification> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return Err(SiteInsightError::Classification(
            "empty response from model".to_string(),
        ));
    }

    match json::parse_object(trimmed) {
        Ok(value) => {
            let label = json::field(&value, &["intent", "category", "label"])
                .and_then(json::scalar_to_string)
                .ok_or_else(|| {
                    SiteInsightError::Classification(
                        "model response has no intent field".to_string(),
                    )
                })?;
            if label.trim().is_empty() {
                return Err(SiteInsightError::Classification(
                    "model returned an empty intent label".to_string(),
                ));
            }
            let confidence = value.get("confidence").and_then(|c| c.as_f64());
            Ok(Classification::from_label(&label, confidence))
        }
        Err(_) if !trimmed.contains('{') => {
            // Some models answer with the bare label
            let label = trimmed.lines().next().unwrap_or(trimmed);
            Ok(Classification::from_label(label, None))
        }
        Err(e) => Err(SiteInsightError::Classification(e)),
    }
}
