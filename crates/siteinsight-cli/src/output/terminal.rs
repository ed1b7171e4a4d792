//! Terminal output formatter

use siteinsight_core::response::{ErrorResponse, SuccessResponse};
use siteinsight_core::{AnswerData, FusedData, QueryResponse, TabularResult};

/// Rows shown under the answer
const PREVIEW_ROWS: usize = 10;

pub fn format_response(response: &QueryResponse) -> String {
    match response {
        QueryResponse::Success(success) => format_success(success),
        QueryResponse::Failure(failure) => format_failure(failure),
    }
}

fn format_success(success: &SuccessResponse) -> String {
    let mut output = String::new();
    output.push_str(success.answer.trim());
    output.push_str("\n\n");

    match &success.data {
        AnswerData::Table(table) => output.push_str(&format_table(table)),
        AnswerData::Fused(fused) => output.push_str(&format_fused(fused)),
    }

    let meta = &success.metadata;
    if let Some(insights) = &meta.answer.insights {
        output.push('\n');
        for line in insights.lines() {
            output.push_str(&line);
            output.push('\n');
        }
    }

    let mut line = format!(
        "agent: {}  time: {:.2}s",
        meta.answer.agent, meta.execution_time
    );
    if let Some(confidence) = meta.answer.confidence {
        line.push_str(&format!("  confidence: {}", confidence.as_str()));
    }
    output.push('\n');
    output.push_str(&line);
    output.push('\n');

    if let Some(source) = meta.answer.degraded_source {
        output.push_str(&format!(
            "warning: {} data was unavailable; answer uses the remaining source only\n",
            source
        ));
    }
    output
}

fn format_failure(failure: &ErrorResponse) -> String {
    format!("Error ({}): {}\n", failure.error.kind, failure.error.message)
}

fn format_table(table: &TabularResult) -> String {
    if table.is_empty() {
        return "(no rows)\n".to_string();
    }

    let mut output = table.columns.join("\t");
    output.push('\n');
    for row in table.rows.iter().take(PREVIEW_ROWS) {
        let cells: Vec<String> = table
            .columns
            .iter()
            .map(|c| row.get(c).map(|v| v.to_string()).unwrap_or_default())
            .collect();
        output.push_str(&cells.join("\t"));
        output.push('\n');
    }
    if table.row_count > PREVIEW_ROWS {
        output.push_str(&format!("... {} more rows\n", table.row_count - PREVIEW_ROWS));
    }
    output
}

fn format_fused(fused: &FusedData) -> String {
    if fused.records.is_empty() {
        return "(no pages)\n".to_string();
    }

    let mut output = String::new();
    for record in fused.ranked().into_iter().take(PREVIEW_ROWS) {
        output.push_str(&record.page);
        if !record.missing.is_empty() {
            output.push_str(&format!("  (no {} data)", record.missing.join(", ")));
        }
        output.push('\n');
        for (field, value) in &record.fields {
            output.push_str(&format!("  {}: {}\n", field, value));
        }
    }
    if fused.row_count > PREVIEW_ROWS {
        output.push_str(&format!("... {} more pages\n", fused.row_count - PREVIEW_ROWS));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use siteinsight_core::response::{failure, success};
    use siteinsight_core::insights::ColumnScope;
    use siteinsight_core::{
        AnswerBundle, AnswerMetadata, CellValue, Insights, Intent, Row, SiteInsightError,
        SourceKind,
    };

    fn table(rows: usize) -> TabularResult {
        let rows = (0..rows)
            .map(|i| {
                let mut row = Row::new();
                row.insert("pagePath".into(), CellValue::from(format!("/p{}", i)));
                row.insert("sessions".into(), CellValue::Number(10.0));
                row
            })
            .collect();
        TabularResult::new(vec!["pagePath".into(), "sessions".into()], rows)
    }

    fn response(data: AnswerData, degraded: Option<SourceKind>) -> QueryResponse {
        response_with(data, degraded, None)
    }

    fn response_with(
        data: AnswerData,
        degraded: Option<SourceKind>,
        insights: Option<Insights>,
    ) -> QueryResponse {
        success(
            AnswerBundle {
                answer: "Sessions are steady.".into(),
                data,
                metadata: AnswerMetadata {
                    agent: "multi".into(),
                    agents: vec![SourceKind::Analytics],
                    intent: Intent::MultiAgent,
                    processing_time_ms: 2500,
                    confidence: None,
                    classification_confidence: None,
                    degraded_source: degraded,
                    intent_coerced_from: None,
                    insights,
                },
            },
            "req".into(),
        )
    }

    #[test]
    fn test_table_preview_is_capped() {
        let text = format_response(&response(AnswerData::Table(table(12)), None));
        assert!(text.starts_with("Sessions are steady.\n\npagePath\tsessions\n"));
        assert!(text.contains("/p9\t10\n"));
        assert!(!text.contains("/p10"));
        assert!(text.contains("... 2 more rows"));
        assert!(text.contains("agent: multi  time: 2.50s"));
    }

    #[test]
    fn test_degraded_warning() {
        let text = format_response(&response(
            AnswerData::Table(table(1)),
            Some(SourceKind::Seo),
        ));
        assert!(text.contains("warning: seo data was unavailable"));
    }

    #[test]
    fn test_insights_are_printed() {
        let insights = Insights {
            alerts: vec!["Bounce rate exceeds 70% - consider improving page engagement".into()],
            column_scope: Some(ColumnScope::analyze(&["Address".to_string()])),
            ..Insights::default()
        };
        let text = format_response(&response_with(
            AnswerData::Table(table(1)),
            None,
            Some(insights),
        ));
        assert!(text.contains("Alerts:\n- Bounce rate exceeds 70%"));
        assert!(text.contains("Crawl data scope: Only Crawlability/Status Codes data available."));
        let alerts = text.find("Alerts:").unwrap();
        assert!(alerts < text.find("agent: multi").unwrap());
    }

    #[test]
    fn test_failure_line() {
        let err = SiteInsightError::InvalidInput("query too short".into());
        let text = format_response(&failure(&err, "req".into(), 1));
        assert_eq!(text, "Error (invalid_input): Invalid input: query too short\n");
    }
}
