//! MCP tool definitions and handlers

use crate::protocol::*;
use anyhow::{Context, Result};
use serde_json::Value;
use siteinsight_core::{process, Orchestrator, QueryRequest, QueryResponse};

pub fn query_tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "query".to_string(),
        description: "Answer a natural-language question about the site's GA4 analytics \
            and SEO crawl data"
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Question, e.g. \"Which high-traffic pages have SEO issues?\""
                },
                "propertyId": {
                    "type": "string",
                    "description": "GA4 property id (numeric); overrides the configured default"
                },
                "spreadsheetId": {
                    "type": "string",
                    "description": "Google Sheets id of the crawl export"
                }
            },
            "required": ["query"]
        }),
    }
}

pub async fn handle_query(orchestrator: &Orchestrator, args: Value) -> Result<ToolResult> {
    let request: QueryRequest =
        serde_json::from_value(args).context("query tool expects {\"query\": string}")?;

    let response = process(orchestrator, request).await;
    let text = match &response {
        QueryResponse::Success(success) => success.answer.clone(),
        QueryResponse::Failure(failure) => format!(
            "Error ({}): {}",
            failure.error.kind, failure.error.message
        ),
    };

    Ok(ToolResult {
        content: vec![Content::Text { text }],
        is_error: (!response.is_success()).then_some(true),
        structured_content: Some(response.to_json()),
    })
}
