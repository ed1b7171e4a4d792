//! External response shape shared by the CLI and the MCP server

use crate::answer::{AnswerBundle, AnswerData, AnswerMetadata};
use crate::error::SiteInsightError;
use crate::orchestrator::Orchestrator;
use crate::query::Query;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::Instrument;

/// Inbound request as callers send it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub query: String,
    #[serde(default, alias = "property_id")]
    pub property_id: Option<String>,
    #[serde(default, alias = "spreadsheet_id", alias = "sheetId", alias = "sheet_id")]
    pub spreadsheet_id: Option<String>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessMetadata {
    pub request_id: String,
    /// Seconds, two decimals
    pub execution_time: f64,
    #[serde(flatten)]
    pub answer: AnswerMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub answer: String,
    pub data: AnswerData,
    pub metadata: SuccessMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMetadata {
    pub request_id: String,
    pub processing_time_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorBody,
    pub metadata: ErrorMetadata,
    /// Exit code a CLI should use for this failure
    #[serde(skip)]
    pub exit_code: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryResponse {
    Success(SuccessResponse),
    Failure(ErrorResponse),
}

impl QueryResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn request_id(&self) -> &str {
        match self {
            Self::Success(s) => &s.metadata.request_id,
            Self::Failure(f) => &f.metadata.request_id,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            serde_json::json!({
                "success": false,
                "error": {"kind": "internal_error", "message": e.to_string()},
            })
        })
    }
}

/// Compact request id
pub fn new_request_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

pub fn success(bundle: AnswerBundle, request_id: String) -> QueryResponse {
    let seconds = bundle.metadata.processing_time_ms as f64 / 1000.0;
    QueryResponse::Success(SuccessResponse {
        success: true,
        answer: bundle.answer,
        data: bundle.data,
        metadata: SuccessMetadata {
            request_id,
            execution_time: (seconds * 100.0).round() / 100.0,
            answer: bundle.metadata,
        },
    })
}

pub fn failure(error: &SiteInsightError, request_id: String, processing_time_ms: u64) -> QueryResponse {
    QueryResponse::Failure(ErrorResponse {
        success: false,
        error: ErrorBody {
            kind: error.kind().to_string(),
            message: error.to_string(),
        },
        metadata: ErrorMetadata {
            request_id,
            processing_time_ms,
        },
        exit_code: error.exit_code(),
    })
}

/// Validate a request, run it, and wrap the outcome
pub async fn process(orchestrator: &Orchestrator, request: QueryRequest) -> QueryResponse {
    let request_id = new_request_id();
    let span = tracing::info_span!("query", request_id = %request_id);
    respond(orchestrator, request, request_id).instrument(span).await
}

async fn respond(orchestrator: &Orchestrator, request: QueryRequest, request_id: String) -> QueryResponse {
    let started = Instant::now();

    let query = Query {
        text: request.query,
        property_id: request.property_id,
        sheet_id: request.spreadsheet_id,
    };

    let outcome = match query.validated() {
        Ok(query) => {
            tracing::info!("Processing query: {}", query.text);
            orchestrator.handle(&query).await
        }
        Err(e) => Err(e),
    };

    match outcome {
        Ok(bundle) => success(bundle, request_id),
        Err(e) => {
            tracing::error!("Query failed ({}): {}", e.kind(), e);
            failure(&e, request_id, started.elapsed().as_millis() as u64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::{Confidence, SourceKind};
    use crate::query::Intent;
    use crate::table::TabularResult;

    fn bundle() -> AnswerBundle {
        AnswerBundle {
            answer: "42 users".into(),
            data: AnswerData::Table(TabularResult::empty()),
            metadata: AnswerMetadata {
                agent: "analytics".into(),
                agents: vec![SourceKind::Analytics],
                intent: Intent::Analytics,
                processing_time_ms: 1234,
                confidence: Some(Confidence::Low),
                classification_confidence: None,
                degraded_source: None,
                intent_coerced_from: None,
                insights: None,
            },
        }
    }

    #[test]
    fn test_success_shape() {
        let json = success(bundle(), "abc".into()).to_json();
        assert_eq!(json["success"], true);
        assert_eq!(json["answer"], "42 users");
        assert_eq!(json["data"]["row_count"], 0);
        assert_eq!(json["metadata"]["request_id"], "abc");
        assert_eq!(json["metadata"]["agent"], "analytics");
        assert_eq!(json["metadata"]["intent"], "analytics");
        assert_eq!(json["metadata"]["execution_time"], 1.23);
        assert_eq!(json["metadata"]["confidence"], "low");
        assert!(json["metadata"].get("insights").is_none());
        assert!(json["metadata"].get("degraded_source").is_none());
    }

    #[test]
    fn test_error_shape() {
        let err = SiteInsightError::Upstream {
            analytics: "HTTP 503".into(),
            seo: "timeout".into(),
        };
        let response = failure(&err, "xyz".into(), 5);
        assert!(!response.is_success());
        assert_eq!(response.request_id(), "xyz");

        let json = response.to_json();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["kind"], "upstream_error");
        assert!(json["error"]["message"].as_str().unwrap().contains("HTTP 503"));
        assert!(json.get("exit_code").is_none());
    }

    #[test]
    fn test_request_aliases() {
        let req: QueryRequest = serde_json::from_str(
            r#"{"query": "404 pages", "property_id": "123456", "sheetId": "abc"}"#,
        )
        .unwrap();
        assert_eq!(req.property_id.as_deref(), Some("123456"));
        assert_eq!(req.spreadsheet_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_request_ids_are_unique_hex() {
        let a = new_request_id();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, new_request_id());
    }
}
