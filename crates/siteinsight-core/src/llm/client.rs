//! HTTP client for OpenAI-compatible chat completion services

use crate::config::LLMServiceConfig;
use crate::error::{Result, SiteInsightError};
use crate::retry::{self, RetryPolicy};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Trait for LLM service clients
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate chat completion
    async fn chat_completion(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<String>;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Chat message for completion requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Per-call sampling options
#[derive(Debug, Clone, Copy)]
pub struct CompletionOptions {
    pub temperature: f32,
    /// Ask the service for a JSON object response
    pub json_mode: bool,
}

impl CompletionOptions {
    /// Deterministic JSON output, used for classification and extraction
    pub fn json() -> Self {
        Self {
            temperature: 0.0,
            json_mode: true,
        }
    }

    /// Free text, used for answer synthesis
    pub fn text(temperature: f32) -> Self {
        Self {
            temperature,
            json_mode: false,
        }
    }
}

/// API metrics for monitoring
#[derive(Debug, Default)]
pub struct APIMetrics {
    pub total_requests: AtomicU64,
    pub total_errors: AtomicU64,
    pub total_latency_ms: AtomicU64,
}

/// Snapshot of API metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub total_errors: u64,
    pub avg_latency_ms: f64,
}

/// OpenAI-compatible client (LiteLLM, vLLM, OpenAI, Gemini's compatibility endpoint)
pub struct HttpLLMClient {
    http_client: reqwest::Client,
    config: LLMServiceConfig,
    retry: RetryPolicy,
    metrics: Arc<APIMetrics>,
}

impl HttpLLMClient {
    /// Create new client from configuration
    pub fn new(config: LLMServiceConfig, retry: RetryPolicy) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(SiteInsightError::Http)?;

        Ok(Self {
            http_client,
            config,
            retry,
            metrics: Arc::new(APIMetrics::default()),
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(LLMServiceConfig::default(), RetryPolicy::default())
    }

    /// Get current API metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        let total = self.metrics.total_requests.load(Ordering::Relaxed);
        MetricsSnapshot {
            total_requests: total,
            total_errors: self.metrics.total_errors.load(Ordering::Relaxed),
            avg_latency_ms: if total > 0 {
                self.metrics.total_latency_ms.load(Ordering::Relaxed) as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    async fn send_once(&self, request: &ChatRequest<'_>) -> Result<String> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.url.trim_end_matches('/')
        );

        let mut req = self.http_client.post(&url).json(request);
        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SiteInsightError::Llm(format!(
                "LLM service error (HTTP {}): {}",
                status, body
            )));
        }

        let chat_response: ChatResponse = response.json().await?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| SiteInsightError::Llm("No response from LLM".to_string()))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl LLMClient for HttpLLMClient {
    async fn chat_completion(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<String> {
        let start = Instant::now();
        self.metrics.total_requests.fetch_add(1, Ordering::Relaxed);

        let request = ChatRequest {
            model: &self.config.model,
            messages: &messages,
            temperature: options.temperature,
            max_tokens: self.config.max_tokens,
            response_format: options.json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let result = retry::with_backoff(&self.retry, "LLM chat completion", || {
            self.send_once(&request)
        })
        .await;

        let elapsed = start.elapsed().as_millis() as u64;
        self.metrics
            .total_latency_ms
            .fetch_add(elapsed, Ordering::Relaxed);

        match result {
            Ok(content) => {
                tracing::debug!(
                    "LLM completion: {} chars in {}ms",
                    content.len(),
                    elapsed
                );
                Ok(content)
            }
            Err(e) => {
                self.metrics.total_errors.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_includes_json_mode() {
        let messages = vec![ChatMessage::system("sys"), ChatMessage::user("hi")];
        let request = ChatRequest {
            model: "m",
            messages: &messages,
            temperature: 0.0,
            max_tokens: 64,
            response_format: Some(ResponseFormat {
                kind: "json_object",
            }),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["messages"][0]["role"], "system");
    }

    #[test]
    fn test_text_request_omits_response_format() {
        let messages = vec![ChatMessage::user("hi")];
        let request = ChatRequest {
            model: "m",
            messages: &messages,
            temperature: 0.3,
            max_tokens: 64,
            response_format: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("response_format").is_none());
    }

    #[test]
    fn test_response_with_null_content() {
        let resp: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#)
                .unwrap();
        assert!(resp.choices[0].message.content.is_none());
    }

    #[test]
    fn test_metrics_start_empty() {
        let client = HttpLLMClient::new(LLMServiceConfig::default(), RetryPolicy::none()).unwrap();
        let snapshot = client.metrics();
        assert_eq!(snapshot.total_requests, 0);
        assert_eq!(snapshot.avg_latency_ms, 0.0);
    }
}
