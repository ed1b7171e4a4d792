//! LLM gateway: every model call the pipeline makes
//!
//! The orchestrator and agents only see [`LlmGateway`]. [`HttpGateway`]
//! implements it on top of any [`LLMClient`], so tests swap in scripted
//! clients or whole fake gateways.

use super::client::{ChatMessage, CompletionOptions, HttpLLMClient, LLMClient};
use super::{filter, intent, parameters, synthesis};
use crate::answer::AnswerData;
use crate::config::Config;
use crate::error::{Result, SiteInsightError};
use crate::insights::Insights;
use crate::query::{Classification, ExtractedParameters};
use crate::retry::RetryPolicy;
use crate::table::FilterSpec;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;

/// Model-backed operations used by the orchestrator and agents
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Route a question to an intent
    async fn classify(&self, text: &str) -> Result<Classification>;

    /// GA4 report parameters for a question; names are not yet validated
    async fn extract_parameters(
        &self,
        text: &str,
        allowed_metrics: &[&str],
        allowed_dimensions: &[&str],
    ) -> Result<ExtractedParameters>;

    /// Filter and aggregation for a crawl table with the given columns
    async fn describe_filter(&self, text: &str, columns: &[String]) -> Result<FilterSpec>;

    /// Natural-language answer from the retrieved data and the findings
    /// computed from it
    async fn synthesize(
        &self,
        text: &str,
        data: &AnswerData,
        insights: &Insights,
    ) -> Result<String>;
}

/// Gateway over an OpenAI-compatible chat completion client
pub struct HttpGateway {
    client: Arc<dyn LLMClient>,
    rule_based: bool,
    fixed_today: Option<NaiveDate>,
}

impl HttpGateway {
    /// Create from LLM client
    pub fn new(client: Arc<dyn LLMClient>) -> Self {
        Self {
            client,
            rule_based: true,
            fixed_today: None,
        }
    }

    /// Create from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = HttpLLMClient::new(
            config.llm_service.clone(),
            RetryPolicy::from(&config.retry),
        )?;
        Ok(Self::new(Arc::new(client)).with_rule_based(config.intent.rule_based))
    }

    /// Enable or disable keyword pre-classification
    pub fn with_rule_based(mut self, enabled: bool) -> Self {
        self.rule_based = enabled;
        self
    }

    /// Resolve relative dates against a fixed day instead of the local clock
    pub fn with_fixed_date(mut self, today: NaiveDate) -> Self {
        self.fixed_today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.fixed_today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    async fn ask(&self, system: &str, prompt: String, options: CompletionOptions) -> Result<String> {
        let messages = vec![ChatMessage::system(system), ChatMessage::user(prompt)];
        self.client.chat_completion(messages, options).await
    }
}

#[async_trait]
impl LlmGateway for HttpGateway {
    async fn classify(&self, text: &str) -> Result<Classification> {
        if self.rule_based {
            if let Some(intent) = intent::classify_by_keywords(text) {
                tracing::debug!("Keyword rules routed query to {}", intent);
                return Ok(Classification::new(intent));
            }
        }

        let response = self
            .ask(
                intent::SYSTEM_PROMPT,
                intent::build_prompt(text),
                CompletionOptions::json(),
            )
            .await
            .map_err(|e| SiteInsightError::Classification(e.to_string()))?;

        intent::parse_response(&response)
    }

    async fn extract_parameters(
        &self,
        text: &str,
        allowed_metrics: &[&str],
        allowed_dimensions: &[&str],
    ) -> Result<ExtractedParameters> {
        let today = self.today();
        let response = self
            .ask(
                parameters::SYSTEM_PROMPT,
                parameters::build_prompt(text, allowed_metrics, allowed_dimensions, today),
                CompletionOptions::json(),
            )
            .await
            .map_err(|e| SiteInsightError::ParameterExtraction(e.to_string()))?;

        let params = parameters::parse_response(&response, today)?;
        tracing::debug!(
            "Extracted metrics={:?} dimensions={:?} range={}",
            params.metrics,
            params.dimensions,
            params.date_range
        );
        Ok(params)
    }

    async fn describe_filter(&self, text: &str, columns: &[String]) -> Result<FilterSpec> {
        let response = self
            .ask(
                filter::SYSTEM_PROMPT,
                filter::build_prompt(text, columns),
                CompletionOptions::json(),
            )
            .await?;
        filter::parse_response(&response)
    }

    async fn synthesize(
        &self,
        text: &str,
        data: &AnswerData,
        insights: &Insights,
    ) -> Result<String> {
        let answer = self
            .ask(
                synthesis::SYSTEM_PROMPT,
                synthesis::build_prompt(text, data, insights),
                CompletionOptions::text(0.3),
            )
            .await
            .map_err(|e| SiteInsightError::Synthesis(e.to_string()))?;

        let answer = answer.trim();
        if answer.is_empty() {
            return Err(SiteInsightError::Synthesis(
                "model returned an empty answer".to_string(),
            ));
        }
        Ok(answer.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Intent;
    use crate::table::TabularResult;
    use std::sync::Mutex;

    /// Replies with canned text and records every prompt it sees
    struct ScriptedClient {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LLMClient for ScriptedClient {
        async fn chat_completion(
            &self,
            messages: Vec<ChatMessage>,
            _options: CompletionOptions,
        ) -> Result<String> {
            let prompt = messages.last().map(|m| m.content.clone()).unwrap_or_default();
            self.prompts.lock().unwrap().push(prompt);
            Ok(self.reply.clone())
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    struct FailingClient;

    #[async_trait]
    impl LLMClient for FailingClient {
        async fn chat_completion(
            &self,
            _messages: Vec<ChatMessage>,
            _options: CompletionOptions,
        ) -> Result<String> {
            Err(SiteInsightError::Llm("LLM service error (HTTP 500)".into()))
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_keywords_skip_the_model() {
        let client = ScriptedClient::new("{\"intent\": \"seo\"}");
        let gateway = HttpGateway::new(client.clone());
        let c = gateway.classify("How many users came today?").await.unwrap();
        assert_eq!(c.intent, Intent::Analytics);
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_model_classifies_when_rules_disabled() {
        let client = ScriptedClient::new("{\"intent\": \"seo\", \"confidence\": 0.9}");
        let gateway = HttpGateway::new(client.clone()).with_rule_based(false);
        let c = gateway.classify("How many users came today?").await.unwrap();
        assert_eq!(c.intent, Intent::Seo);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_classification_failure_kind() {
        let gateway = HttpGateway::new(Arc::new(FailingClient));
        let err = gateway.classify("something vague").await.unwrap_err();
        assert_eq!(err.kind(), "classification_error");
    }

    #[tokio::test]
    async fn test_extraction_uses_fixed_date() {
        let client = ScriptedClient::new(
            r#"{"metrics": ["activeUsers"], "dimensions": ["date"], "date_range": {"start_date": "7daysAgo", "end_date": "yesterday"}}"#,
        );
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let gateway = HttpGateway::new(client.clone()).with_fixed_date(today);
        let p = gateway
            .extract_parameters("users last week", &["activeUsers"], &["date"])
            .await
            .unwrap();
        assert_eq!(p.date_range.days(), 7);
        assert!(client.prompts.lock().unwrap()[0].contains("Today's date: 2024-03-15"));
    }

    #[tokio::test]
    async fn test_empty_synthesis_is_error() {
        let gateway = HttpGateway::new(ScriptedClient::new("   "));
        let err = gateway
            .synthesize(
                "anything",
                &AnswerData::Table(TabularResult::empty()),
                &Insights::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "synthesis_error");
    }

    #[tokio::test]
    async fn test_synthesis_failure_kind() {
        let gateway = HttpGateway::new(Arc::new(FailingClient));
        let err = gateway
            .synthesize(
                "anything",
                &AnswerData::Table(TabularResult::empty()),
                &Insights::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "synthesis_error");
    }
}
