//! Query orchestration
//!
//! Classifies a question, dispatches it to one or both agents, fuses the
//! results when both ran, and asks the gateway for the final answer.
//! Holds no per-request state; one instance serves every request.

pub mod fusion;

use crate::agents::{AgentOutput, AnalyticsAgent, DataAgent, SeoAgent};
use crate::answer::{AnswerBundle, AnswerData, AnswerMetadata, Confidence, SourceKind};
use crate::config::Config;
use crate::error::{Result, SiteInsightError};
use crate::insights::Insights;
use crate::llm::{HttpGateway, LlmGateway};
use crate::query::{Classification, Intent, Query};
use crate::sources;
use std::sync::Arc;
use std::time::Instant;

pub use fusion::{fuse, normalize_page_key, FusedRecord};

/// Outcome of the data-gathering step
struct Gathered {
    data: AnswerData,
    agents: Vec<SourceKind>,
    degraded_source: Option<SourceKind>,
    confidence: Confidence,
    insights: Insights,
}

pub struct Orchestrator {
    gateway: Arc<dyn LlmGateway>,
    analytics: Arc<dyn DataAgent>,
    seo: Arc<dyn DataAgent>,
}

impl Orchestrator {
    /// Create from already-built collaborators
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        analytics: Arc<dyn DataAgent>,
        seo: Arc<dyn DataAgent>,
    ) -> Self {
        Self {
            gateway,
            analytics,
            seo,
        }
    }

    /// Wire the HTTP gateway, data sources and agents from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let gateway: Arc<dyn LlmGateway> = Arc::new(HttpGateway::from_config(config)?);
        let analytics = AnalyticsAgent::new(
            gateway.clone(),
            sources::analytics_from_config(config)?,
            config.analytics.default_property_id.clone(),
        );
        let seo = SeoAgent::new(gateway.clone(), sources::crawl_from_config(config)?);

        if config.demo_mode {
            tracing::info!("Demo mode enabled: analytics and crawl data are mocked");
        }

        Ok(Self::new(gateway, Arc::new(analytics), Arc::new(seo)))
    }

    /// Answer one query
    pub async fn handle(&self, query: &Query) -> Result<AnswerBundle> {
        let started = Instant::now();

        let classification = self.gateway.classify(&query.text).await.map_err(|e| match e {
            SiteInsightError::Classification(_) => e,
            other => SiteInsightError::Classification(other.to_string()),
        })?;
        tracing::info!("Routing query to {}", classification.intent);

        let gathered = match classification.intent {
            Intent::Analytics => self.single(&self.analytics, query).await?,
            Intent::Seo => self.single(&self.seo, query).await?,
            Intent::MultiAgent => self.both(query).await?,
        };

        let answer = self
            .gateway
            .synthesize(&query.text, &gathered.data, &gathered.insights)
            .await
            .map_err(|e| match e {
                SiteInsightError::Synthesis(_) => e,
                other => SiteInsightError::Synthesis(other.to_string()),
            })?;
        if answer.trim().is_empty() {
            return Err(SiteInsightError::Synthesis(
                "model returned an empty answer".to_string(),
            ));
        }

        let metadata = Self::metadata(
            &classification,
            gathered.agents,
            gathered.degraded_source,
            gathered.confidence,
            gathered.insights,
            started,
        );
        tracing::info!(
            "Answered {} query in {}ms",
            metadata.agent,
            metadata.processing_time_ms
        );

        Ok(AnswerBundle {
            answer,
            data: gathered.data,
            metadata,
        })
    }

    async fn single(&self, agent: &Arc<dyn DataAgent>, query: &Query) -> Result<Gathered> {
        let output = agent.fetch(query).await?;
        Ok(Gathered {
            confidence: output
                .confidence
                .unwrap_or_else(|| Confidence::from_row_count(output.table.row_count)),
            data: AnswerData::Table(output.table),
            agents: vec![agent.source()],
            degraded_source: None,
            insights: output.insights,
        })
    }

    async fn both(&self, query: &Query) -> Result<Gathered> {
        let (analytics, seo) = futures::join!(self.analytics.fetch(query), self.seo.fetch(query));

        match (analytics, seo) {
            (Ok(a), Ok(s)) => {
                let non_empty = [&a.table, &s.table]
                    .iter()
                    .filter(|t| !t.is_empty())
                    .count();
                Ok(Gathered {
                    data: AnswerData::Fused(fusion::fuse(&a.table, &s.table)),
                    agents: vec![SourceKind::Analytics, SourceKind::Seo],
                    degraded_source: None,
                    confidence: Confidence::from_coverage(non_empty),
                    insights: a.insights.merge(s.insights),
                })
            }
            (Err(e), Ok(s)) => {
                tracing::warn!("Analytics branch failed, answering from crawl data only: {}", e);
                Ok(Self::degraded(s, SourceKind::Seo, SourceKind::Analytics))
            }
            (Ok(a), Err(e)) => {
                tracing::warn!("SEO branch failed, answering from analytics data only: {}", e);
                Ok(Self::degraded(a, SourceKind::Analytics, SourceKind::Seo))
            }
            (Err(ea), Err(es)) => Err(SiteInsightError::Upstream {
                analytics: ea.to_string(),
                seo: es.to_string(),
            }),
        }
    }

    fn degraded(output: AgentOutput, survivor: SourceKind, failed: SourceKind) -> Gathered {
        Gathered {
            confidence: Confidence::from_coverage(usize::from(!output.table.is_empty())),
            data: AnswerData::Table(output.table),
            agents: vec![survivor],
            degraded_source: Some(failed),
            insights: output.insights,
        }
    }

    fn metadata(
        classification: &Classification,
        agents: Vec<SourceKind>,
        degraded_source: Option<SourceKind>,
        coverage: Confidence,
        insights: Insights,
        started: Instant,
    ) -> AnswerMetadata {
        AnswerMetadata {
            agent: classification.intent.as_str().to_string(),
            agents,
            intent: classification.intent,
            processing_time_ms: started.elapsed().as_millis() as u64,
            confidence: Some(
                classification
                    .confidence
                    .map(Confidence::from_score)
                    .unwrap_or(coverage),
            ),
            classification_confidence: classification.confidence,
            degraded_source,
            intent_coerced_from: classification.coerced_from.clone(),
            insights: (!insights.is_empty()).then_some(insights),
        }
    }
}
