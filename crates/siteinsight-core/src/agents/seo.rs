//! SEO agent: question to filtered crawl table

use super::{AgentOutput, DataAgent};
use crate::answer::SourceKind;
use crate::error::Result;
use crate::insights::{self, ColumnScope, Insights};
use crate::llm::LlmGateway;
use crate::query::Query;
use crate::sources::CrawlSource;
use crate::table::{apply_filter, FilterSpec};
use async_trait::async_trait;
use std::sync::Arc;

pub struct SeoAgent {
    gateway: Arc<dyn LlmGateway>,
    source: Arc<dyn CrawlSource>,
}

impl SeoAgent {
    pub fn new(gateway: Arc<dyn LlmGateway>, source: Arc<dyn CrawlSource>) -> Self {
        Self { gateway, source }
    }
}

#[async_trait]
impl DataAgent for SeoAgent {
    fn source(&self) -> SourceKind {
        SourceKind::Seo
    }

    async fn fetch(&self, query: &Query) -> Result<AgentOutput> {
        let crawl = self.source.fetch_all(query.sheet_id.as_deref()).await?;
        if crawl.is_empty() {
            tracing::info!("Crawl export is empty");
            return Ok(crawl.into());
        }

        let scope = ColumnScope::analyze(&crawl.columns);
        if scope.limited {
            tracing::info!("{}", scope.message);
        }

        let spec = match self.gateway.describe_filter(&query.text, &crawl.columns).await {
            Ok(spec) => spec,
            Err(e) => {
                tracing::warn!("Could not derive crawl filter ({}), using default row limit", e);
                FilterSpec::default()
            }
        };
        tracing::debug!("Crawl filter: {:?}", spec);

        let table = apply_filter(&crawl, &spec);
        let confidence = scope.confidence(table.row_count);
        Ok(AgentOutput {
            insights: Insights {
                seo_risk: insights::score_risks(&table),
                column_scope: Some(scope),
                ..Insights::default()
            },
            confidence: Some(confidence),
            table,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::{AnswerData, Confidence};
    use crate::error::SiteInsightError;
    use crate::query::{Classification, ExtractedParameters};
    use crate::sources::DemoCrawlSource;
    use crate::table::{CellValue, TabularResult};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FilterGateway {
        spec: Option<FilterSpec>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmGateway for FilterGateway {
        async fn classify(&self, _text: &str) -> Result<Classification> {
            unreachable!()
        }

        async fn extract_parameters(
            &self,
            _text: &str,
            _allowed_metrics: &[&str],
            _allowed_dimensions: &[&str],
        ) -> Result<ExtractedParameters> {
            unreachable!()
        }

        async fn describe_filter(&self, _text: &str, columns: &[String]) -> Result<FilterSpec> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(columns.iter().any(|c| c == "Status Code"));
            self.spec
                .clone()
                .ok_or_else(|| SiteInsightError::Llm("model unavailable".into()))
        }

        async fn synthesize(
            &self,
            _text: &str,
            _data: &AnswerData,
            _insights: &Insights,
        ) -> Result<String> {
            unreachable!()
        }
    }

    struct EmptyCrawl;

    #[async_trait]
    impl CrawlSource for EmptyCrawl {
        fn source_type(&self) -> &'static str {
            "empty"
        }

        async fn fetch_all(&self, _sheet_id: Option<&str>) -> Result<TabularResult> {
            Ok(TabularResult::empty())
        }
    }

    /// Two pages with PageSpeed and accessibility audit columns
    struct AuditCrawl;

    #[async_trait]
    impl CrawlSource for AuditCrawl {
        fn source_type(&self) -> &'static str {
            "audit"
        }

        async fn fetch_all(&self, _sheet_id: Option<&str>) -> Result<TabularResult> {
            let columns = ["Address", "Status Code", "PSI Error", "WCAG Violations"];
            let data = [
                ["https://example.com/", "200", "", "2"],
                ["https://example.com/checkout", "200", "Lighthouse timeout", "5"],
            ];
            let rows = data
                .iter()
                .map(|values| {
                    columns
                        .iter()
                        .zip(values.iter())
                        .map(|(c, v)| (c.to_string(), CellValue::parse(v)))
                        .collect()
                })
                .collect();
            Ok(TabularResult::new(
                columns.iter().map(|c| c.to_string()).collect(),
                rows,
            ))
        }
    }

    fn gateway(spec: Option<FilterSpec>) -> Arc<FilterGateway> {
        Arc::new(FilterGateway {
            spec,
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_filter_is_applied() {
        let mut spec = FilterSpec::default();
        spec.filters.insert("Status Code".into(), "404".into());
        let agent = SeoAgent::new(gateway(Some(spec)), Arc::new(DemoCrawlSource::new()));

        let output = agent.fetch(&Query::new("Which pages are 404?")).await.unwrap();
        assert_eq!(output.table.row_count, 1);
        assert_eq!(
            output.table.rows[0]["URL"],
            CellValue::from("https://example.com/about")
        );
    }

    #[tokio::test]
    async fn test_demo_crawl_scope_limits_confidence() {
        let agent = SeoAgent::new(gateway(None), Arc::new(DemoCrawlSource::new()));
        let output = agent.fetch(&Query::new("crawl overview")).await.unwrap();

        let scope = output.insights.column_scope.unwrap();
        assert!(scope.limited);
        assert!(scope.message.starts_with(
            "Only Crawlability/Status Codes, Content/Meta Tags data available."
        ));
        assert_eq!(output.confidence, Some(Confidence::Medium));
        // No PageSpeed or accessibility columns to score
        assert!(output.insights.seo_risk.is_none());
    }

    #[tokio::test]
    async fn test_risk_scores_follow_filter() {
        let agent = SeoAgent::new(gateway(None), Arc::new(AuditCrawl));
        let output = agent.fetch(&Query::new("accessibility issues")).await.unwrap();
        let risk = output.insights.seo_risk.unwrap();
        assert_eq!((risk.high, risk.medium, risk.low), (1, 1, 0));
        assert_eq!(risk.scored[0].url, "https://example.com/checkout");
        assert_eq!(output.confidence, Some(Confidence::Medium));
    }

    #[tokio::test]
    async fn test_filter_failure_returns_unfiltered_rows() {
        let agent = SeoAgent::new(gateway(None), Arc::new(DemoCrawlSource::new()));
        let output = agent.fetch(&Query::new("crawl overview")).await.unwrap();
        assert_eq!(output.table.row_count, 5);
    }

    #[tokio::test]
    async fn test_empty_crawl_skips_model() {
        let gw = gateway(Some(FilterSpec::default()));
        let agent = SeoAgent::new(gw.clone(), Arc::new(EmptyCrawl));
        let output = agent.fetch(&Query::new("broken links")).await.unwrap();
        assert!(output.table.is_empty());
        assert!(output.insights.is_empty());
        assert_eq!(gw.calls.load(Ordering::SeqCst), 0);
    }
}
