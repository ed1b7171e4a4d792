//! Data agents
//!
//! Each agent turns a question into one table from its source, plus any
//! findings it can compute from that table. The orchestrator decides which
//! agents run and never looks inside them.

use crate::answer::{Confidence, SourceKind};
use crate::error::Result;
use crate::insights::Insights;
use crate::query::Query;
use crate::table::TabularResult;
use async_trait::async_trait;

pub mod analytics;
pub mod seo;

pub use analytics::AnalyticsAgent;
pub use seo::SeoAgent;

/// What one agent retrieved
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentOutput {
    pub table: TabularResult,
    pub insights: Insights,
    /// The agent's own judgement of its data; row count decides when unset
    pub confidence: Option<Confidence>,
}

impl From<TabularResult> for AgentOutput {
    fn from(table: TabularResult) -> Self {
        Self {
            table,
            ..Self::default()
        }
    }
}

/// An agent that answers part of a question with data from one source
#[async_trait]
pub trait DataAgent: Send + Sync {
    /// Which source this agent reads
    fn source(&self) -> SourceKind;

    /// Fetch the table relevant to the query
    async fn fetch(&self, query: &Query) -> Result<AgentOutput>;
}
