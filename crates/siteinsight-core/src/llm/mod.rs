//! LLM integration
//!
//! Provides:
//! - An OpenAI-compatible chat completion client
//! - Intent classification (keyword rules, then the model)
//! - GA4 parameter extraction and crawl filter description
//! - Answer synthesis

mod client;
pub mod filter;
mod gateway;
pub mod intent;
pub mod json;
pub mod parameters;
pub mod synthesis;

pub use client::{
    APIMetrics, ChatMessage, CompletionOptions, HttpLLMClient, LLMClient, MetricsSnapshot,
};
pub use gateway::{HttpGateway, LlmGateway};
