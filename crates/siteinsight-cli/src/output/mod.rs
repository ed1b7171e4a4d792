//! Output formatters

pub mod json;
pub mod terminal;

use crate::app::OutputFormat;
use siteinsight_core::error::exit_codes;
use siteinsight_core::QueryResponse;

/// Format a query response
pub fn format_response(response: &QueryResponse, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_response(response),
        OutputFormat::Cli => terminal::format_response(response),
    }
}

pub fn exit_code(response: &QueryResponse) -> i32 {
    match response {
        QueryResponse::Success(_) => exit_codes::SUCCESS,
        QueryResponse::Failure(failure) => failure.exit_code,
    }
}
