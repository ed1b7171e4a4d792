//! JSON output formatter

use siteinsight_core::QueryResponse;

pub fn format_response(response: &QueryResponse) -> String {
    serde_json::to_string_pretty(&response.to_json()).unwrap_or_else(|_| "{}".to_string()) + "\n"
}
