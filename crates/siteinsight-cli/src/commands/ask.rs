//! Ask command

use crate::app::{AskArgs, OutputFormat};
use crate::output;
use anyhow::Result;
use siteinsight_core::{process, Config, Orchestrator, QueryRequest};

/// Run one query; returns the process exit code
pub async fn run(args: AskArgs, config: &Config, format: OutputFormat) -> Result<i32> {
    let orchestrator = Orchestrator::from_config(config)?;

    let request = QueryRequest {
        query: args.query.join(" "),
        property_id: args.property_id,
        spreadsheet_id: args
            .sheet_id
            .or_else(|| config.crawl.default_spreadsheet_id.clone()),
    };

    let response = process(&orchestrator, request).await;
    print!("{}", output::format_response(&response, format));

    Ok(output::exit_code(&response))
}
