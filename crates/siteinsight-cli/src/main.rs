//! Siteinsight CLI
//!
//! Ask questions about your website's analytics and SEO crawl data.

use anyhow::Result;
use clap::Parser;
use siteinsight_core::{Config, Orchestrator};
use std::sync::Arc;

mod app;
mod commands;
mod output;

use app::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries answers and JSON-RPC
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);

    match cli.command {
        Commands::Ask(args) => {
            let config = Config::load_from(&config_path)?;
            let code = commands::ask::run(args, &config, cli.format).await?;
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Commands::Config(args) => commands::config::run(args, &config_path, cli.format).await,
        Commands::Mcp => {
            let config = Config::load_from(&config_path)?;
            let orchestrator = Arc::new(Orchestrator::from_config(&config)?);
            siteinsight_mcp::start_server(orchestrator).await
        }
    }
}
