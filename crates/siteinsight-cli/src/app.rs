//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "siteinsight")]
#[command(
    author,
    version,
    about = "Ask questions about your website's analytics and SEO crawl data"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "cli")]
    pub format: OutputFormat,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true, env = "SITEINSIGHT_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ask a question in natural language
    Ask(AskArgs),

    /// Show the effective configuration
    Config(ConfigArgs),

    /// Start MCP server
    Mcp,
}

#[derive(Args)]
pub struct AskArgs {
    /// The question
    #[arg(required = true)]
    pub query: Vec<String>,

    /// GA4 property id (overrides the configured default)
    #[arg(long)]
    pub property_id: Option<String>,

    /// Spreadsheet id holding the crawl export
    #[arg(long, alias = "spreadsheet-id")]
    pub sheet_id: Option<String>,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Only print the config file path
    #[arg(long)]
    pub path: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Cli,
    Json,
}
