//! Config command

use crate::app::{ConfigArgs, OutputFormat};
use anyhow::Result;
use siteinsight_core::Config;
use std::path::Path;

const REDACTED: &str = "********";

pub async fn run(args: ConfigArgs, path: &Path, format: OutputFormat) -> Result<()> {
    if args.path {
        println!("{}", path.display());
        return Ok(());
    }

    let config = redacted(Config::load_from(path)?);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        OutputFormat::Cli => {
            println!("# {}", path.display());
            print!("{}", serde_yaml::to_string(&config)?);
        }
    }
    Ok(())
}

/// Replace every credential with a placeholder
fn redacted(mut config: Config) -> Config {
    for secret in [
        &mut config.llm_service.api_key,
        &mut config.analytics.access_token,
        &mut config.crawl.api_key,
        &mut config.crawl.access_token,
    ] {
        if secret.is_some() {
            *secret = Some(REDACTED.to_string());
        }
    }
    config
}
