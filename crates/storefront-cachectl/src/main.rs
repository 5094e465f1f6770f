//! # Storefront Cache Control
//!
//! Entry point for the `storefront-cachectl` binary.

use anyhow::Context;
use clap::Parser;
use storefront_cachectl::cli::Cli;
use storefront_cachectl::commands::execute;
use storefront_cachectl::di::build_cache;
use storefront_config::{init_logging, ConfigLoader};
use storefront_core::{ErrorResponse, StorefrontError};
use tracing::{debug, error};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!("Command failed: {:#}", e);
            match e.downcast_ref::<StorefrontError>() {
                Some(err) => match serde_json::to_string(&ErrorResponse::from_error(err)) {
                    Ok(json) => eprintln!("{}", json),
                    Err(_) => eprintln!("{:#}", e),
                },
                None => eprintln!("{:#}", e),
            }
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<String> {
    let mut loader = ConfigLoader::new(cli.config_dir.clone());
    if let Some(environment) = &cli.environment {
        loader = loader.with_environment(environment.as_str());
    }
    let config = loader
        .load()
        .with_context(|| format!("loading configuration from {}", cli.config_dir.display()))?;

    init_logging(&config.observability);
    debug!("Environment: {}", config.app.environment);

    let cache = build_cache(&config, cli.memory)?;
    execute(&cli.command, &cache).await
}
