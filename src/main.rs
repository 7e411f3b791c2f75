mod config;
mod errors;
mod logging;
mod mcp;
mod profiles;
mod provider;
mod server;
mod tools;
#[cfg(test)]
mod tests;

use crate::config::Config;
use anyhow::Context;
use clap::Parser;
use std::{path::PathBuf, sync::Arc};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "aws-storage-mcp", version, about = "HTTP tool gateway over AWS storage services")]
struct Cli {
    /// TOML (or .json) configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides server.bind_addr
    #[arg(long)]
    host: Option<String>,
    /// Overrides server.port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = Config::resolve(cli.config.as_deref()).context("loading config")?;
    cfg.apply_env();
    if let Some(host) = cli.host {
        cfg.server.bind_addr = host;
    }
    if let Some(port) = cli.port {
        cfg.server.port = port;
    }
    cfg.validate().context("validating config")?;

    logging::init(cfg.logging.format);

    let profiles = Arc::new(profiles::ProfileStore::new(&cfg.aws));
    let cli_api = provider::cli::AwsCli::new(&cfg.aws);
    info!(program = %cli_api.program().display(), region = %cfg.aws.region, profile = ?profiles.active(), "aws cli backend");
    let registry = mcp::registry::ToolRegistry::new(&cfg, Arc::new(cli_api), profiles);

    info!(
        addr = %format!("{}:{}", cfg.server.bind_addr, cfg.server.port),
        tools = registry.list_names().len(),
        "aws-storage-mcp ready"
    );

    server::serve(cfg, registry).await
}
