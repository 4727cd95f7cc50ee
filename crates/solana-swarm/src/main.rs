#![recursion_limit = "256"]
#![expect(
    clippy::multiple_crate_versions,
    reason = "transitive dependency duplication"
)]

use clap::{Parser, Subcommand, ValueEnum};
use eyre::Context as _;
use std::io::Write as _;
use tracing_subscriber::prelude::*;

mod amount;
mod chains;
mod cli_output;
mod config;
mod db;
mod errors;
mod fsutil;
mod gateway;
mod http;
mod market;
mod paths;
mod retry;
mod rpc;
mod store;
#[cfg(test)]
mod testing;
mod tokens;
mod wallet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CliNetwork {
    Devnet,
    Mainnet,
}

impl From<CliNetwork> for config::Network {
    fn from(v: CliNetwork) -> Self {
        match v {
            CliNetwork::Devnet => Self::Devnet,
            CliNetwork::Mainnet => Self::Mainnet,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "solana-swarm", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the MCP server over stdio.
    Mcp {
        /// Override the configured network for this session.
        #[arg(long, value_enum)]
        network: Option<CliNetwork>,

        /// Use this Solana RPC endpoint instead of the network default (no fallbacks).
        #[arg(long)]
        rpc_url: Option<String>,

        /// Start with the cached token directory instead of fetching the verified list.
        #[arg(long, default_value_t = false)]
        skip_token_refresh: bool,
    },

    /// Fetch the verified token list into the local token directory.
    RefreshTokens,

    /// Print resolved paths (useful for debugging).
    Paths,
}

fn init_logging(paths: &paths::SwarmPaths) -> tracing_appender::non_blocking::WorkerGuard {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();
    let file_name = paths
        .log_file
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("solana-swarm.log.jsonl");
    let file_appender = tracing_appender::rolling::never(&paths.data_dir, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_filter(env_filter.clone());
    let file_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(file_writer)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

fn print_json(v: &serde_json::Value) -> eyre::Result<()> {
    let s = serde_json::to_string(v).context("serialize output")?;
    writeln!(std::io::stdout().lock(), "{s}").context("write output")?;
    Ok(())
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let paths = paths::SwarmPaths::discover()?;
    paths.ensure_private_dirs()?;
    let _log_guard = init_logging(&paths);

    match cli.cmd {
        Command::Mcp {
            network,
            rpc_url,
            skip_token_refresh,
        } => {
            let mut cfg = store::ConfigStore::new(&paths).load_or_init_default()?;
            if let Some(n) = network {
                cfg.network = n.into();
            }
            if let Some(u) = rpc_url.filter(|u| !u.trim().is_empty()) {
                cfg.rpc.solana_rpc_url = Some(u.trim().to_owned());
            }
            if cfg.market_data_key_missing() {
                tracing::warn!("market data API key not configured");
                cli_output::warn_missing_market_key();
            }
            cli_output::print_mcp_banner(
                env!("CARGO_PKG_VERSION"),
                cfg.network.as_str(),
                &cfg.effective_rpc_url(),
            );
            rpc::mcp_server::run(&paths, &cfg, !skip_token_refresh)
                .await
                .context("mcp server failed")
        }
        Command::RefreshTokens => {
            let cfg = store::ConfigStore::new(&paths).load_or_init_default()?;
            let db = db::Db::open(&paths).await?;
            let mut dir = tokens::TokenDirectory::load(&db).await?;
            let fetched = dir.refresh(&db, &cfg.http.token_list_url).await?;
            let stored = db.count_tokens().await?;
            print_json(&serde_json::json!({
              "fetched": fetched,
              "cached": dir.len(),
              "stored": stored,
            }))
        }
        Command::Paths => print_json(&serde_json::json!({
          "config_dir": paths.config_dir,
          "data_dir": paths.data_dir,
          "config_file": paths.config_file(),
          "db_file": paths.db_file,
          "log_file": paths.log_file,
        })),
    }
}
