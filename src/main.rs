use clap::Parser;
use log::{error, info};
use std::sync::Arc;

use balance_watch::blockchain::{BlockHandler, BlockProcessor, BlockScanner, RpcClient};
use balance_watch::config::AppConfig;
use balance_watch::logging::init_logging;
use balance_watch::sink::JsonLinesSink;

#[derive(Parser)]
#[command(name = "balance-watch")]
#[command(about = "Watches an EVM chain and prints balance change events as JSON lines")]
#[command(version = "0.1.0")]
struct Args {
    /// JSON-RPC endpoint (overrides config and CHAIN_RPC_URL)
    #[arg(long)]
    rpc_url: Option<String>,

    /// Seconds between scan cycles
    #[arg(long)]
    interval: Option<u64>,

    /// Maximum number of blocks fetched per cycle
    #[arg(long)]
    limit: Option<u64>,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.print_config {
        print!("{}", AppConfig::generate_sample_config()?);
        return Ok(());
    }

    let mut config = AppConfig::load()?;
    if let Some(rpc_url) = args.rpc_url {
        config.rpc.endpoint = rpc_url;
    }
    if let Some(interval) = args.interval {
        config.scanner.poll_interval_seconds = interval;
    }
    if let Some(limit) = args.limit {
        config.scanner.batch_limit = limit;
    }
    config.validate()?;

    init_logging(&config.logging)?;
    info!(
        "Starting balance watcher against {} (every {}s, up to {} blocks per cycle)",
        config.rpc.endpoint, config.scanner.poll_interval_seconds, config.scanner.batch_limit
    );

    let client = Arc::new(RpcClient::new_with_config(
        config.rpc.endpoint.clone(),
        config.rpc.timeout_seconds,
    )?);
    let processor: Arc<dyn BlockHandler> =
        Arc::new(BlockProcessor::new(Arc::clone(&client), JsonLinesSink::stdout()));
    let scanner = Arc::new(BlockScanner::new(client));

    let schedule = scanner.start(
        config.scanner.poll_interval_seconds,
        config.scanner.batch_limit,
        processor,
    );

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => error!("Unable to listen for shutdown signal: {}", e),
    }

    scanner.stop();
    if let Err(e) = schedule.await {
        error!("Scanner schedule ended abnormally: {}", e);
    }

    info!("Balance watcher stopped");
    Ok(())
}
