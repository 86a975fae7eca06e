//! RaaS load tester - drive the roast client with concurrent workers
//!
//! Prints a fixed-format report to stdout. Logs go to stderr and are
//! controlled with `RUST_LOG` (default `warn`).

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use raas::cache::ShardCache;
use raas::cli::Cli;
use raas::loadtest::{run_load_test, LoadTestConfig};
use raas::transport::{CountingTransport, HttpTransport};
use raas::{ClientConfig, RoastClient};

/// Installs a stderr log subscriber honouring `RUST_LOG`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    let config = LoadTestConfig::from_cli(&cli);
    let client_config = ClientConfig::from_env();

    // The counting decorator sits between client and network for this run only
    let http = HttpTransport::new(client_config.request_timeout)?;
    let counter = CountingTransport::new(Arc::new(http));
    let cache = ShardCache::detect(&client_config.base_url, client_config.cache_ttl);
    let client = RoastClient::with_parts(client_config, Arc::new(counter.clone()), cache);

    println!(
        "Starting Load Test: {} total requests, Concurrency: {}\n",
        config.total_requests, config.concurrency
    );

    let report = run_load_test(&client, &counter, &config).await;
    println!("{}", report);

    Ok(())
}
