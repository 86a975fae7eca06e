//! Command-line interface parsing for the load tester
//!
//! Both arguments are positional and optional. Values that are missing, not a
//! positive integer, or zero fall back to the defaults instead of failing.
//! Hyphenated values such as `-5` are taken as values, and extra arguments
//! are ignored.

use clap::Parser;

use crate::loadtest::{LoadTestConfig, DEFAULT_CONCURRENCY, DEFAULT_TOTAL_REQUESTS};

/// RaaS load tester - hammer the roast API and report latency and cache efficiency
#[derive(Parser, Debug)]
#[command(name = "raas-loadtest")]
#[command(about = "Load test the Roast-as-a-Service client")]
#[command(version)]
pub struct Cli {
    /// Total number of roast requests to issue (default 1000)
    #[arg(value_name = "TOTAL_REQUESTS", allow_hyphen_values = true)]
    pub total_requests: Option<String>,

    /// Number of concurrent workers (default 50)
    #[arg(value_name = "CONCURRENCY", allow_hyphen_values = true)]
    pub concurrency: Option<String>,

    /// Anything after the two counts
    #[arg(hide = true, allow_hyphen_values = true)]
    pub extra: Vec<String>,
}

/// Parses a positive count, returning `None` for anything else
pub fn parse_count(s: &str) -> Option<usize> {
    s.trim().parse::<usize>().ok().filter(|&n| n > 0)
}

impl LoadTestConfig {
    /// Creates a LoadTestConfig from parsed CLI arguments.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            total_requests: cli
                .total_requests
                .as_deref()
                .and_then(parse_count)
                .unwrap_or(DEFAULT_TOTAL_REQUESTS),
            concurrency: cli
                .concurrency
                .as_deref()
                .and_then(parse_count)
                .unwrap_or(DEFAULT_CONCURRENCY),
            ..Self::default()
        }
    }
}
