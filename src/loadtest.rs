//! Concurrent load tester for the roast client
//!
//! Runs a fixed number of workers on the current task. Workers share one
//! remaining-request counter and keep issuing `get_random_roast` calls until
//! it is exhausted. Network traffic is measured through a
//! [`CountingTransport`] that the caller wires into the client.

use futures::future::join_all;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::warn;

use crate::client::{pick_random_index, RoastClient};
use crate::data::RoastOptions;
use crate::transport::CountingTransport;

/// Default number of logical requests
pub const DEFAULT_TOTAL_REQUESTS: usize = 1000;

/// Default number of concurrent workers
pub const DEFAULT_CONCURRENCY: usize = 50;

/// Load test parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTestConfig {
    pub total_requests: usize,
    pub concurrency: usize,
    /// Languages drawn uniformly per request; empty means the client default
    pub languages: Vec<String>,
}

impl Default for LoadTestConfig {
    fn default() -> Self {
        Self {
            total_requests: DEFAULT_TOTAL_REQUESTS,
            concurrency: DEFAULT_CONCURRENCY,
            languages: vec!["en".to_string(), "bn".to_string()],
        }
    }
}

/// What a single worker did
#[derive(Debug, Default)]
struct WorkerStats {
    requests: usize,
    errors: usize,
    latencies: Vec<Duration>,
}

/// Aggregated results of a load test run
#[derive(Debug, Clone)]
pub struct LoadTestReport {
    pub total_requests: usize,
    pub elapsed: Duration,
    /// Latencies of successful requests, ascending
    pub latencies: Vec<Duration>,
    pub errors: usize,
    /// Requests that reached the transport
    pub network_requests: usize,
    /// Requests issued by each worker, in spawn order
    pub worker_requests: Vec<usize>,
}

/// Nearest-rank percentile of an ascending slice: element `floor(n * p)`
///
/// Returns zero when the index is out of range (including an empty slice).
pub fn percentile(sorted: &[Duration], p: f64) -> Duration {
    let idx = (sorted.len() as f64 * p).floor() as usize;
    sorted.get(idx).copied().unwrap_or_default()
}

impl LoadTestReport {
    pub fn successes(&self) -> usize {
        self.total_requests.saturating_sub(self.errors)
    }

    pub fn requests_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total_requests as f64 / secs
        } else {
            0.0
        }
    }

    /// Percentage of requests that succeeded
    pub fn success_rate(&self) -> f64 {
        ratio_percent(self.successes(), self.total_requests)
    }

    pub fn average_latency(&self) -> Duration {
        if self.latencies.is_empty() {
            return Duration::ZERO;
        }
        self.latencies.iter().sum::<Duration>() / self.latencies.len() as u32
    }

    pub fn p95(&self) -> Duration {
        percentile(&self.latencies, 0.95)
    }

    pub fn p99(&self) -> Duration {
        percentile(&self.latencies, 0.99)
    }

    /// Logical requests that did not reach the network
    pub fn cache_hits(&self) -> usize {
        self.total_requests.saturating_sub(self.network_requests)
    }

    /// Percentage of logical requests served without a network call
    pub fn cache_efficiency(&self) -> f64 {
        ratio_percent(self.cache_hits(), self.total_requests)
    }
}

fn ratio_percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

impl fmt::Display for LoadTestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-------------------------------------------";
        writeln!(f, "{}", rule)?;
        writeln!(f, "LOAD TEST RESULTS (INSTRUMENTED)")?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "Total Time:       {:.2}s", self.elapsed.as_secs_f64())?;
        writeln!(f, "Requests/sec:     {:.2}", self.requests_per_sec())?;
        writeln!(f, "Success Rate:     {:.2}%", self.success_rate())?;
        writeln!(f, "Avg Latency:      {:.2}ms", millis(self.average_latency()))?;
        writeln!(f, "P95 Latency:      {}ms", self.p95().as_millis())?;
        writeln!(f, "P99 Latency:      {}ms", self.p99().as_millis())?;
        writeln!(f, "Network Requests: {}", self.network_requests)?;
        writeln!(f, "Cache Hits:       {}", self.cache_hits())?;
        writeln!(f, "Cache Efficiency: {:.2}%", self.cache_efficiency())?;
        writeln!(f, "Total Errors:     {}", self.errors)?;
        write!(f, "{}", rule)
    }
}

/// Takes one request from the shared budget; false once it is exhausted
fn claim(remaining: &AtomicUsize) -> bool {
    remaining
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

async fn worker(client: &RoastClient, remaining: &AtomicUsize, languages: &[String]) -> WorkerStats {
    let mut stats = WorkerStats::default();

    while claim(remaining) {
        stats.requests += 1;

        let mut options = RoastOptions::new();
        if let Some(idx) = pick_random_index(languages.len()) {
            options = options.lang(languages[idx].clone());
        }

        let start = Instant::now();
        match client.get_random_roast(&options).await {
            Ok(_) => stats.latencies.push(start.elapsed()),
            Err(e) => {
                stats.errors += 1;
                warn!(error = %e, "request failed");
            }
        }
    }

    stats
}

/// Runs the load test and aggregates the results
///
/// `counter` must be the transport the client was built with; it is reset
/// before the run starts.
pub async fn run_load_test(
    client: &RoastClient,
    counter: &CountingTransport,
    config: &LoadTestConfig,
) -> LoadTestReport {
    counter.reset();
    let remaining = AtomicUsize::new(config.total_requests);
    let concurrency = config.concurrency.max(1);
    let start = Instant::now();

    let workers = (0..concurrency).map(|_| worker(client, &remaining, &config.languages));
    let results = join_all(workers).await;

    let elapsed = start.elapsed();
    let mut latencies = Vec::with_capacity(config.total_requests);
    let mut errors = 0;
    let mut worker_requests = Vec::with_capacity(results.len());
    for stats in results {
        worker_requests.push(stats.requests);
        errors += stats.errors;
        latencies.extend(stats.latencies);
    }
    latencies.sort();

    LoadTestReport {
        total_requests: config.total_requests,
        elapsed,
        latencies,
        errors,
        network_requests: counter.count(),
        worker_requests,
    }
}
