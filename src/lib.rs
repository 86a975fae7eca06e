//! RaaS - Roast as a Service client
//!
//! Fetches random developer roasts from the static RaaS JSON API, with a
//! manifest cache, a time-boxed shard cache and optional intensity/length
//! filters. The `loadtest` module drives the client concurrently and reports
//! latency percentiles and cache efficiency.

pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod data;
pub mod error;
pub mod loadtest;
pub mod transport;

pub use client::RoastClient;
pub use config::ClientConfig;
pub use data::{Manifest, RandomRoast, Roast, RoastOptions, Shard};
pub use error::{RaasError, RaasResult};
