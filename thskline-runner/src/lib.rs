//! THS k-line runner: crawl configuration and the fetch orchestrator.
//!
//! This crate builds on `thskline-core` to provide:
//! - `CrawlConfig`, loaded from TOML with defaults for every field
//! - The bounded parallel crawl over the stock lists, with a shared throttle

pub mod config;
pub mod crawl;

pub use config::{ConfigError, CrawlConfig};
pub use crawl::{crawl, run_crawl, CrawlCounts, CrawlError, CrawlSummary};
