//! Pipeline entry points.
//!
//! - `run_crawler`: Log in and fetch new items from the saved search

pub mod crawl;

pub use crawl::{CrawlOptions, CrawlReport, CrawlState, Crawler, Step, StopReason, run_crawler};
