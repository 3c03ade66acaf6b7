// src/models/mod.rs

//! Domain models for the fetcher.
//!
//! Configuration, the saved-search request template and the item
//! descriptors decoded from result pages.

mod config;
mod item;
mod search;

// Re-export all public types
pub use config::{AuthConfig, Config, PortalConfig, SearchConfig};
pub use item::{DownloadReference, ItemDescriptor};
pub use search::{
    PAGE_SIZE, PageQuery, PageType, Paging, QUERY_PARAM, SearchId, SearchRequest,
    build_page_query,
};
