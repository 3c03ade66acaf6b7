//! Storage abstractions for fetched items.
//!
//! Every item lands in one flat directory:
//!
//! ```text
//! {destination}/
//! ├── {id}.{ext}          # one file per fetched item
//! └── {id}.{ext}.part     # only while a write is in flight
//! ```
//!
//! A file's presence is the only record that an item was fetched; nothing
//! else is persisted between runs.

pub mod local;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Result;

// Re-export for convenience
pub use local::LocalStorage;

/// Trait for item storage backends.
#[async_trait]
pub trait ItemStorage: Send + Sync {
    /// Where the item with `id` is (or would be) stored.
    fn path_for(&self, id: &str) -> PathBuf;

    /// Whether the item with `id` has already been stored.
    async fn contains(&self, id: &str) -> Result<bool>;

    /// Store the body of an item and return its path.
    async fn store(&self, id: &str, body: &[u8]) -> Result<PathBuf>;
}
