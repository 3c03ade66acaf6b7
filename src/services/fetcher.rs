// src/services/fetcher.rs

//! Item fetch pipeline.
//!
//! Downloading an item is a two step exchange: the download handler turns
//! the descriptor into a `ClientRefId`, and the content is then fetched from
//! that reference.

use std::collections::HashSet;
use std::path::PathBuf;

use regex::{Regex, RegexBuilder};
use reqwest::header::{CONTENT_TYPE, HeaderValue};

use crate::error::{AppError, Result};
use crate::models::{DownloadReference, ItemDescriptor};
use crate::services::Session;
use crate::storage::ItemStorage;
use crate::utils::http::{CONTENT_BASE_PATH, DOWNLOAD_HANDLER_PATH};

/// What happened to a single descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The item's format does not match the filter.
    FormatMismatch,
    /// The item was already written earlier in this run.
    AlreadyFetched(PathBuf),
    /// The item was on disk before this run started.
    AlreadyPresent(PathBuf),
    /// The item was downloaded and stored.
    Fetched(PathBuf),
}

/// Case-insensitive match of an item format against the configured filter.
///
/// The filter is a regular expression matched at the start of the format.
#[derive(Debug, Clone)]
pub struct FormatFilter {
    pattern: Regex,
}

impl FormatFilter {
    pub fn new(filter: &str) -> Result<Self> {
        let pattern = RegexBuilder::new(&format!("^(?:{filter})"))
            .case_insensitive(true)
            .build()?;
        Ok(Self { pattern })
    }

    pub fn matches(&self, format: &str) -> bool {
        self.pattern.is_match(format)
    }
}

/// Fetches items into storage.
pub struct ItemFetcher<'a> {
    storage: &'a dyn ItemStorage,
    filter: &'a FormatFilter,
}

impl<'a> ItemFetcher<'a> {
    pub fn new(storage: &'a dyn ItemStorage, filter: &'a FormatFilter) -> Self {
        Self { storage, filter }
    }

    /// Decide what to do with one descriptor and do it.
    ///
    /// `fetched` holds the paths written earlier in this run; a successful
    /// fetch adds to it.
    pub async fn fetch(
        &self,
        item: &ItemDescriptor,
        session: &Session,
        fetched: &mut HashSet<PathBuf>,
    ) -> Result<FetchOutcome> {
        if !self.filter.matches(&item.format) {
            log::trace!("Skipping {} ({} format)", item.id, item.format);
            return Ok(FetchOutcome::FormatMismatch);
        }

        let path = self.storage.path_for(&item.id);
        if fetched.contains(&path) {
            return Ok(FetchOutcome::AlreadyFetched(path));
        }
        if self.storage.contains(&item.id).await? {
            return Ok(FetchOutcome::AlreadyPresent(path));
        }

        log::debug!("Fetching \"{}\"", item.slug);
        let reference = self.resolve_reference(item, session).await?;
        let body = self.download(&reference, session).await?;
        let path = self.storage.store(&item.id, &body).await?;

        fetched.insert(path.clone());
        Ok(FetchOutcome::Fetched(path))
    }

    /// Ask the download handler for the item's `ClientRefId`.
    async fn resolve_reference(
        &self,
        item: &ItemDescriptor,
        session: &Session,
    ) -> Result<DownloadReference> {
        let client = session.client();
        let url = client.endpoint(DOWNLOAD_HANDLER_PATH)?;
        let query = item.download_query();

        let response = client
            .send("download_intent", |http| {
                http.get(url.clone())
                    .query(&query)
                    .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            })
            .await?;
        let body = response
            .text()
            .await
            .map_err(|e| AppError::transport("download_intent", e))?;

        let reference: DownloadReference = serde_json::from_str(&body)
            .map_err(|e| AppError::download(&item.id, format!("no ClientRefId: {e}")))?;
        if reference.client_ref_id.trim().is_empty() {
            return Err(AppError::download(&item.id, "empty ClientRefId"));
        }
        Ok(reference)
    }

    async fn download(&self, reference: &DownloadReference, session: &Session) -> Result<Vec<u8>> {
        let client = session.client();
        let url = client
            .endpoint(CONTENT_BASE_PATH)?
            .join(&reference.client_ref_id)?;
        client.get_bytes("download_content", &url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_is_case_insensitive() {
        let filter = FormatFilter::new("xml").unwrap();
        assert!(filter.matches("xml"));
        assert!(filter.matches("XML"));
        assert!(!filter.matches("pdf"));
    }

    #[test]
    fn filter_matches_at_start_only() {
        let filter = FormatFilter::new("xml").unwrap();
        assert!(filter.matches("xml-nitf"));
        assert!(!filter.matches("newsml"));
    }

    #[test]
    fn filter_accepts_alternatives() {
        let filter = FormatFilter::new("xml|txt").unwrap();
        assert!(filter.matches("TXT"));
        assert!(filter.matches("xml"));
        assert!(!filter.matches("jpg"));
    }

    #[test]
    fn invalid_filter_is_rejected() {
        assert!(matches!(FormatFilter::new("xml("), Err(AppError::Regex(_))));
    }
}
