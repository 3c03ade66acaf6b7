// src/pipeline/crawl.rs

//! Saved-search crawl.
//!
//! Pages are walked newest first. The portal sorts by arrival time, so the
//! first item already on disk means everything after it was fetched by an
//! earlier run and the crawl stops there.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{Config, SearchRequest, build_page_query};
use crate::services::{
    FetchOutcome, FormatFilter, ItemFetcher, Session, SessionEstablisher, decode,
};
use crate::storage::ItemStorage;
use crate::utils::http::PORTAL_PATH;

/// Run-time options, usually taken from the command line.
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Stop after this many items have been fetched
    pub limit: usize,

    /// Format filter, also used as the output file extension
    pub format: String,

    /// Pause between result pages
    pub pause: Duration,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            limit: 25,
            format: "xml".to_string(),
            pause: Duration::from_secs(5),
        }
    }
}

/// Why a crawl ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The record limit was reached
    MaxRecords,
    /// A result page had no items
    NoMoreRecords,
    /// An item was already on disk
    NoNewerRecords,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MaxRecords => "max number of records reached",
            Self::NoMoreRecords => "no more records found",
            Self::NoNewerRecords => "no newer records found",
        })
    }
}

/// Outcome of one page step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Stop(StopReason),
}

/// Mutable crawl state, threaded through every page step.
pub struct CrawlState {
    page_index: u32,
    pages_fetched: usize,
    records_fetched: usize,
    session: Session,
    fetched: HashSet<PathBuf>,
    files: Vec<PathBuf>,
}

impl CrawlState {
    pub fn new(session: Session) -> Self {
        Self {
            page_index: 0,
            pages_fetched: 0,
            records_fetched: 0,
            session,
            fetched: HashSet::new(),
            files: Vec::new(),
        }
    }

    /// 0-based index of the next page to fetch.
    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    pub fn records_fetched(&self) -> usize {
        self.records_fetched
    }
}

/// Summary of a crawl run.
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub records_fetched: usize,
    pub pages_fetched: usize,
    pub stop_reason: StopReason,
    /// Files written, in fetch order
    pub files: Vec<PathBuf>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Called with the path of every file as soon as it is stored.
type FetchedHook<'a> = Box<dyn Fn(&Path) + 'a>;

/// Drives the page/dispatch loop for one saved search.
pub struct Crawler<'a> {
    config: &'a Config,
    template: SearchRequest,
    options: CrawlOptions,
    filter: FormatFilter,
    storage: &'a dyn ItemStorage,
    on_fetched: Option<FetchedHook<'a>>,
}

impl<'a> Crawler<'a> {
    pub fn new(
        config: &'a Config,
        options: CrawlOptions,
        storage: &'a dyn ItemStorage,
    ) -> Result<Self> {
        let filter = FormatFilter::new(&options.format)?;
        Ok(Self {
            config,
            template: SearchRequest::saved_search(&config.search),
            options,
            filter,
            storage,
            on_fetched: None,
        })
    }

    /// Report each stored file as it is written, before the crawl ends.
    pub fn on_fetched(mut self, hook: impl Fn(&Path) + 'a) -> Self {
        self.on_fetched = Some(Box::new(hook));
        self
    }

    /// Log in and crawl until a stop condition is met.
    pub async fn crawl(&self) -> Result<CrawlReport> {
        log::info!("Logging in to {}", self.config.portal.base_url);
        let session = SessionEstablisher::new(&self.config.portal)?
            .establish(&self.config.auth)
            .await?;

        let report = self.run(session).await?;
        log::info!("Downloaded {} records", report.records_fetched);
        Ok(report)
    }

    /// Crawl until a stop condition is met.
    pub async fn run(&self, session: Session) -> Result<CrawlReport> {
        let started_at = Utc::now();
        let mut state = CrawlState::new(session);

        let stop_reason = loop {
            match self.crawl_page(&mut state).await? {
                Step::Stop(reason) => break reason,
                Step::Continue => {
                    if !self.options.pause.is_zero() {
                        log::info!("Sleeping for {} seconds", self.options.pause.as_secs());
                        tokio::time::sleep(self.options.pause).await;
                    }
                }
            }
        };
        log::info!("{}", capitalize(&stop_reason.to_string()));

        Ok(CrawlReport {
            records_fetched: state.records_fetched,
            pages_fetched: state.pages_fetched,
            stop_reason,
            files: state.files,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Fetch, decode and dispatch the page at `state.page_index`.
    pub async fn crawl_page(&self, state: &mut CrawlState) -> Result<Step> {
        if state.records_fetched >= self.options.limit {
            return Ok(Step::Stop(StopReason::MaxRecords));
        }

        log::info!("Fetching page {}", state.page_index + 1);
        let query = build_page_query(&self.template, state.page_index).to_query_pair()?;
        let client = state.session.client();
        let url = client.endpoint(PORTAL_PATH)?;
        let html = client.get_text("result_page", &url, &[query]).await?;
        state.pages_fetched += 1;

        let items = decode(&html);
        if items.is_empty() {
            return Ok(Step::Stop(StopReason::NoMoreRecords));
        }
        log::debug!("Page {} lists {} items", state.page_index + 1, items.len());

        let fetcher = ItemFetcher::new(self.storage, &self.filter);
        for item in &items {
            match fetcher.fetch(item, &state.session, &mut state.fetched).await? {
                FetchOutcome::Fetched(path) => {
                    if let Some(hook) = &self.on_fetched {
                        hook(&path);
                    }
                    state.records_fetched += 1;
                    state.files.push(path);
                    if state.records_fetched >= self.options.limit {
                        return Ok(Step::Stop(StopReason::MaxRecords));
                    }
                }
                FetchOutcome::AlreadyPresent(path) => {
                    log::debug!("{} already present", path.display());
                    return Ok(Step::Stop(StopReason::NoNewerRecords));
                }
                FetchOutcome::AlreadyFetched(_) | FetchOutcome::FormatMismatch => {}
            }
        }

        state.page_index += 1;
        Ok(Step::Continue)
    }
}

/// Log in and crawl the configured saved search into `storage`.
pub async fn run_crawler(
    config: &Config,
    options: CrawlOptions,
    storage: &dyn ItemStorage,
) -> Result<CrawlReport> {
    Crawler::new(config, options, storage)?.crawl().await
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
