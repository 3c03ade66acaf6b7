// src/models/search.rs

//! Saved-search request template and per-page query construction.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::SearchConfig;

/// Results per page. Fixed by the portal.
pub const PAGE_SIZE: u32 = 10;

/// Query parameter that carries the serialized search.
pub const QUERY_PARAM: &str = "jsp";

/// Identifier of a saved search, numeric or textual depending on the portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchId {
    Numeric(i64),
    Named(String),
}

impl fmt::Display for SearchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(id) => write!(f, "{id}"),
            Self::Named(id) => f.write_str(id),
        }
    }
}

/// Search parameters that stay fixed for the life of a crawl.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SearchRequest {
    pub filter_list: String,
    pub entitlements: Option<String>,
    pub outings: Option<String>,
    pub match_references: Vec<String>,
    pub dont_match_references: Vec<String>,
    #[serde(rename = "SelectedTopicID")]
    pub selected_topic_id: i64,
    pub links: String,
    pub fields: String,
    pub rows: u32,
    pub media_type: String,
    pub use_photo_archive: bool,
    pub use_press_releases: bool,
    pub use_extended_entitlements: bool,
    pub use_match_ref: bool,
    pub search_interval: String,
    pub profile: String,
    pub within_items: Vec<String>,
    pub get_counts: bool,
    pub sort_by: String,
    pub dah_start_state: Option<String>,
    pub is_pre_published: bool,
    pub allow_all_related_media: bool,
    pub is_member_content_search: bool,
    pub search_command: String,
    #[serde(rename = "ParentTopicID")]
    pub parent_topic_id: i64,
    #[serde(rename = "SearchOwnerID")]
    pub search_owner_id: i64,
    #[serde(rename = "APQLFilterList")]
    pub apql_filter_list: String,
    pub is_market_place_topic_search: bool,
    pub search_type: String,
    pub search_item: String,
    pub search_name: String,
    pub search_id: SearchId,
}

impl SearchRequest {
    /// Build the template for a saved search, newest arrivals first.
    pub fn saved_search(search: &SearchConfig) -> Self {
        Self {
            filter_list: String::new(),
            entitlements: None,
            outings: None,
            match_references: Vec::new(),
            dont_match_references: Vec::new(),
            selected_topic_id: 0,
            links: String::new(),
            fields: "date,time,headline,slug".to_string(),
            rows: PAGE_SIZE,
            media_type: "Text".to_string(),
            use_photo_archive: false,
            use_press_releases: false,
            use_extended_entitlements: false,
            use_match_ref: false,
            search_interval: "TwoWeeks".to_string(),
            profile: String::new(),
            within_items: Vec::new(),
            get_counts: false,
            sort_by: "arrivaldatetime:numberdecreasing".to_string(),
            dah_start_state: None,
            is_pre_published: false,
            allow_all_related_media: false,
            is_member_content_search: false,
            search_command: "OR".to_string(),
            parent_topic_id: -1,
            search_owner_id: -1,
            apql_filter_list: String::new(),
            is_market_place_topic_search: false,
            search_type: "SavedSearch".to_string(),
            search_item: String::new(),
            search_name: search.name.clone(),
            search_id: search.id.clone(),
        }
    }
}

/// Which result page the portal should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageType {
    First,
    Next,
}

/// Pagination fields, rebuilt from scratch for every page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Paging {
    pub page_type: PageType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_record: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page: Option<u32>,
}

impl Paging {
    /// Pagination for the 0-based `page_index`.
    pub fn for_page(page_index: u32) -> Self {
        if page_index == 0 {
            return Self {
                page_type: PageType::First,
                start_record: None,
                page: None,
                next_page: None,
            };
        }

        Self {
            page_type: PageType::Next,
            start_record: Some(page_index * PAGE_SIZE + 1),
            page: Some(page_index + 1),
            next_page: Some(1),
        }
    }
}

/// Query payload for one result page.
#[derive(Debug, Clone, Serialize)]
pub struct PageQuery<'a> {
    #[serde(flatten)]
    search: &'a SearchRequest,
    #[serde(flatten)]
    paging: Paging,
}

impl PageQuery<'_> {
    /// Serialize into the `(name, value)` query pair the portal expects.
    pub fn to_query_pair(&self) -> Result<(&'static str, String)> {
        Ok((QUERY_PARAM, serde_json::to_string(self)?))
    }
}

/// Build the query for the 0-based `page_index` of a saved search.
pub fn build_page_query(template: &SearchRequest, page_index: u32) -> PageQuery<'_> {
    PageQuery {
        search: template,
        paging: Paging::for_page(page_index),
    }
}
