// src/services/decoder.rs

//! Result page decoder.
//!
//! Result pages do not link to content directly. Each downloadable item is an
//! anchor whose click handler calls the portal's download manager with an
//! object literal, e.g.
//!
//! ```text
//! <a onclick="DownloadManager.DoDownload({'fid':'a1b2','slug':'OLY-Skating','fmt':'xml'}); return false;">
//! ```
//!
//! The literal uses single quotes, so it is normalised before being parsed as
//! JSON. Anything that does not fit this shape is skipped.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::{Map, Value};

use crate::models::ItemDescriptor;

static TRIGGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"DownloadManager\.DoDownload").expect("valid trigger pattern"));

static LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((?P<json>\{.*?\})\);").expect("valid literal pattern"));

static ANCHORS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[onclick]").expect("valid anchor selector"));

/// Extract item descriptors from a result page, in document order.
///
/// An empty result means the search has no more pages.
pub fn decode(page_html: &str) -> Vec<ItemDescriptor> {
    let document = Html::parse_document(page_html);

    document
        .select(&ANCHORS)
        .filter_map(|anchor| anchor.value().attr("onclick"))
        .filter(|handler| TRIGGER.is_match(handler))
        .filter_map(|handler| {
            let descriptor = parse_handler(handler);
            if descriptor.is_none() {
                log::trace!("Skipping unparseable download handler: {handler}");
            }
            descriptor
        })
        .collect()
}

/// Parse the object literal passed by a single click handler.
pub fn parse_handler(handler: &str) -> Option<ItemDescriptor> {
    let literal = LITERAL.captures(handler)?.name("json")?.as_str();
    let normalized = normalize_quotes(literal);
    let object: Map<String, Value> = serde_json::from_str(&normalized).ok()?;
    ItemDescriptor::from_literal(object)
}

/// Turn a single-quoted object literal into JSON.
///
/// Single quotes become double quotes; double quotes that were already
/// inside single-quoted strings are escaped so they stay literal, and
/// escaped apostrophes lose their backslash.
fn normalize_quotes(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    let mut in_single = false;
    let mut in_double = false;
    let mut escaped = false;

    for c in literal.chars() {
        if escaped {
            if c == '\'' {
                // `\'` is not a JSON escape; the apostrophe needs none.
                out.pop();
            }
            out.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' => {
                out.push(c);
                escaped = true;
            }
            '\'' if !in_double => {
                in_single = !in_single;
                out.push('"');
            }
            '"' if in_single => out.push_str("\\\""),
            '"' => {
                in_double = !in_double;
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(handler: &str) -> String {
        format!(r##"<a href="#" onclick="{handler}">Download</a>"##)
    }

    #[test]
    fn decodes_single_quoted_literal() {
        let html = anchor(
            "DownloadManager.DoDownload({'id': 'X1', 'slug': 'a-b', 'fmt': 'xml'}); return false;",
        );
        let items = decode(&html);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "X1");
        assert_eq!(items[0].slug, "a-b");
        assert_eq!(items[0].format, "xml");
    }

    #[test]
    fn keeps_document_order() {
        let html = [
            anchor("DownloadManager.DoDownload({'fid':'A','slug':'one','fmt':'xml'});"),
            anchor("DownloadManager.DoDownload({'fid':'B','slug':'two','fmt':'pdf'});"),
            anchor("DownloadManager.DoDownload({'fid':'C','slug':'three','fmt':'xml'});"),
        ]
        .concat();
        let ids: Vec<_> = decode(&html).into_iter().map(|i| i.id).collect();
        assert_eq!(ids, ["A", "B", "C"]);
    }

    #[test]
    fn ignores_other_click_handlers() {
        let html = [
            anchor("Preview.Open({'fid':'A','fmt':'xml'});"),
            r#"<a href="/pages/help.aspx">Help</a>"#.to_string(),
            anchor("DownloadManager.DoDownload({'fid':'B','slug':'two','fmt':'xml'});"),
        ]
        .concat();
        let items = decode(&html);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "B");
    }

    #[test]
    fn skips_malformed_literals() {
        let html = [
            anchor("DownloadManager.DoDownload({'fid':'A','fmt':});"),
            anchor("DownloadManager.DoDownload('A', 'xml');"),
            anchor("DownloadManager.DoDownload({'slug':'no-id','fmt':'xml'});"),
        ]
        .concat();
        assert!(decode(&html).is_empty());
    }

    #[test]
    fn page_without_items_decodes_empty() {
        assert!(decode("<html><body><p>No results</p></body></html>").is_empty());
    }

    #[test]
    fn escapes_double_quotes_inside_single_quoted_values() {
        let item = parse_handler(
            r#"DownloadManager.DoDownload({'fid':'Q1','slug':'the "big" game','fmt':'xml'});"#,
        )
        .unwrap();
        assert_eq!(item.slug, r#"the "big" game"#);
    }

    #[test]
    fn keeps_escaped_apostrophes_inside_values() {
        let item = parse_handler(
            r"DownloadManager.DoDownload({'fid':'Q2','slug':'O\'Brien wins','fmt':'xml'});",
        )
        .unwrap();
        assert_eq!(item.id, "Q2");
        assert_eq!(item.slug, "O'Brien wins");
    }

    #[test]
    fn other_escapes_are_left_to_json() {
        let item = parse_handler(
            r"DownloadManager.DoDownload({'fid':'Q3','slug':'a\\b\u00e9','fmt':'xml'});",
        )
        .unwrap();
        assert_eq!(item.slug, "a\\b\u{e9}");
    }

    #[test]
    fn accepts_already_double_quoted_literal() {
        let item =
            parse_handler(r#"DownloadManager.DoDownload({"fid":"D1","fmt":"xml"});"#).unwrap();
        assert_eq!(item.id, "D1");
        assert_eq!(item.slug, "");
    }
}
