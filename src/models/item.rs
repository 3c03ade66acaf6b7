//! Downloadable item descriptors.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

/// A downloadable item announced by a result page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDescriptor {
    /// Portal item identifier (`fid`, or `id` on older pages)
    pub id: String,

    /// Human-readable slug
    pub slug: String,

    /// Content type (`fmt`), e.g. "xml" or "pdf"
    pub format: String,

    /// Every field of the literal, forwarded to the download handler
    pub fields: BTreeMap<String, String>,
}

impl ItemDescriptor {
    /// Build a descriptor from a parsed literal.
    ///
    /// Returns `None` when the literal carries no item id or no format.
    pub fn from_literal(literal: Map<String, Value>) -> Option<Self> {
        let fields: BTreeMap<String, String> = literal
            .into_iter()
            .filter_map(|(key, value)| scalar_to_string(value).map(|v| (key, v)))
            .collect();

        let id = fields
            .get("fid")
            .or_else(|| fields.get("id"))
            .filter(|id| !id.is_empty())?
            .clone();
        let format = fields.get("fmt").filter(|f| !f.is_empty())?.clone();
        let slug = fields.get("slug").cloned().unwrap_or_default();

        Some(Self {
            id,
            slug,
            format,
            fields,
        })
    }

    /// Query pairs for the download-intent request.
    pub fn download_query(&self) -> Vec<(&str, &str)> {
        self.fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .chain(std::iter::once(("Action", "DoDownload")))
            .collect()
    }
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Server-issued reference to the binary body of an item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DownloadReference {
    #[serde(rename = "ClientRefId")]
    pub client_ref_id: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn literal(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn reads_portal_field_names() {
        let item = ItemDescriptor::from_literal(literal(json!({
            "fid": "abc123", "slug": "OLY-Skating", "fmt": "xml", "pid": 7
        })))
        .unwrap();
        assert_eq!(item.id, "abc123");
        assert_eq!(item.slug, "OLY-Skating");
        assert_eq!(item.format, "xml");
        assert_eq!(item.fields.get("pid").map(String::as_str), Some("7"));
    }

    #[test]
    fn falls_back_to_id_key() {
        let item = ItemDescriptor::from_literal(literal(json!({
            "id": "X1", "slug": "a-b", "fmt": "xml"
        })))
        .unwrap();
        assert_eq!(item.id, "X1");
    }

    #[test]
    fn rejects_literal_without_format() {
        assert!(ItemDescriptor::from_literal(literal(json!({ "fid": "X1" }))).is_none());
    }

    #[test]
    fn download_query_appends_action() {
        let item = ItemDescriptor::from_literal(literal(json!({
            "fid": "X1", "fmt": "xml"
        })))
        .unwrap();
        let query = item.download_query();
        assert!(query.contains(&("fid", "X1")));
        assert_eq!(query.last(), Some(&("Action", "DoDownload")));
    }

    #[test]
    fn parses_download_reference() {
        let reference: DownloadReference =
            serde_json::from_str(r#"{"ClientRefId":"dl/X1.xml","Size":12}"#).unwrap();
        assert_eq!(reference.client_ref_id, "dl/X1.xml");
    }
}
