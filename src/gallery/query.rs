//! Typed list query, cache-key derivation and client-side ordering.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::api::{ListRequest, LogRecord, RecordType};

/// Prefix shared by every cached list page
pub const LIST_CACHE_PREFIX: &str = "logs_";

/// Fixed key of the tag statistics entry, independent of any filter
pub const TAG_STATS_CACHE_KEY: &str = "tag_stats";

/// Client-side ordering applied to a fetched page
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    #[value(name = "time_desc")]
    TimeDesc,
    #[value(name = "time_asc")]
    TimeAsc,
    #[value(name = "title_asc")]
    TitleAsc,
    #[value(name = "title_desc")]
    TitleDesc,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::TimeDesc => "time_desc",
            SortKey::TimeAsc => "time_asc",
            SortKey::TitleAsc => "title_asc",
            SortKey::TitleDesc => "title_desc",
        }
    }

    /// Next ordering in the cycle used by the sort key binding
    pub fn next(self) -> Self {
        match self {
            SortKey::TimeDesc => SortKey::TimeAsc,
            SortKey::TimeAsc => SortKey::TitleAsc,
            SortKey::TitleAsc => SortKey::TitleDesc,
            SortKey::TitleDesc => SortKey::TimeDesc,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortKey::TimeDesc => "Newest first",
            SortKey::TimeAsc => "Oldest first",
            SortKey::TitleAsc => "Title A-Z",
            SortKey::TitleDesc => "Title Z-A",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Compare titles the way a reader expects: case-insensitive first, then
/// by the raw string so distinct titles never compare equal.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Stable sort of one page. Records that compare equal keep their order.
pub fn sort_records(items: &mut [LogRecord], sort: SortKey) {
    match sort {
        SortKey::TimeDesc => items.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortKey::TimeAsc => items.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        SortKey::TitleAsc => items.sort_by(|a, b| compare_titles(&a.title, &b.title)),
        SortKey::TitleDesc => items.sort_by(|a, b| compare_titles(&b.title, &a.title)),
    }
}

/// Full description of one list view: pagination, filters and ordering
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListQuery {
    pub page: u32,
    pub page_size: u32,
    pub search: String,
    pub record_type: Option<RecordType>,
    pub tool: Option<String>,
    pub model: Option<String>,
    pub sort: SortKey,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
            search: String::new(),
            record_type: None,
            tool: None,
            model: None,
            sort: SortKey::default(),
        }
    }
}

impl ListQuery {
    pub fn with_page_size(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            ..Self::default()
        }
    }

    /// Deterministic cache key.
    ///
    /// Fields are serialized as sorted `name=value` pairs with escaped
    /// values, so the key does not depend on construction order and values
    /// containing separators cannot make two queries collide.
    pub fn cache_key(&self) -> String {
        let mut fields: BTreeMap<&str, String> = BTreeMap::new();
        fields.insert("page", self.page.to_string());
        fields.insert("page_size", self.page_size.to_string());
        fields.insert("search", self.search.trim().to_string());
        fields.insert(
            "type",
            self.record_type
                .map(|t| t.as_query_value().to_string())
                .unwrap_or_default(),
        );
        fields.insert("tool", self.tool.clone().unwrap_or_default());
        fields.insert("model", self.model.clone().unwrap_or_default());
        fields.insert("sort", self.sort.as_str().to_string());

        let body = fields
            .iter()
            .map(|(name, value)| format!("{}={}", name, escape_component(value)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}{}", LIST_CACHE_PREFIX, body)
    }

    /// Request for the list endpoint (sorting stays client-side)
    pub fn to_request(&self) -> ListRequest {
        let search = self.search.trim();
        ListRequest {
            page: self.page,
            page_size: self.page_size,
            search: (!search.is_empty()).then(|| search.to_string()),
            record_type: self.record_type,
            tool: self.tool.clone().filter(|t| !t.is_empty()),
            model: self.model.clone().filter(|m| !m.is_empty()),
        }
    }

    /// Number of pages for `total` records, at least one
    pub fn page_count(&self, total: u64) -> u32 {
        let size = u64::from(self.page_size.max(1));
        total.div_ceil(size).max(1) as u32
    }
}

/// Percent-escape the characters that delimit key components
fn escape_component(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '%' => escaped.push_str("%25"),
            '&' => escaped.push_str("%26"),
            '=' => escaped.push_str("%3D"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(id: i64, title: &str, minute: u32) -> LogRecord {
        LogRecord {
            id,
            title: title.to_string(),
            record_type: RecordType::TextToImage,
            tool_names: Vec::new(),
            model_names: Vec::new(),
            cover_url: None,
            preview_urls: Vec::new(),
            output_asset_count: 0,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 12, minute, 0).unwrap(),
            is_sensitive: false,
        }
    }

    fn ids(items: &[LogRecord]) -> Vec<i64> {
        items.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_identical_queries_share_a_key() {
        let a = ListQuery::default();
        let b = ListQuery {
            sort: SortKey::TimeDesc,
            ..ListQuery::default()
        };
        assert_eq!(a.cache_key(), b.cache_key());
        assert!(a.cache_key().starts_with(LIST_CACHE_PREFIX));
    }

    #[test]
    fn test_key_changes_with_every_field() {
        let base = ListQuery::default();
        let variants = [
            ListQuery { page: 2, ..base.clone() },
            ListQuery { page_size: 50, ..base.clone() },
            ListQuery { search: "cat".into(), ..base.clone() },
            ListQuery { record_type: Some(RecordType::ImageToImage), ..base.clone() },
            ListQuery { tool: Some("comfyui".into()), ..base.clone() },
            ListQuery { model: Some("flux".into()), ..base.clone() },
            ListQuery { sort: SortKey::TitleAsc, ..base.clone() },
        ];
        for variant in &variants {
            assert_ne!(variant.cache_key(), base.cache_key(), "{:?}", variant);
        }
    }

    #[test]
    fn test_separator_values_do_not_collide() {
        // Under naive concatenation these would produce the same key
        let a = ListQuery {
            tool: Some("a&model=b".into()),
            ..ListQuery::default()
        };
        let b = ListQuery {
            tool: Some("a".into()),
            model: Some("b".into()),
            ..ListQuery::default()
        };
        assert_ne!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_newest_first_is_stable_for_equal_timestamps() {
        let mut items = vec![record(1, "a", 5), record(2, "b", 5), record(3, "c", 9), record(4, "d", 5)];
        sort_records(&mut items, SortKey::TimeDesc);
        assert_eq!(ids(&items), vec![3, 1, 2, 4]);
    }

    #[test]
    fn test_title_orders() {
        let mut items = vec![record(1, "beta", 0), record(2, "Alpha", 0), record(3, "alpha", 0)];
        sort_records(&mut items, SortKey::TitleAsc);
        assert_eq!(ids(&items), vec![2, 3, 1]);

        sort_records(&mut items, SortKey::TitleDesc);
        assert_eq!(ids(&items), vec![1, 3, 2]);
    }

    #[test]
    fn test_oldest_first() {
        let mut items = vec![record(1, "a", 30), record(2, "b", 10), record(3, "c", 20)];
        sort_records(&mut items, SortKey::TimeAsc);
        assert_eq!(ids(&items), vec![2, 3, 1]);
    }

    #[test]
    fn test_request_drops_blank_filters() {
        let query = ListQuery {
            search: "   ".into(),
            tool: Some(String::new()),
            ..ListQuery::default()
        };
        let request = query.to_request();
        assert_eq!(request.search, None);
        assert_eq!(request.tool, None);
        assert_eq!(request.page, 1);
    }

    #[test]
    fn test_page_count() {
        let query = ListQuery::with_page_size(20);
        assert_eq!(query.page_count(0), 1);
        assert_eq!(query.page_count(20), 1);
        assert_eq!(query.page_count(21), 2);
    }

    #[test]
    fn test_sort_cycle_visits_all_orders() {
        let mut sort = SortKey::default();
        let mut seen = vec![sort];
        for _ in 0..3 {
            sort = sort.next();
            seen.push(sort);
        }
        assert_eq!(sort.next(), SortKey::TimeDesc);
        assert_eq!(seen.len(), 4);
    }
}
