//! Wire types returned by the gallery REST API.
//!
//! The server is loose about a few fields (arrays may come back as `null`,
//! timestamps may lack an offset, the sensitive flag is sometimes a string),
//! so the deserializers here normalize those shapes once at the boundary.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of generation that produced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum RecordType {
    #[serde(rename = "txt2img")]
    TextToImage,
    #[serde(rename = "img2img")]
    ImageToImage,
}

impl RecordType {
    /// Value used for the `log_type` query parameter
    pub fn as_query_value(&self) -> &'static str {
        match self {
            RecordType::TextToImage => "txt2img",
            RecordType::ImageToImage => "img2img",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "txt2img" | "text-to-image" | "t2i" => Some(RecordType::TextToImage),
            "img2img" | "image-to-image" | "i2i" => Some(RecordType::ImageToImage),
            _ => None,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::TextToImage => write!(f, "text-to-image"),
            RecordType::ImageToImage => write!(f, "image-to-image"),
        }
    }
}

/// One archived generation event as it appears in list responses
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LogRecord {
    pub id: i64,
    pub title: String,
    #[serde(rename = "log_type")]
    pub record_type: RecordType,
    #[serde(rename = "tools", default, deserialize_with = "null_as_default")]
    pub tool_names: Vec<String>,
    #[serde(rename = "models", default, deserialize_with = "null_as_default")]
    pub model_names: Vec<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub preview_urls: Vec<String>,
    #[serde(rename = "output_count", default, deserialize_with = "null_as_default")]
    pub output_asset_count: u32,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "is_nsfw", default, deserialize_with = "deserialize_flag")]
    pub is_sensitive: bool,
}

/// A stored image belonging to a record
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AssetItem {
    pub id: i64,
    #[serde(rename = "file_key")]
    pub storage_key: String,
    pub url: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

/// Output images sharing one tool/model combination.
///
/// A `None` id marks a legacy record created before grouping existed.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OutputGroup {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "tools", default, deserialize_with = "null_as_default")]
    pub tool_names: Vec<String>,
    #[serde(rename = "models", default, deserialize_with = "null_as_default")]
    pub model_names: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub assets: Vec<AssetItem>,
}

impl OutputGroup {
    pub fn is_legacy(&self) -> bool {
        self.id.is_none()
    }
}

/// Full record returned by `GET /logs/{id}`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LogDetail {
    pub id: i64,
    pub title: String,
    #[serde(rename = "log_type")]
    pub record_type: RecordType,
    #[serde(rename = "tools", default, deserialize_with = "null_as_default")]
    pub tool_names: Vec<String>,
    #[serde(rename = "models", default, deserialize_with = "null_as_default")]
    pub model_names: Vec<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub params_note: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub input_assets: Vec<AssetItem>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub output_assets: Vec<AssetItem>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub output_groups: Vec<OutputGroup>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "is_nsfw", default, deserialize_with = "deserialize_flag")]
    pub is_sensitive: bool,
}

impl LogDetail {
    /// Output groups, falling back to a single legacy group built from the
    /// flat asset list when the server sent no grouping.
    pub fn resolved_groups(&self) -> Vec<OutputGroup> {
        if !self.output_groups.is_empty() {
            return self.output_groups.clone();
        }
        if self.output_assets.is_empty() {
            return Vec::new();
        }
        vec![OutputGroup {
            id: None,
            tool_names: self.tool_names.clone(),
            model_names: self.model_names.clone(),
            assets: self.output_assets.clone(),
        }]
    }

    /// Every output asset in display order (group order, then `sort_order`)
    pub fn ordered_output_assets(&self) -> Vec<AssetItem> {
        self.resolved_groups()
            .into_iter()
            .flat_map(|group| {
                let mut assets = group.assets;
                assets.sort_by_key(|a| a.sort_order);
                assets
            })
            .collect()
    }
}

/// Page of records from `GET /logs/`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LogPage {
    pub items: Vec<LogRecord>,
    pub total: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
}

/// Tag usage counts from `GET /tags/stats`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TagStats {
    #[serde(default)]
    pub tools: BTreeMap<String, u64>,
    #[serde(default)]
    pub models: BTreeMap<String, u64>,
}

impl TagStats {
    /// Tags ordered by descending count, then name
    pub fn ranked(counts: &BTreeMap<String, u64>) -> Vec<(&str, u64)> {
        let mut ranked: Vec<(&str, u64)> = counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }
}

/// One entry of `GET /favorites/`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FavoriteEntry {
    pub id: i64,
    pub log_id: i64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    pub log: LogRecord,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FavoritePage {
    #[serde(default)]
    pub data: Vec<FavoriteEntry>,
    pub total: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts RFC 3339 timestamps as well as naive `isoformat()` output (assumed UTC)
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// The sensitive flag arrives as a bool, a `"true"`/`"false"` string, or null
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(value)) => value,
        Some(Flag::Text(text)) => text.eq_ignore_ascii_case("true"),
        None => false,
    })
}
