use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::gallery::{ListSettings, SortKey};
use crate::session::ViewMode;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GalleryConfig {
    /// Records per page
    #[serde(default = "GalleryConfig::default_page_size")]
    pub page_size: u32,
    /// Lifetime of a cached list page, in seconds
    #[serde(default = "GalleryConfig::default_list_cache_ttl_secs")]
    pub list_cache_ttl_secs: u64,
    /// Lifetime of cached tag statistics, in seconds
    #[serde(default = "GalleryConfig::default_tag_stats_cache_ttl_secs")]
    pub tag_stats_cache_ttl_secs: u64,
    /// Quiet period before a resize changes the column count
    #[serde(default = "GalleryConfig::default_resize_debounce_ms")]
    pub resize_debounce_ms: u64,
    /// Reload attempts for a failed preview image
    #[serde(default = "GalleryConfig::default_max_load_retries")]
    pub max_load_retries: u32,
    /// Ignore responses to list requests that have been superseded
    #[serde(default = "GalleryConfig::default_request_fencing")]
    pub request_fencing: bool,
    #[serde(default)]
    pub default_sort: SortKey,
    #[serde(default)]
    pub default_view: ViewMode,
    /// Blur strength applied to hidden sensitive previews
    #[serde(default = "GalleryConfig::default_blur_sigma")]
    pub blur_sigma: f32,
}

impl GalleryConfig {
    fn default_page_size() -> u32 {
        20
    }

    fn default_list_cache_ttl_secs() -> u64 {
        60
    }

    fn default_tag_stats_cache_ttl_secs() -> u64 {
        300
    }

    fn default_resize_debounce_ms() -> u64 {
        150
    }

    fn default_max_load_retries() -> u32 {
        crate::reveal::DEFAULT_MAX_RETRIES
    }

    fn default_request_fencing() -> bool {
        true
    }

    fn default_blur_sigma() -> f32 {
        12.0
    }

    pub fn list_settings(&self) -> ListSettings {
        ListSettings {
            list_ttl: Duration::from_secs(self.list_cache_ttl_secs),
            tag_stats_ttl: Duration::from_secs(self.tag_stats_cache_ttl_secs),
            request_fencing: self.request_fencing,
        }
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            page_size: Self::default_page_size(),
            list_cache_ttl_secs: Self::default_list_cache_ttl_secs(),
            tag_stats_cache_ttl_secs: Self::default_tag_stats_cache_ttl_secs(),
            resize_debounce_ms: Self::default_resize_debounce_ms(),
            max_load_retries: Self::default_max_load_retries(),
            request_fencing: Self::default_request_fencing(),
            default_sort: SortKey::default(),
            default_view: ViewMode::default(),
            blur_sigma: Self::default_blur_sigma(),
        }
    }
}
