pub mod error;
pub mod http;
pub mod models;

pub use error::{ApiError, ApiResult};
pub use http::HttpGalleryClient;
pub use models::{
    AssetItem, FavoritePage, LogDetail, LogPage, LogRecord, OutputGroup, RecordType, TagStats,
};

/// Filter and pagination parameters sent to the list endpoint.
///
/// Sorting is not part of the request; the server always returns newest
/// first and the page is re-sorted locally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRequest {
    pub page: u32,
    pub page_size: u32,
    pub search: Option<String>,
    pub record_type: Option<RecordType>,
    pub tool: Option<String>,
    pub model: Option<String>,
}

impl ListRequest {
    /// Query pairs in the order the server documents them, empty values omitted
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(6);
        if self.page > 0 {
            pairs.push(("page", self.page.to_string()));
        }
        if self.page_size > 0 {
            pairs.push(("page_size", self.page_size.to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        if let Some(record_type) = self.record_type {
            pairs.push(("log_type", record_type.as_query_value().to_string()));
        }
        if let Some(tool) = self.tool.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("tool", tool.to_string()));
        }
        if let Some(model) = self.model.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("model", model.to_string()));
        }
        pairs
    }
}

/// Remote store the gallery engine reads from and deletes against.
///
/// The engine is driven from a single task, so implementations are not
/// required to produce `Send` futures.
#[allow(async_fn_in_trait)]
pub trait GalleryApi {
    async fn list_logs(&self, request: &ListRequest) -> ApiResult<LogPage>;
    async fn get_log(&self, id: i64) -> ApiResult<LogDetail>;
    async fn delete_log(&self, id: i64) -> ApiResult<()>;
    async fn tag_stats(&self) -> ApiResult<TagStats>;
    async fn tag_tools(&self) -> ApiResult<Vec<String>>;
    async fn tag_models(&self) -> ApiResult<Vec<String>>;
    async fn favorites(&self, page: u32, page_size: u32) -> ApiResult<FavoritePage>;
    /// Raw bytes of a stored asset, routed through the server's download endpoint
    async fn download_asset(&self, storage_key: &str) -> ApiResult<Vec<u8>>;
    /// Raw bytes from an absolute URL (presigned CDN links for previews)
    async fn fetch_url(&self, url: &str) -> ApiResult<Vec<u8>>;
}
