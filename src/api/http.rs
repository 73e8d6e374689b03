//! `reqwest` implementation of [`GalleryApi`].

use std::time::Duration;

use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;

use super::{ApiError, ApiResult, FavoritePage, GalleryApi, ListRequest, LogDetail, LogPage, TagStats};
use crate::app::logging::log_api_request;

/// HTTP client for the gallery REST API
#[derive(Debug, Clone)]
pub struct HttpGalleryClient {
    client: Client,
    base_url: Url,
}

impl HttpGalleryClient {
    /// Create a client rooted at `base_url` (for example `http://host:8000/api`)
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::Validation(format!("Invalid API base URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Validation(format!(
                "API base URL '{}' cannot carry a path",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let response = self.client.get(url.clone()).query(query).send().await;
        let response = check_status("GET", url.path(), response).await?;
        response.json::<T>().await.map_err(ApiError::from)
    }

    async fn get_bytes(&self, url: Url) -> ApiResult<Vec<u8>> {
        let response = self.client.get(url.clone()).send().await;
        let response = check_status("GET", url.path(), response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// Turn transport failures and non-2xx responses into [`ApiError`]
async fn check_status(
    method: &str,
    path: &str,
    response: Result<Response, reqwest::Error>,
) -> ApiResult<Response> {
    let response = match response {
        Ok(response) => response,
        Err(e) => {
            let err = ApiError::from(e);
            log_api_request(method, path, None, Some(&err.to_string()));
            return Err(err);
        }
    };

    let status = response.status();
    if status.is_success() {
        log_api_request(method, path, Some(status.as_u16()), None);
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = extract_detail(&body);
    log_api_request(method, path, Some(status.as_u16()), Some(&body));
    Err(ApiError::from_status(status.as_u16(), detail))
}

/// Pull a human-readable `detail`/`message` string out of an error body
fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["detail", "message"]
        .iter()
        .find_map(|field| value.get(field).and_then(|v| v.as_str()))
        .map(str::to_string)
}

impl GalleryApi for HttpGalleryClient {
    async fn list_logs(&self, request: &ListRequest) -> ApiResult<LogPage> {
        self.get_json(self.endpoint(&["logs", ""]), &request.query_pairs())
            .await
    }

    async fn get_log(&self, id: i64) -> ApiResult<LogDetail> {
        self.get_json(self.endpoint(&["logs", id.to_string().as_str()]), &[])
            .await
    }

    async fn delete_log(&self, id: i64) -> ApiResult<()> {
        let url = self.endpoint(&["logs", id.to_string().as_str()]);
        let response = self.client.delete(url.clone()).send().await;
        check_status("DELETE", url.path(), response).await?;
        Ok(())
    }

    async fn tag_stats(&self) -> ApiResult<TagStats> {
        self.get_json(self.endpoint(&["tags", "stats"]), &[]).await
    }

    async fn tag_tools(&self) -> ApiResult<Vec<String>> {
        self.get_json(self.endpoint(&["tags", "tools"]), &[]).await
    }

    async fn tag_models(&self) -> ApiResult<Vec<String>> {
        self.get_json(self.endpoint(&["tags", "models"]), &[]).await
    }

    async fn favorites(&self, page: u32, page_size: u32) -> ApiResult<FavoritePage> {
        let query = [("page", page.to_string()), ("page_size", page_size.to_string())];
        self.get_json(self.endpoint(&["favorites", ""]), &query)
            .await
    }

    async fn download_asset(&self, storage_key: &str) -> ApiResult<Vec<u8>> {
        self.get_bytes(self.endpoint(&["assets", storage_key, "download"]))
            .await
    }

    async fn fetch_url(&self, url: &str) -> ApiResult<Vec<u8>> {
        let url = Url::parse(url).map_err(|e| ApiError::Validation(format!("Invalid URL: {}", e)))?;
        self.get_bytes(url).await
    }
}
