use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    /// Base URL of the gallery server, including the `/api` prefix
    #[serde(default = "ApiConfig::default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "ApiConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ApiConfig {
    fn default_base_url() -> String {
        "http://localhost:8000/api".to_string()
    }

    fn default_timeout_secs() -> u64 {
        30
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}
