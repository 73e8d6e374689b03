use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DownloadsConfig {
    /// Where archives and single images are saved (defaults to the platform download dir)
    #[serde(default)]
    pub directory: Option<String>,
    /// File name prefix of bulk download archives
    #[serde(default = "DownloadsConfig::default_archive_prefix")]
    pub archive_prefix: String,
}

impl DownloadsConfig {
    fn default_archive_prefix() -> String {
        "vault_gallery".to_string()
    }

    /// Resolved target directory, expanding a leading `~`
    pub fn target_dir(&self) -> PathBuf {
        match self.directory.as_deref() {
            Some(dir) if !dir.trim().is_empty() => expand_home(dir.trim()),
            _ => dirs::download_dir()
                .or_else(dirs::home_dir)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            directory: None,
            archive_prefix: Self::default_archive_prefix(),
        }
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_directory_wins() {
        let config = DownloadsConfig {
            directory: Some("/tmp/exports".to_string()),
            ..DownloadsConfig::default()
        };
        assert_eq!(config.target_dir(), PathBuf::from("/tmp/exports"));
    }

    #[test]
    fn test_blank_directory_falls_back() {
        let config = DownloadsConfig {
            directory: Some("  ".to_string()),
            ..DownloadsConfig::default()
        };
        assert_ne!(config.target_dir(), PathBuf::from("  "));
    }
}
