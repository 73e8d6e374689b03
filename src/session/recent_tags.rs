//! Most-recently-used tool and model tags, persisted as JSON.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Maximum number of tags remembered per list
pub const MAX_RECENT_TAGS: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RecentTags {
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl RecentTags {
    /// Default location inside the platform data directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("vault-gallery").join("recent_tags.json"))
    }

    /// Load from `path`. A missing or unreadable file yields empty lists.
    pub fn load(path: &Path) -> Self {
        let mut tags = match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str::<RecentTags>(&contents).unwrap_or_else(|e| {
                log::warn!("Ignoring corrupt recent tags file {}: {}", path.display(), e);
                RecentTags::default()
            }),
            Err(_) => RecentTags::default(),
        };
        tags.tools.truncate(MAX_RECENT_TAGS);
        tags.models.truncate(MAX_RECENT_TAGS);
        tags.path = Some(path.to_path_buf());
        tags
    }

    pub fn remember_tool(&mut self, tool: &str) {
        push_recent(&mut self.tools, tool);
        self.persist();
    }

    pub fn remember_model(&mut self, model: &str) {
        push_recent(&mut self.models, model);
        self.persist();
    }

    /// Write to the backing file if there is one. Failures are logged, not fatal.
    fn persist(&self) {
        let Some(path) = &self.path else {
            return;
        };
        let result = (|| -> std::io::Result<()> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let json = serde_json::to_string_pretty(self)?;
            std::fs::write(path, json)
        })();
        if let Err(e) = result {
            log::error!("Failed to save recent tags to {}: {}", path.display(), e);
        }
    }
}

/// Insert `tag` at the front, dropping any older copy and anything past the bound
fn push_recent(list: &mut Vec<String>, tag: &str) {
    let tag = tag.trim();
    if tag.is_empty() {
        return;
    }
    list.retain(|existing| existing != tag);
    list.insert(0, tag.to_string());
    list.truncate(MAX_RECENT_TAGS);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_most_recent_first_without_duplicates() {
        let mut tags = RecentTags::default();
        tags.remember_tool("comfyui");
        tags.remember_tool("a1111");
        tags.remember_tool("comfyui");
        assert_eq!(tags.tools, vec!["comfyui", "a1111"]);
    }

    #[test]
    fn test_bounded_to_ten() {
        let mut tags = RecentTags::default();
        for i in 0..15 {
            tags.remember_model(&format!("model-{}", i));
        }
        assert_eq!(tags.models.len(), MAX_RECENT_TAGS);
        assert_eq!(tags.models[0], "model-14");
        assert_eq!(tags.models[9], "model-5");
    }

    #[test]
    fn test_blank_tags_ignored() {
        let mut tags = RecentTags::default();
        tags.remember_tool("   ");
        assert!(tags.tools.is_empty());
    }

    #[test]
    fn test_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("recent.json");

        let mut tags = RecentTags::load(&path);
        tags.remember_tool("fooocus");
        tags.remember_model("sdxl");

        let reloaded = RecentTags::load(&path);
        assert_eq!(reloaded.tools, vec!["fooocus"]);
        assert_eq!(reloaded.models, vec!["sdxl"]);
    }

    #[test]
    fn test_corrupt_file_yields_empty_lists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recent.json");
        std::fs::write(&path, "{not json").unwrap();

        let tags = RecentTags::load(&path);
        assert!(tags.tools.is_empty());
        assert!(tags.models.is_empty());
    }
}
