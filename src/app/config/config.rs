use crate::app::config::api::ApiConfig;
use crate::app::config::binds::{BindsConfig, KNOWN_BINDS_FIELDS};
use crate::app::config::colors::ColorsConfig;
use crate::app::config::downloads::DownloadsConfig;
use crate::app::config::gallery::GalleryConfig;
use crate::app::config::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub gallery: GalleryConfig,
    #[serde(default)]
    pub downloads: DownloadsConfig,
    #[serde(default)]
    pub colors: ColorsConfig,
    #[serde(default)]
    pub binds: BindsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

const KNOWN_SECTIONS: &[&str] = &["api", "gallery", "downloads", "colors", "binds", "logging"];

const KNOWN_API_FIELDS: &[&str] = &["base_url", "timeout_secs"];

const KNOWN_GALLERY_FIELDS: &[&str] = &[
    "page_size",
    "list_cache_ttl_secs",
    "tag_stats_cache_ttl_secs",
    "resize_debounce_ms",
    "max_load_retries",
    "request_fencing",
    "default_sort",
    "default_view",
    "blur_sigma",
];

const KNOWN_DOWNLOADS_FIELDS: &[&str] = &["directory", "archive_prefix"];

const KNOWN_COLORS_FIELDS: &[&str] = &[
    "border",
    "border_title",
    "card_title",
    "card_meta",
    "tool_tag",
    "model_tag",
    "cursor",
    "selected",
    "sensitive",
    "status_info",
    "status_error",
];

const KNOWN_LOGGING_FIELDS: &[&str] = &[
    "enabled",
    "level",
    "log_to_console",
    "append_to_file",
    "rotate_logs",
    "rotation_size_mb",
    "keep_log_files",
    "custom_log_path",
    "log_requests",
];

/// Calculate Levenshtein distance between two strings
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut prev_row: Vec<usize> = (0..=b_len).collect();
    let mut curr_row: Vec<usize> = vec![0; b_len + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        curr_row[0] = i + 1;

        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = if a_char == b_char { 0 } else { 1 };
            curr_row[j + 1] = (prev_row[j + 1] + 1)
                .min(curr_row[j] + 1)
                .min(prev_row[j] + cost);
        }

        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[b_len]
}

/// Find the most similar string from a list of candidates
fn find_similar(unknown: &str, candidates: &[&str]) -> Option<String> {
    let unknown_lower = unknown.to_lowercase();
    let mut best_match: Option<(&str, usize)> = None;

    for &candidate in candidates {
        let distance = levenshtein_distance(&unknown_lower, &candidate.to_lowercase());

        // At least 3 edits allowed, more for long names
        let max_len = unknown.len().max(candidate.len());
        let threshold = (max_len / 2).max(3);

        if distance <= threshold && best_match.is_none_or(|(_, best)| distance < best) {
            best_match = Some((candidate, distance));
        }
    }

    best_match.map(|(s, _)| s.to_string())
}

/// Format an unknown config warning with optional "did you mean" suggestion
fn format_unknown_warning(section: &str, key: &str, suggestion: Option<&str>) -> String {
    if section == "section" {
        match suggestion {
            Some(s) => format!("Unknown config section: [{}] (did you mean: [{}]?)", key, s),
            None => format!("Unknown config section: [{}]", key),
        }
    } else {
        match suggestion {
            Some(s) => format!(
                "Unknown option in {}: {} (did you mean: {}?)",
                section, key, s
            ),
            None => format!("Unknown option in {}: {}", section, key),
        }
    }
}

impl Config {
    /// Returns the default config file path based on the platform:
    /// - Linux: ~/.config/vault-gallery/config.toml (XDG_CONFIG_HOME)
    /// - macOS: ~/Library/Application Support/vault-gallery/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\vault-gallery\config.toml
    pub fn default_config_path() -> color_eyre::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| color_eyre::eyre::eyre!("Could not determine config directory"))?;
        Ok(config_dir.join("vault-gallery").join("config.toml"))
    }

    /// Load the config, writing a default file if none exists.
    ///
    /// Returns the config together with warnings about unknown keys and
    /// parse failures; the logger is not running yet, so the caller logs them.
    pub fn load(config_path: Option<PathBuf>) -> color_eyre::Result<(Self, Vec<String>)> {
        let config_path = match config_path {
            Some(path) => path,
            None => Self::default_config_path()?,
        };

        if !config_path.exists() {
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let default_config = Config::default();
            let toml_string = toml::to_string_pretty(&default_config)?;
            std::fs::write(&config_path, &toml_string)?;

            eprintln!("Created default config file at: {}", config_path.display());
            return Ok((default_config, Vec::new()));
        }
        let contents = std::fs::read_to_string(&config_path)?;
        Ok(Self::parse(&contents))
    }

    /// Parse config text. Invalid TOML yields the defaults and a warning.
    pub fn parse(contents: &str) -> (Self, Vec<String>) {
        let mut warnings = Self::check_unknown_fields(contents);
        let config = toml::from_str(contents).unwrap_or_else(|e| {
            warnings.push(format!("Failed to parse config file, using defaults: {}", e));
            Config::default()
        });
        (config, warnings)
    }

    /// Check for unknown fields in the config file and return warnings
    fn check_unknown_fields(contents: &str) -> Vec<String> {
        let mut warnings = Vec::new();

        let table: toml::Table = match toml::from_str(contents) {
            Ok(t) => t,
            Err(_) => return warnings,
        };

        for key in table.keys() {
            if !KNOWN_SECTIONS.contains(&key.as_str()) {
                let suggestion = find_similar(key, KNOWN_SECTIONS);
                warnings.push(format_unknown_warning("section", key, suggestion.as_deref()));
            }
        }

        let sections: [(&str, &[&str]); 6] = [
            ("api", KNOWN_API_FIELDS),
            ("gallery", KNOWN_GALLERY_FIELDS),
            ("downloads", KNOWN_DOWNLOADS_FIELDS),
            ("colors", KNOWN_COLORS_FIELDS),
            ("binds", KNOWN_BINDS_FIELDS),
            ("logging", KNOWN_LOGGING_FIELDS),
        ];
        for (section, known) in sections {
            if let Some(toml::Value::Table(fields)) = table.get(section) {
                let label = format!("[{}]", section);
                for key in fields.keys() {
                    if !known.contains(&key.as_str()) {
                        let suggestion = find_similar(key, known);
                        warnings.push(format_unknown_warning(&label, key, suggestion.as_deref()));
                    }
                }
            }
        }

        warnings
    }

    /// Generate a default config file at the specified path
    pub fn generate_default(path: PathBuf) -> color_eyre::Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        if path.exists() {
            return Err(color_eyre::eyre::eyre!(
                "Config file already exists at: {}",
                path.display()
            ));
        }

        let default_config = Config::default();
        let toml_string = toml::to_string_pretty(&default_config)?;
        std::fs::write(&path, &toml_string)?;

        println!("Generated default config at: {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery::SortKey;
    use crate::session::ViewMode;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("same", "same"), 0);
    }

    #[test]
    fn test_unknown_keys_get_suggestions() {
        let (_, warnings) = Config::parse(
            r#"
[gallary]
page_size = 10

[gallery]
page_sise = 10

[api]
base_url = "http://example.test/api"
"#,
        );
        assert_eq!(
            warnings,
            vec![
                "Unknown config section: [gallary] (did you mean: [gallery]?)".to_string(),
                "Unknown option in [gallery]: page_sise (did you mean: page_size?)".to_string(),
            ]
        );
    }

    #[test]
    fn test_partial_sections_use_defaults() {
        let (config, warnings) = Config::parse(
            r#"
[api]
base_url = "http://example.test/api"

[gallery]
default_sort = "title_asc"
default_view = "masonry"
request_fencing = false
"#,
        );
        assert!(warnings.is_empty());
        assert_eq!(config.api.base_url, "http://example.test/api");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.gallery.page_size, 20);
        assert_eq!(config.gallery.default_sort, SortKey::TitleAsc);
        assert_eq!(config.gallery.default_view, ViewMode::Masonry);
        assert!(!config.gallery.list_settings().request_fencing);
        assert_eq!(config.downloads.archive_prefix, "vault_gallery");
    }

    #[test]
    fn test_invalid_toml_falls_back_to_defaults() {
        let (config, warnings) = Config::parse("[api\nbase_url = 1");
        assert_eq!(config.api.base_url, "http://localhost:8000/api");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Failed to parse config file"));
    }

    #[test]
    fn test_default_config_round_trips_without_warnings() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let (_, warnings) = Config::parse(&text);
        assert!(warnings.is_empty(), "{:?}", warnings);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");
        let (config, warnings) = Config::load(Some(path.clone())).unwrap();
        assert!(path.exists());
        assert!(warnings.is_empty());
        assert_eq!(config.gallery.resize_debounce_ms, 150);
    }

    #[test]
    fn test_generate_default_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        Config::generate_default(path.clone()).unwrap();
        assert!(Config::generate_default(path).is_err());
    }
}
