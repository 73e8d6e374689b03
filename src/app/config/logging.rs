use log::LevelFilter;
use serde::{Deserialize, Serialize};

/// `[logging]` section. The browser owns the terminal, so records go to a
/// file unless `log_to_console` is set for one-shot commands.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_enabled")]
    pub enabled: bool,
    /// One of error, warn, info, debug, trace
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
    /// Mirror records to stdout
    #[serde(default)]
    pub log_to_console: bool,
    #[serde(default = "LoggingConfig::default_append_to_file")]
    pub append_to_file: bool,
    /// Roll `vault-gallery.log` over once it reaches `rotation_size_mb`
    #[serde(default = "LoggingConfig::default_rotate_logs")]
    pub rotate_logs: bool,
    #[serde(default = "LoggingConfig::default_rotation_size_mb")]
    pub rotation_size_mb: u64,
    /// Rotated files kept next to the live one
    #[serde(default = "LoggingConfig::default_keep_log_files")]
    pub keep_log_files: u32,
    /// Directory for the log file instead of the platform data dir
    #[serde(default)]
    pub custom_log_path: Option<String>,
    /// Record each gallery API call with its status
    #[serde(default = "LoggingConfig::default_log_requests")]
    pub log_requests: bool,
}

impl LoggingConfig {
    fn default_enabled() -> bool {
        true
    }

    fn default_level() -> String {
        "info".to_string()
    }

    fn default_append_to_file() -> bool {
        true
    }

    fn default_rotate_logs() -> bool {
        true
    }

    fn default_rotation_size_mb() -> u64 {
        10
    }

    fn default_keep_log_files() -> u32 {
        5
    }

    fn default_log_requests() -> bool {
        true
    }

    /// Parsed `level`; unknown names fall back to info
    pub fn level_filter(&self) -> LevelFilter {
        self.level.trim().parse().unwrap_or(LevelFilter::Info)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            level: Self::default_level(),
            log_to_console: false,
            append_to_file: Self::default_append_to_file(),
            rotate_logs: Self::default_rotate_logs(),
            rotation_size_mb: Self::default_rotation_size_mb(),
            keep_log_files: Self::default_keep_log_files(),
            custom_log_path: None,
            log_requests: Self::default_log_requests(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: LoggingConfig = toml::from_str("level = \"debug\"\nlog_requests = false").unwrap();
        assert_eq!(config.level_filter(), LevelFilter::Debug);
        assert!(!config.log_requests);
        assert!(config.enabled);
        assert_eq!(config.rotation_size_mb, 10);
        assert_eq!(config.custom_log_path, None);
    }

    #[test]
    fn test_unknown_level_falls_back_to_info() {
        let config = LoggingConfig {
            level: "loud".to_string(),
            ..LoggingConfig::default()
        };
        assert_eq!(config.level_filter(), LevelFilter::Info);
        let config = LoggingConfig {
            level: " WARN ".to_string(),
            ..LoggingConfig::default()
        };
        assert_eq!(config.level_filter(), LevelFilter::Warn);
    }
}
