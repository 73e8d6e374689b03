use crate::app::config::LoggingConfig;
use flexi_logger::{Cleanup, Criterion, FileSpec, FlexiLoggerError, Logger, Naming};
use log::LevelFilter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

static LOG_REQUESTS: AtomicBool = AtomicBool::new(true);

/// Initialize the logger for the application
pub fn init_logger(config: &LoggingConfig) -> Result<(), FlexiLoggerError> {
    let log_level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        config.level_filter()
    };

    let mut logger = Logger::try_with_str(log_level.as_str().to_lowercase())?;

    logger = logger
        .log_to_file(
            FileSpec::default()
                .directory(log_directory(config))
                .basename("vault-gallery")
                .suppress_timestamp(),
        )
        .format_for_files(custom_log_format)
        .use_utc();

    if config.append_to_file {
        logger = logger.append();
    }

    if config.rotate_logs {
        logger = logger.rotate(
            Criterion::Size(config.rotation_size_mb * 1024 * 1024),
            Naming::Timestamps,
            Cleanup::KeepLogFiles(config.keep_log_files as usize),
        );
    }

    if config.log_to_console {
        logger = logger.log_to_stdout();
    }

    LOG_REQUESTS.store(config.log_requests, Ordering::Relaxed);

    logger.start()?;
    log::info!("Logger initialized with level: {:?}", log_level);
    log::info!("Log file location: {}", log_file_path(config).display());

    Ok(())
}

/// Configured log directory, or the platform default
pub fn log_directory(config: &LoggingConfig) -> PathBuf {
    match config.custom_log_path.as_deref() {
        Some(path) if !path.trim().is_empty() => PathBuf::from(path.trim()),
        _ => get_log_directory(),
    }
}

/// Get the platform-specific log directory
pub fn get_log_directory() -> PathBuf {
    #[cfg(target_os = "linux")]
    return dirs::data_dir()
        .unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".local/share"))
                .unwrap_or_else(|| PathBuf::from("."))
        })
        .join("vault-gallery/logs");

    #[cfg(target_os = "macos")]
    return dirs::data_dir()
        .map(|h| h.join("Logs/vault-gallery"))
        .unwrap_or_else(|| PathBuf::from("./logs"));

    #[cfg(target_os = "windows")]
    return dirs::data_dir()
        .map(|d| d.join("vault-gallery/logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"));

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    return dirs::home_dir()
        .map(|h| h.join(".vault-gallery/logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"));
}

/// Get the full path to the main log file
pub fn log_file_path(config: &LoggingConfig) -> PathBuf {
    log_directory(config).join("vault-gallery.log")
}

/// Custom log format for file output
fn custom_log_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    write!(
        w,
        "{} [{}] [{}:{}] {}",
        now.now().format("%Y-%m-%d %H:%M:%S%.3f"),
        record.level(),
        record.file().unwrap_or("unknown"),
        record.line().unwrap_or(0),
        record.args()
    )
}

/// Ensure log directory exists
pub fn ensure_log_directory(config: &LoggingConfig) -> color_eyre::Result<()> {
    let log_dir = log_directory(config);
    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir)?;
        log::info!("Created log directory: {}", log_dir.display());
    }
    Ok(())
}

/// Log application startup information
pub fn log_startup_info(base_url: &str) {
    log::info!("=== Vault Gallery Starting ===");
    log::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    log::info!("OS: {}", std::env::consts::OS);
    log::info!("Architecture: {}", std::env::consts::ARCH);
    log::info!("API: {}", base_url);
}

/// Log application shutdown information
pub fn log_shutdown_info() {
    log::info!("=== Vault Gallery Shutting Down ===");
}

/// Log one API round trip. `status` is `None` when no response arrived.
pub fn log_api_request(method: &str, path: &str, status: Option<u16>, error: Option<&str>) {
    match (status, error) {
        (Some(code), None) => {
            if LOG_REQUESTS.load(Ordering::Relaxed) {
                log::debug!("{} {} -> {}", method, path, code);
            }
        }
        (Some(code), Some(body)) => {
            log::warn!("{} {} -> {}: {}", method, path, code, body);
        }
        (None, err) => {
            log::error!(
                "{} {} failed: {}",
                method,
                path,
                err.unwrap_or("Unknown error")
            );
        }
    }
}

/// Log the outcome of a bulk operation
pub fn log_bulk_operation(operation: &str, requested: usize, succeeded: usize, failed: usize) {
    if failed == 0 {
        log::info!(
            "Bulk {}: {} requested, {} succeeded",
            operation,
            requested,
            succeeded
        );
    } else {
        log::warn!(
            "Bulk {}: {} requested, {} succeeded, {} failed",
            operation,
            requested,
            succeeded,
            failed
        );
    }
}

/// Log user interactions for debugging
pub fn log_user_interaction(action: &str, context: Option<&str>) {
    match context {
        Some(ctx) => log::debug!("User action: {} - {}", action, ctx),
        None => log::debug!("User action: {}", action),
    }
}

/// Log configuration loading
pub fn log_config_loading(config_path: &Path, created: bool) {
    if created {
        log::info!("Created default config file at: {}", config_path.display());
    } else {
        log::info!("Loaded config file from: {}", config_path.display());
    }
}
