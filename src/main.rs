// Module declarations
mod api;
mod app;
mod cache;
mod gallery;
mod layout;
mod reveal;
mod session;
mod ui;

use app::cli::{Args, Command, ListArgs};
use app::config::Config;
use app::{
    App,
    main_loop::AppMainLoop,
    terminal::{init_terminal, restore_terminal},
};
use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // Parse command line arguments
    let args = Args::parse();

    // Handle --generate-config option
    if let Some(path) = &args.generate_config {
        let config_path = if path.is_dir() || path.to_str() == Some(".") {
            path.join("config.toml")
        } else {
            path.clone()
        };
        Config::generate_default(config_path)?;
        return Ok(());
    }

    // Determine config path for logging later
    let config_path = match args.config.clone() {
        Some(path) => path,
        None => Config::default_config_path()?,
    };
    let config_existed = config_path.exists();

    // Load config first for logger initialization
    let (mut config, config_warnings) = Config::load(Some(config_path.clone()))?;

    if let Some(ref base_url) = args.base_url {
        config.api.base_url = base_url.clone();
    }

    // Initialize logger first
    if config.logging.enabled {
        app::logging::ensure_log_directory(&config.logging)?;
        app::logging::init_logger(&config.logging)?;
        app::logging::log_startup_info(&config.api.base_url);
        app::logging::log_config_loading(&config_path, !config_existed);

        for warning in &config_warnings {
            log::warn!("{}", warning);
        }
    }
    let logging_enabled = config.logging.enabled;

    let list_args = match args.command {
        None => ListArgs {
            page: 1,
            ..ListArgs::default()
        },
        Some(Command::Browse(list)) => list,
        Some(command) => {
            for warning in &config_warnings {
                eprintln!("warning: {}", warning);
            }
            let result = app::commands::run_command(command, &config).await;
            if logging_enabled {
                app::logging::log_shutdown_info();
            }
            return result;
        }
    };

    let mut app = App::new(config, &list_args)?;

    if !config_warnings.is_empty() {
        app.config_warnings = config_warnings;
        app.show_config_warnings_popup = true;
    }

    // Initialize terminal
    let terminal = init_terminal()?;

    // Run application
    let result = app.run(terminal).await;

    if logging_enabled {
        app::logging::log_shutdown_info();
    }

    // Restore terminal
    restore_terminal()?;
    result
}
