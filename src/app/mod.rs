use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tokio::time::Instant;

use crate::api::{ApiError, HttpGalleryClient, LogRecord, TagStats};
use crate::app::cli::ListArgs;
use crate::app::config::Config;
use crate::app::config::binds::KeyMap;
use crate::app::preview::PreviewState;
use crate::cache::TtlCache;
use crate::gallery::{ListOrchestrator, ListQuery, SelectionCoordinator, SharedCache};
use crate::layout::ResponsiveColumns;
use crate::session::{RecentTags, SessionState};

pub use main_loop::AppMainLoop;

// Module declarations
pub mod actions;
pub mod cli;
pub mod commands;
pub mod config;
pub mod event_handlers;
pub mod logging;
pub mod main_loop;
pub mod preview;
pub mod terminal;

/// How long a status message stays on screen
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub message_type: MessageType,
    pub created: Instant,
}

impl StatusMessage {
    pub fn is_expired(&self) -> bool {
        self.created.elapsed() >= STATUS_MESSAGE_TTL
    }
}

/// Interactive browser state
pub struct App {
    pub running: bool,
    pub config: Config,
    pub orchestrator: ListOrchestrator<HttpGalleryClient>,
    pub selection: SelectionCoordinator,
    pub recent_tags: RecentTags,
    pub query: ListQuery,
    pub tag_stats: Option<TagStats>,
    pub cursor: usize,
    pub layout: ResponsiveColumns,
    pub preview: PreviewState,
    pub key_map: KeyMap,
    pub status_message: Option<StatusMessage>,
    /// Set by the first bulk-delete press, consumed by the second
    pub pending_delete_confirm: bool,
    pub config_warnings: Vec<String>,
    pub show_config_warnings_popup: bool,
    /// Text being typed into the search prompt, `None` when it is closed
    pub search_input: Option<String>,
    /// Card indices per gallery column as last drawn
    pub card_columns: Vec<Vec<usize>>,
    /// `Some(force)` when the list should be reloaded on the next tick
    pub reload_requested: Option<bool>,
}

/// Wire the HTTP client, cache and session into a list orchestrator
pub fn build_orchestrator(config: &Config) -> color_eyre::Result<ListOrchestrator<HttpGalleryClient>> {
    let client = HttpGalleryClient::new(&config.api.base_url, config.api.timeout())?;
    let session = Rc::new(SessionState::new(config.gallery.default_view));
    let cache: SharedCache = Rc::new(RefCell::new(TtlCache::new()));
    Ok(ListOrchestrator::new(
        client,
        cache,
        session,
        config.gallery.list_settings(),
    ))
}

impl App {
    pub fn new(config: Config, list: &ListArgs) -> color_eyre::Result<Self> {
        let orchestrator = build_orchestrator(&config)?;

        let recent_tags = RecentTags::default_path()
            .map(|path| RecentTags::load(&path))
            .unwrap_or_default();

        Ok(Self {
            running: false,
            query: list.to_query(&config.gallery),
            orchestrator,
            selection: SelectionCoordinator::new(),
            recent_tags,
            tag_stats: None,
            cursor: 0,
            layout: ResponsiveColumns::new(0, 0, config.gallery.resize_debounce()),
            preview: PreviewState::new(config.gallery.blur_sigma, config.gallery.max_load_retries),
            key_map: config.binds.build_key_map(),
            status_message: None,
            pending_delete_confirm: false,
            config_warnings: Vec::new(),
            show_config_warnings_popup: false,
            search_input: None,
            card_columns: Vec::new(),
            reload_requested: Some(false),
            config,
        })
    }

    pub fn set_status(&mut self, message_type: MessageType, text: impl Into<String>) {
        let text = text.into();
        match message_type {
            MessageType::Error => log::warn!("Status: {}", text),
            _ => log::debug!("Status: {}", text),
        }
        self.status_message = Some(StatusMessage {
            text,
            message_type,
            created: Instant::now(),
        });
    }

    pub fn show_error(&mut self, error: &ApiError) {
        self.set_status(MessageType::Error, error.user_message());
    }

    pub fn expire_status(&mut self) {
        if self.status_message.as_ref().is_some_and(StatusMessage::is_expired) {
            self.status_message = None;
        }
    }

    /// Record under the cursor
    pub fn current_record(&self) -> Option<LogRecord> {
        self.orchestrator.view().items.get(self.cursor).cloned()
    }

    /// Load the current query and refresh everything derived from the page
    pub async fn reload(&mut self, force_refresh: bool) {
        match self.orchestrator.load(&self.query, force_refresh).await {
            Ok(result) => {
                log::debug!(
                    "Page {} loaded from {:?} with {} records",
                    self.query.page,
                    result.source,
                    result.items.len()
                );
                if force_refresh {
                    self.set_status(MessageType::Success, "Refreshed");
                }
            }
            Err(e) => self.show_error(&e),
        }

        if let Some(stats) = self.orchestrator.load_tag_stats(force_refresh).await {
            self.tag_stats = Some(stats);
        }
        self.after_view_change();
    }

    /// Bring cursor, columns and selection in line with the displayed page
    pub fn after_view_change(&mut self) {
        let (len, version) = {
            let view = self.orchestrator.view();
            (view.items.len(), view.version)
        };
        self.cursor = self.cursor.min(len.saturating_sub(1));
        self.layout.set_item_count(len);
        self.selection.sync_with_view(version);
    }

    /// Queue a reload for the next tick
    pub fn request_reload(&mut self, force_refresh: bool) {
        let force = self.reload_requested.unwrap_or(false) || force_refresh;
        self.reload_requested = Some(force);
    }
}
