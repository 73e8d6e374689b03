use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::{App, MessageType};
use crate::api::{GalleryApi, RecordType, TagStats};
use crate::app::actions::GalleryAction;
use crate::app::config::binds::normalize_key;
use crate::app::logging::log_user_interaction;
use crate::gallery::ListQuery;
use crate::gallery::selection::download_asset_to;
use crate::layout::terminal_width_px;
use crate::session::ViewMode;

/// Trait for event handling
pub trait EventHandlers {
    async fn handle_crossterm_events(&mut self) -> color_eyre::Result<()>;
    async fn on_key_event(&mut self, key: KeyEvent) -> color_eyre::Result<()>;
    async fn handle_action(&mut self, action: GalleryAction);
    fn quit(&mut self);
}

impl EventHandlers for App {
    /// Reads the crossterm events and updates the state of [`App`].
    async fn handle_crossterm_events(&mut self) -> color_eyre::Result<()> {
        match crossterm::event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                self.on_key_event(key).await?;
            }
            Event::Resize(cols, _) => {
                let width = crate::ui::grid_pane_width(cols);
                self.layout
                    .on_resize(terminal_width_px(width, self.preview.cell_width()));
            }
            _ => {}
        }
        Ok(())
    }

    /// Handles the key events and updates the state of [`App`].
    async fn on_key_event(&mut self, key: KeyEvent) -> color_eyre::Result<()> {
        // Any key closes the warnings popup
        if self.show_config_warnings_popup {
            self.show_config_warnings_popup = false;
            return Ok(());
        }

        if let Some(input) = self.search_input.as_mut() {
            match edit_search(input, key) {
                SearchEdit::Editing => {}
                SearchEdit::Cancel => self.search_input = None,
                SearchEdit::Submit => {
                    let text = self.search_input.take().unwrap_or_default();
                    log_user_interaction("search", Some(&text));
                    if set_search(&mut self.query, &text) {
                        self.apply_filter_change();
                    }
                }
            }
            return Ok(());
        }

        if let Some(action) = self
            .key_map
            .get(&normalize_key(key.modifiers, key.code))
            .copied()
        {
            log_user_interaction(action.label(), None);
            if action != GalleryAction::BulkDelete {
                self.pending_delete_confirm = false;
            }
            self.handle_action(action).await;
        }
        Ok(())
    }

    async fn handle_action(&mut self, action: GalleryAction) {
        match action {
            GalleryAction::Quit => self.quit(),
            GalleryAction::Refresh => self.request_reload(true),

            GalleryAction::MoveLeft
            | GalleryAction::MoveRight
            | GalleryAction::MoveUp
            | GalleryAction::MoveDown => {
                let len = self.orchestrator.view().items.len();
                let masonry = self.orchestrator.session().view_mode() == ViewMode::Masonry;
                self.cursor = if masonry {
                    move_cursor_in_columns(self.cursor, &self.card_columns, action)
                        .unwrap_or_else(|| move_cursor(self.cursor, len, self.layout.columns(), action))
                } else {
                    move_cursor(self.cursor, len, self.layout.columns(), action)
                };
            }

            GalleryAction::NextPage => {
                let pages = self.query.page_count(self.orchestrator.view().total);
                if self.query.page < pages {
                    self.query.page += 1;
                    self.cursor = 0;
                    self.request_reload(false);
                }
            }
            GalleryAction::PreviousPage => {
                if self.query.page > 1 {
                    self.query.page -= 1;
                    self.cursor = 0;
                    self.request_reload(false);
                }
            }
            GalleryAction::CycleSort => {
                self.query.sort = self.query.sort.next();
                self.set_status(MessageType::Info, format!("Sort: {}", self.query.sort.label()));
                self.request_reload(false);
            }
            GalleryAction::ToggleViewMode => {
                let session = self.orchestrator.session();
                session.set_view_mode(session.view_mode().toggled());
            }

            GalleryAction::CycleTypeFilter => {
                self.query.record_type = next_record_type(self.query.record_type);
                self.apply_filter_change();
            }
            GalleryAction::CycleToolFilter => {
                let options = filter_options(
                    self.tag_stats.as_ref().map(|s| &s.tools),
                    &self.recent_tags.tools,
                );
                self.query.tool = cycle_option(self.query.tool.as_deref(), &options);
                if let Some(tool) = self.query.tool.clone() {
                    self.recent_tags.remember_tool(&tool);
                }
                self.apply_filter_change();
            }
            GalleryAction::CycleModelFilter => {
                let options = filter_options(
                    self.tag_stats.as_ref().map(|s| &s.models),
                    &self.recent_tags.models,
                );
                self.query.model = cycle_option(self.query.model.as_deref(), &options);
                if let Some(model) = self.query.model.clone() {
                    self.recent_tags.remember_model(&model);
                }
                self.apply_filter_change();
            }
            GalleryAction::Search => {
                self.search_input = Some(self.query.search.clone());
            }
            GalleryAction::ClearFilters => {
                self.query.search.clear();
                self.query.record_type = None;
                self.query.tool = None;
                self.query.model = None;
                self.apply_filter_change();
            }

            GalleryAction::ToggleSelectionMode => {
                self.selection.toggle_mode();
                let text = if self.selection.is_selecting() {
                    "Selection mode"
                } else {
                    "Browse mode"
                };
                self.set_status(MessageType::Info, text);
            }
            GalleryAction::ToggleSelected => {
                if let Some(record) = self.current_record()
                    && let Err(e) = self.selection.toggle(record.id)
                {
                    self.show_error(&e);
                }
            }
            GalleryAction::ToggleSelectAll => {
                let ids = self.orchestrator.view().ids();
                if let Err(e) = self.selection.toggle_all(&ids) {
                    self.show_error(&e);
                }
            }
            GalleryAction::BulkDelete => self.bulk_delete().await,
            GalleryAction::BulkDownload => self.bulk_download().await,
            GalleryAction::DownloadCover => self.download_current().await,

            GalleryAction::Reveal => self.preview.reveal(),
            GalleryAction::OpenViewer => self.preview.open_viewer(),
            GalleryAction::Hide => self.preview.hide(),
            GalleryAction::Back => {
                if self.preview.is_viewing() {
                    self.preview.dismiss_viewer();
                } else if self.selection.is_selecting() {
                    self.selection.exit();
                    self.set_status(MessageType::Info, "Browse mode");
                }
            }
        }
    }

    /// Set running to false to quit the application.
    fn quit(&mut self) {
        self.running = false;
    }
}

impl App {
    fn apply_filter_change(&mut self) {
        self.query.page = 1;
        self.cursor = 0;
        self.set_status(MessageType::Info, filter_summary(&self.query));
        self.request_reload(false);
    }

    /// First press arms the confirmation, second press deletes
    async fn bulk_delete(&mut self) {
        if !self.pending_delete_confirm {
            if !self.selection.is_selecting() || self.selection.is_empty() {
                // Let the coordinator report what is missing
                if let Err(e) = self.selection.bulk_delete(&self.orchestrator).await {
                    self.show_error(&e);
                }
                return;
            }
            self.pending_delete_confirm = true;
            let count = self.selection.len();
            self.set_status(
                MessageType::Warning,
                format!("Press again to delete {} record{}", count, plural(count)),
            );
            return;
        }

        self.pending_delete_confirm = false;
        match self.selection.bulk_delete(&self.orchestrator).await {
            Ok(report) => {
                let kind = if report.is_success() {
                    MessageType::Success
                } else {
                    MessageType::Error
                };
                self.set_status(kind, report.user_message());
                if report.is_success()
                    && let Some(stats) = self.orchestrator.load_tag_stats(false).await
                {
                    self.tag_stats = Some(stats);
                }
                self.after_view_change();
            }
            Err(e) => self.show_error(&e),
        }
    }

    async fn bulk_download(&mut self) {
        let dest = self.config.downloads.target_dir();
        let prefix = self.config.downloads.archive_prefix.clone();
        match self
            .selection
            .bulk_download(&self.orchestrator, &dest, &prefix)
            .await
        {
            Ok(report) => {
                let kind = if report.archive_path.is_some() {
                    MessageType::Success
                } else {
                    MessageType::Warning
                };
                self.set_status(kind, report.user_message());
            }
            Err(e) => self.show_error(&e),
        }
    }

    /// Save the first output image of the record under the cursor
    async fn download_current(&mut self) {
        let Some(record) = self.current_record() else {
            return;
        };
        let api = self.orchestrator.api();
        let result = async {
            let detail = api.get_log(record.id).await?;
            let assets = detail.ordered_output_assets();
            let Some(asset) = assets.first() else {
                return Ok(None);
            };
            let dest = self.config.downloads.target_dir();
            download_asset_to(api, asset, &detail.title, 1, &dest)
                .await
                .map(Some)
        }
        .await;

        match result {
            Ok(Some(path)) => {
                self.set_status(MessageType::Success, format!("Saved {}", path.display()))
            }
            Ok(None) => self.set_status(MessageType::Warning, "No images to download"),
            Err(e) => self.show_error(&e),
        }
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

/// Move within a row-major grid of `columns` cells, clamped to the items
pub fn move_cursor(cursor: usize, len: usize, columns: usize, action: GalleryAction) -> usize {
    if len == 0 {
        return 0;
    }
    let columns = columns.max(1);
    let last = len - 1;
    let cursor = cursor.min(last);
    match action {
        GalleryAction::MoveLeft => cursor.saturating_sub(1),
        GalleryAction::MoveRight => (cursor + 1).min(last),
        GalleryAction::MoveUp => cursor.checked_sub(columns).unwrap_or(cursor),
        GalleryAction::MoveDown => {
            if cursor + columns <= last {
                cursor + columns
            } else {
                cursor
            }
        }
        _ => cursor,
    }
}

/// Masonry navigation over the drawn columns: up/down step within the
/// column, left/right jump to the same position in the neighbouring column.
/// `None` when the cursor is not in `columns`.
pub fn move_cursor_in_columns(
    cursor: usize,
    columns: &[Vec<usize>],
    action: GalleryAction,
) -> Option<usize> {
    let (col, pos) = columns.iter().enumerate().find_map(|(c, items)| {
        items.iter().position(|&i| i == cursor).map(|p| (c, p))
    })?;
    let column = &columns[col];
    let next = match action {
        GalleryAction::MoveUp => pos.checked_sub(1).map(|p| column[p]),
        GalleryAction::MoveDown => column.get(pos + 1).copied(),
        GalleryAction::MoveLeft => col
            .checked_sub(1)
            .and_then(|c| columns[c].get(pos.min(columns[c].len().saturating_sub(1))).copied()),
        GalleryAction::MoveRight => columns
            .get(col + 1)
            .and_then(|items| items.get(pos.min(items.len().saturating_sub(1))).copied()),
        _ => None,
    };
    Some(next.unwrap_or(cursor))
}

/// Result of feeding one key to the search prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchEdit {
    Editing,
    Submit,
    Cancel,
}

pub fn edit_search(input: &mut String, key: KeyEvent) -> SearchEdit {
    match key.code {
        KeyCode::Esc => SearchEdit::Cancel,
        KeyCode::Enter => SearchEdit::Submit,
        KeyCode::Backspace => {
            input.pop();
            SearchEdit::Editing
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            input.clear();
            SearchEdit::Editing
        }
        KeyCode::Char(c)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            input.push(c);
            SearchEdit::Editing
        }
        _ => SearchEdit::Editing,
    }
}

/// Apply submitted search text. A changed search starts again at page one.
/// Returns whether the query changed.
pub fn set_search(query: &mut ListQuery, text: &str) -> bool {
    let text = text.trim();
    if query.search == text {
        return false;
    }
    query.search = text.to_string();
    query.page = 1;
    true
}

/// None -> txt2img -> img2img -> None
pub fn next_record_type(current: Option<RecordType>) -> Option<RecordType> {
    match current {
        None => Some(RecordType::TextToImage),
        Some(RecordType::TextToImage) => Some(RecordType::ImageToImage),
        Some(RecordType::ImageToImage) => None,
    }
}

/// Tags ranked by usage, followed by recent tags the server has no count for
pub fn filter_options(
    counts: Option<&std::collections::BTreeMap<String, u64>>,
    recent: &[String],
) -> Vec<String> {
    let mut options: Vec<String> = counts
        .map(|c| {
            TagStats::ranked(c)
                .into_iter()
                .map(|(name, _)| name.to_string())
                .collect()
        })
        .unwrap_or_default();
    for tag in recent {
        if !options.contains(tag) {
            options.push(tag.clone());
        }
    }
    options
}

/// Step to the next option; past the last one the filter is cleared
pub fn cycle_option(current: Option<&str>, options: &[String]) -> Option<String> {
    let next = match current {
        None => 0,
        Some(value) => match options.iter().position(|o| o == value) {
            Some(index) => index + 1,
            None => 0,
        },
    };
    options.get(next).cloned()
}

fn filter_summary(query: &ListQuery) -> String {
    let mut parts = Vec::new();
    if !query.search.is_empty() {
        parts.push(format!("search=\"{}\"", query.search));
    }
    if let Some(record_type) = query.record_type {
        parts.push(format!("type={}", record_type.as_query_value()));
    }
    if let Some(tool) = &query.tool {
        parts.push(format!("tool={}", tool));
    }
    if let Some(model) = &query.model {
        parts.push(format!("model={}", model));
    }
    if parts.is_empty() {
        "Filters cleared".to_string()
    } else {
        format!("Filter: {}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_move_cursor_in_grid() {
        // 7 items in 3 columns:
        // 0 1 2
        // 3 4 5
        // 6
        assert_eq!(move_cursor(1, 7, 3, GalleryAction::MoveDown), 4);
        assert_eq!(move_cursor(4, 7, 3, GalleryAction::MoveDown), 4);
        assert_eq!(move_cursor(3, 7, 3, GalleryAction::MoveDown), 6);
        assert_eq!(move_cursor(1, 7, 3, GalleryAction::MoveUp), 1);
        assert_eq!(move_cursor(5, 7, 3, GalleryAction::MoveUp), 2);
        assert_eq!(move_cursor(0, 7, 3, GalleryAction::MoveLeft), 0);
        assert_eq!(move_cursor(6, 7, 3, GalleryAction::MoveRight), 6);
        assert_eq!(move_cursor(0, 0, 3, GalleryAction::MoveRight), 0);
    }

    #[test]
    fn test_masonry_navigation_follows_columns() {
        // Column lists as placed by masonry
        let columns = vec![vec![0, 3, 4], vec![1, 2]];
        assert_eq!(move_cursor_in_columns(0, &columns, GalleryAction::MoveDown), Some(3));
        assert_eq!(move_cursor_in_columns(4, &columns, GalleryAction::MoveDown), Some(4));
        assert_eq!(move_cursor_in_columns(3, &columns, GalleryAction::MoveUp), Some(0));
        assert_eq!(move_cursor_in_columns(3, &columns, GalleryAction::MoveRight), Some(2));
        assert_eq!(move_cursor_in_columns(4, &columns, GalleryAction::MoveRight), Some(2));
        assert_eq!(move_cursor_in_columns(2, &columns, GalleryAction::MoveLeft), Some(3));
        assert_eq!(move_cursor_in_columns(0, &columns, GalleryAction::MoveLeft), Some(0));
        assert_eq!(move_cursor_in_columns(9, &columns, GalleryAction::MoveDown), None);
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_search_prompt_editing() {
        let mut input = String::from("ca");
        assert_eq!(edit_search(&mut input, key(KeyCode::Char('t'))), SearchEdit::Editing);
        assert_eq!(edit_search(&mut input, key(KeyCode::Char('s'))), SearchEdit::Editing);
        assert_eq!(edit_search(&mut input, key(KeyCode::Backspace)), SearchEdit::Editing);
        assert_eq!(input, "cat");
        assert_eq!(
            edit_search(&mut input, KeyEvent::new(KeyCode::Char('w'), KeyModifiers::CONTROL)),
            SearchEdit::Editing
        );
        assert_eq!(input, "cat");
        assert_eq!(edit_search(&mut input, key(KeyCode::Enter)), SearchEdit::Submit);
        assert_eq!(edit_search(&mut input, key(KeyCode::Esc)), SearchEdit::Cancel);
        edit_search(&mut input, KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert!(input.is_empty());
    }

    #[test]
    fn test_submitted_search_changes_query_and_cache_slot() {
        let mut query = ListQuery {
            page: 3,
            ..ListQuery::default()
        };
        let before = query.cache_key();

        assert!(set_search(&mut query, "  harbor "));
        assert_eq!(query.search, "harbor");
        assert_eq!(query.page, 1);
        assert_ne!(query.cache_key(), before);
        assert_eq!(query.to_request().search.as_deref(), Some("harbor"));
        assert_eq!(filter_summary(&query), "Filter: search=\"harbor\"");

        assert!(!set_search(&mut query, "harbor"));
        assert!(set_search(&mut query, ""));
        assert_eq!(query.to_request().search, None);
    }

    #[test]
    fn test_record_type_cycle_returns_to_all() {
        let mut current = None;
        let mut seen = Vec::new();
        for _ in 0..3 {
            current = next_record_type(current);
            seen.push(current);
        }
        assert_eq!(
            seen,
            vec![Some(RecordType::TextToImage), Some(RecordType::ImageToImage), None]
        );
    }

    #[test]
    fn test_filter_options_rank_then_recent() {
        let counts = BTreeMap::from([("a1111".to_string(), 3), ("comfyui".to_string(), 9)]);
        let recent = vec!["fooocus".to_string(), "comfyui".to_string()];
        assert_eq!(
            filter_options(Some(&counts), &recent),
            vec!["comfyui", "a1111", "fooocus"]
        );
        assert_eq!(filter_options(None, &recent), recent);
    }

    #[test]
    fn test_cycle_option_wraps_to_none() {
        let options = vec!["a".to_string(), "b".to_string()];
        assert_eq!(cycle_option(None, &options).as_deref(), Some("a"));
        assert_eq!(cycle_option(Some("a"), &options).as_deref(), Some("b"));
        assert_eq!(cycle_option(Some("b"), &options), None);
        assert_eq!(cycle_option(Some("gone"), &options).as_deref(), Some("a"));
        assert_eq!(cycle_option(None, &[]), None);
    }
}
