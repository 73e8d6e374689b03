use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};

use crate::app::actions::GalleryAction;
use crate::app::config::Config;
use crate::app::{App, MessageType};
use crate::reveal::LoadState;
use crate::session::ViewMode;
use crate::ui::gallery::{column_strips, grid_slots, masonry_slots};
use crate::ui::grid_pane_width;
use crate::ui::utils::truncate_by_width;
use crate::ui::widgets::{
    CardState, card_height, create_card, render_config_warnings_popup, render_image_widget,
    render_viewer_popup,
};

/// Actions advertised in the help line, in display order
const HELP_ACTIONS: [GalleryAction; 11] = [
    GalleryAction::Quit,
    GalleryAction::Refresh,
    GalleryAction::Search,
    GalleryAction::CycleSort,
    GalleryAction::ToggleViewMode,
    GalleryAction::CycleTypeFilter,
    GalleryAction::ToggleSelectionMode,
    GalleryAction::BulkDelete,
    GalleryAction::BulkDownload,
    GalleryAction::Reveal,
    GalleryAction::OpenViewer,
];

fn bordered_block<'a>(title: String, config: &Config) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(config.colors.border_color()))
        .title(Span::styled(
            format!(" {} ", title),
            Style::default().fg(config.colors.border_title_color()),
        ))
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let config = &app.config;
    let view = app.orchestrator.view();
    let meta = Style::default().fg(config.colors.card_meta_color());
    let accent = Style::default().fg(config.colors.card_title_color());

    let mut spans = vec![
        Span::styled(
            format!(
                "Page {}/{}",
                app.query.page,
                app.query.page_count(view.total)
            ),
            accent,
        ),
        Span::styled(format!(" · {} records", view.total), meta),
        Span::styled(format!(" · {}", app.query.sort.label()), meta),
        Span::styled(format!(" · {}", app.orchestrator.session().view_mode()), meta),
    ];
    if !app.query.search.is_empty() {
        spans.push(Span::styled(format!(" · \"{}\"", app.query.search), accent));
    }
    if let Some(record_type) = app.query.record_type {
        spans.push(Span::styled(
            format!(" · {}", record_type.as_query_value()),
            meta,
        ));
    }
    if let Some(tool) = &app.query.tool {
        spans.push(Span::styled(
            format!(" · {}", tool),
            Style::default().fg(config.colors.tool_tag_color()),
        ));
    }
    if let Some(model) = &app.query.model {
        spans.push(Span::styled(
            format!(" · {}", model),
            Style::default().fg(config.colors.model_tag_color()),
        ));
    }
    if app.selection.is_selecting() {
        spans.push(Span::styled(
            format!(" · {} selected", app.selection.len()),
            Style::default().fg(config.colors.selected_color()),
        ));
    }
    if view.loading {
        spans.push(Span::styled(" · Loading...", meta));
    }

    let header = Paragraph::new(Line::from(spans))
        .block(bordered_block("Vault Gallery".to_string(), config));
    frame.render_widget(header, area);
}

/// Draws the cards and returns the card indices of each column as placed
fn render_gallery(frame: &mut Frame, app: &App, area: Rect) -> Vec<Vec<usize>> {
    let config = &app.config;
    let view = app.orchestrator.view();
    let block = bordered_block("Records".to_string(), config);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if view.items.is_empty() {
        let text = match &view.error {
            Some(error) => Span::styled(
                error.clone(),
                Style::default().fg(config.colors.status_error_color()),
            ),
            None => Span::styled(
                "No records",
                Style::default().fg(config.colors.card_meta_color()),
            ),
        };
        frame.render_widget(Paragraph::new(Line::from(text).centered()), inner);
        return Vec::new();
    }

    let columns = app.layout.columns();
    let masonry = app.orchestrator.session().view_mode() == ViewMode::Masonry;
    let selecting = app.selection.is_selecting();
    let card_inner = column_strips(inner, columns)
        .first()
        .map(|(_, w)| w.saturating_sub(2) as usize)
        .unwrap_or(0);

    let heights: Vec<u16> = view
        .items
        .iter()
        .map(|record| card_height(record, card_inner, masonry, selecting))
        .collect();
    let (slots, placed) = if masonry {
        (
            masonry_slots(inner, &heights, columns, app.cursor),
            crate::layout::masonry(&heights, columns),
        )
    } else {
        (
            grid_slots(inner, &heights, columns, app.cursor),
            crate::layout::grid(heights.len(), columns),
        )
    };

    for slot in slots {
        let record = &view.items[slot.index];
        let state = CardState {
            under_cursor: slot.index == app.cursor,
            selected: app.selection.is_selected(record.id),
            selecting,
        };
        let inner_width = slot.area.width.saturating_sub(2) as usize;
        frame.render_widget(
            create_card(record, state, config, inner_width, masonry),
            slot.area,
        );
    }
    placed
}

fn render_preview(frame: &mut Frame, app: &mut App, area: Rect) {
    let record = app.current_record();
    let title = record
        .as_ref()
        .map(|r| truncate_by_width(&r.title, area.width.saturating_sub(4) as usize))
        .unwrap_or_else(|| "Preview".to_string());
    let block = bordered_block(title, &app.config);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [image_area, info_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(inner);

    let colors = &app.config.colors;
    let meta = Style::default().fg(colors.card_meta_color());
    let mut lines = Vec::new();
    let placeholder = match app.preview.gate() {
        None => "No image",
        Some(gate) => {
            if gate.is_blurred() {
                lines.push(Line::from(Span::styled(
                    "Sensitive content · reveal to show",
                    Style::default().fg(colors.sensitive_color()),
                )));
            } else if gate.is_sensitive() {
                lines.push(Line::from(Span::styled("Revealed · hide to blur", meta)));
            }
            match gate.load_state() {
                LoadState::Loading if gate.retry_count() > 0 => {
                    lines.push(Line::from(Span::styled(
                        format!("Retrying ({})", gate.retry_count()),
                        meta,
                    )));
                    "Loading..."
                }
                LoadState::Loading => "Loading...",
                LoadState::Failed => "Image unavailable",
                LoadState::Loaded => "",
            }
        }
    };
    if let Some(record) = &record {
        let tags: Vec<&str> = record
            .tool_names
            .iter()
            .chain(&record.model_names)
            .map(String::as_str)
            .collect();
        if !tags.is_empty() {
            lines.push(Line::from(Span::styled(
                truncate_by_width(&tags.join(", "), info_area.width as usize),
                meta,
            )));
        }
    }
    frame.render_widget(Paragraph::new(lines), info_area);

    render_image_widget(frame, app.preview.thumbnail.as_mut(), image_area, placeholder);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let colors = &app.config.colors;
    if let Some(input) = &app.search_input {
        let prompt = Line::from(vec![
            Span::styled("/", Style::default().fg(colors.card_title_color())),
            Span::raw(truncate_by_width(input, area.width.saturating_sub(2) as usize)),
            Span::styled("▏", Style::default().fg(colors.cursor_color())),
        ]);
        frame.render_widget(Paragraph::new(prompt), area);
        return;
    }
    let line = match &app.status_message {
        Some(message) => {
            let color = match message.message_type {
                MessageType::Info | MessageType::Success => colors.status_info_color(),
                MessageType::Warning => colors.sensitive_color(),
                MessageType::Error => colors.status_error_color(),
            };
            Line::from(Span::styled(message.text.clone(), Style::default().fg(color)))
        }
        None => {
            let hints: Vec<String> = HELP_ACTIONS
                .iter()
                .filter_map(|&action| {
                    app.config
                        .binds
                        .first_key(action)
                        .map(|key| format!("{} {}", key, action.label()))
                })
                .collect();
            Line::from(Span::styled(
                truncate_by_width(&hints.join(" · "), area.width as usize),
                Style::default().fg(colors.card_meta_color()),
            ))
        }
    };
    frame.render_widget(Paragraph::new(line), area);
}

/// Renders the user interface.
pub fn render(frame: &mut Frame<'_>, app: &mut App) {
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let [gallery_area, preview_area] = Layout::horizontal([
        Constraint::Length(grid_pane_width(body_area.width)),
        Constraint::Min(0),
    ])
    .areas(body_area);

    render_header(frame, app, header_area);
    app.card_columns = render_gallery(frame, app, gallery_area);
    render_preview(frame, app, preview_area);
    render_footer(frame, app, footer_area);

    if app.preview.is_viewing() {
        let title = app
            .current_record()
            .map(|r| r.title)
            .unwrap_or_default();
        render_viewer_popup(frame, app.preview.viewer.as_mut(), &title, &app.config);
    }

    if app.show_config_warnings_popup && !app.config_warnings.is_empty() {
        render_config_warnings_popup(frame, &app.config_warnings, &app.config);
    }
}
