use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
};

use crate::api::LogRecord;
use crate::app::config::Config;
use crate::ui::utils::{truncate_by_width, wrapped_line_count};
use unicode_width::UnicodeWidthStr;

/// Title lines shown at most in masonry mode
const MAX_TITLE_LINES: usize = 3;
const SELECTION_MARKER_WIDTH: usize = 4;

#[derive(Debug, Clone, Copy, Default)]
pub struct CardState {
    pub under_cursor: bool,
    pub selected: bool,
    pub selecting: bool,
}

/// Rows a card needs: borders, title, meta and tags
pub fn card_height(record: &LogRecord, inner_width: usize, wrap_title: bool, selecting: bool) -> u16 {
    let title_lines = if wrap_title {
        let marker = if selecting { SELECTION_MARKER_WIDTH } else { 0 };
        let width = inner_width.saturating_sub(marker);
        wrapped_line_count(&title_text(record), width).min(MAX_TITLE_LINES)
    } else {
        1
    };
    let tag_lines = usize::from(!record.tool_names.is_empty() || !record.model_names.is_empty());
    (2 + title_lines + 1 + tag_lines) as u16
}

pub fn create_card<'a>(
    record: &LogRecord,
    state: CardState,
    config: &Config,
    inner_width: usize,
    wrap_title: bool,
) -> Paragraph<'a> {
    let colors = &config.colors;
    let border_color = if state.under_cursor {
        colors.cursor_color()
    } else if state.selected {
        colors.selected_color()
    } else {
        colors.border_color()
    };

    let title = title_text(record);
    let title = if state.selecting {
        let marker = if state.selected { "[x] " } else { "[ ] " };
        format!("{}{}", marker, title)
    } else {
        title
    };
    let title = if wrap_title {
        title
    } else {
        truncate_by_width(&title, inner_width)
    };

    let mut title_style = Style::default().fg(colors.card_title_color());
    if state.under_cursor {
        title_style = title_style.add_modifier(Modifier::BOLD);
    }

    let mut lines = vec![Line::from(Span::styled(title, title_style))];

    let meta_width = if record.is_sensitive {
        inner_width.saturating_sub(2)
    } else {
        inner_width
    };
    let mut meta = vec![Span::styled(
        truncate_by_width(&meta_text(record), meta_width),
        Style::default().fg(colors.card_meta_color()),
    )];
    if record.is_sensitive {
        meta.push(Span::styled(" ⚑", Style::default().fg(colors.sensitive_color())));
    }
    lines.push(Line::from(meta));

    if !record.tool_names.is_empty() || !record.model_names.is_empty() {
        let mut tags = Vec::new();
        let mut used = 0;
        let tagged = record
            .tool_names
            .iter()
            .map(|t| (t, colors.tool_tag_color()))
            .chain(record.model_names.iter().map(|m| (m, colors.model_tag_color())));
        for (tag, color) in tagged {
            let sep = usize::from(!tags.is_empty());
            let text = truncate_by_width(tag, inner_width.saturating_sub(used + sep));
            if text.is_empty() {
                break;
            }
            if sep == 1 {
                tags.push(Span::raw(" "));
            }
            used += sep + text.width();
            tags.push(Span::styled(text, Style::default().fg(color)));
        }
        lines.push(Line::from(tags));
    }

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color)),
    );
    if wrap_title {
        paragraph.wrap(Wrap { trim: true })
    } else {
        paragraph
    }
}

fn title_text(record: &LogRecord) -> String {
    if record.title.trim().is_empty() {
        format!("#{}", record.id)
    } else {
        record.title.clone()
    }
}

fn meta_text(record: &LogRecord) -> String {
    let created = record
        .created_at
        .with_timezone(&chrono::Local)
        .format("%Y-%m-%d %H:%M");
    let images = match record.output_asset_count {
        0 => String::new(),
        1 => " · 1 image".to_string(),
        n => format!(" · {} images", n),
    };
    format!("{} · {}{}", record.record_type.as_query_value(), created, images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery::orchestrator::testing::record;

    #[test]
    fn test_card_height_counts_wrapped_title() {
        let mut long = record(1, "a very long title that wraps", 0);
        assert_eq!(card_height(&long, 10, false, false), 5);
        assert_eq!(card_height(&long, 10, true, false), 7);
        assert_eq!(card_height(&long, 14, true, true), 7);

        long.tool_names.clear();
        long.model_names.clear();
        assert_eq!(card_height(&long, 100, true, false), 4);
    }

    #[test]
    fn test_untitled_record_shows_id() {
        assert_eq!(title_text(&record(42, "  ", 0)), "#42");
    }
}
