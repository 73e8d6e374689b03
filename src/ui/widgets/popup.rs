use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};
use ratatui_image::protocol::StatefulProtocol;
use unicode_width::UnicodeWidthStr;

use crate::app::config::Config;
use crate::ui::utils::truncate_by_width;
use crate::ui::widgets::render_image_widget;

/// Render config warnings popup centered on screen
pub fn render_config_warnings_popup(frame: &mut Frame, warnings: &[String], config: &Config) {
    let area = frame.area();

    let title = " Config Warnings ";
    let footer = "Press any key to close";

    let max_content_width = warnings
        .iter()
        .map(|w| w.width())
        .max()
        .unwrap_or(20)
        .max(title.width())
        .max(footer.width());

    // Popup width: content + padding (2 on each side) + borders (1 on each side)
    let inner_width = max_content_width + 4;
    let popup_width = (inner_width + 2).min((area.width as usize).saturating_sub(4)) as u16;
    let text_width = popup_width.saturating_sub(4) as usize;

    // Popup height: warnings + empty line after title + empty line before footer + footer + borders (2)
    let popup_height = (warnings.len() + 5).min((area.height as usize).saturating_sub(4)) as u16;

    let popup_area = Rect {
        x: area.width.saturating_sub(popup_width) / 2,
        y: area.height.saturating_sub(popup_height) / 2,
        width: popup_width,
        height: popup_height,
    };

    frame.render_widget(Clear, popup_area);

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(""));
    for warning in warnings {
        lines.push(Line::from(Span::styled(
            format!(" {}", truncate_by_width(warning, text_width)),
            Style::default().fg(config.colors.card_title_color()),
        )));
    }
    lines.push(Line::from(""));
    lines.push(
        Line::from(Span::styled(
            footer,
            Style::default().fg(config.colors.card_meta_color()),
        ))
        .centered(),
    );

    let popup_block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(config.colors.status_error_color()))
        .title(Line::from(title).fg(config.colors.border_title_color()))
        .style(Style::default().bg(Color::Black));

    let popup_text = Paragraph::new(lines)
        .block(popup_block)
        .alignment(Alignment::Left);

    frame.render_widget(popup_text, popup_area);
}

/// Full-size image viewer drawn over everything else
pub fn render_viewer_popup(
    frame: &mut Frame,
    protocol: Option<&mut StatefulProtocol>,
    title: &str,
    config: &Config,
) {
    let area = frame.area();
    let popup_area = Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    };
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(config.colors.cursor_color()))
        .title(Line::from(format!(" {} ", title)).fg(config.colors.border_title_color()))
        .title_bottom(Line::from(" Esc to close ").fg(config.colors.card_meta_color()))
        .style(Style::default().bg(Color::Black));
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    render_image_widget(frame, protocol, inner, "Loading...");
}
