use ratatui::{
    layout::{Constraint, Rect},
    style::{Style, Stylize},
    widgets::Paragraph,
};
use ratatui_image::protocol::StatefulProtocol;
use ratatui_image::{Resize, StatefulImage};
use unicode_width::UnicodeWidthStr;

use crate::ui::utils::*;

/// Draw `protocol` scaled and centered in `image_area`, or `placeholder` when absent
pub fn render_image_widget(
    frame: &mut ratatui::Frame<'_>,
    protocol: Option<&mut StatefulProtocol>,
    image_area: Rect,
    placeholder: &str,
) {
    use image::imageops::FilterType;

    if let Some(img) = protocol {
        // Get the image dimensions after resizing for the available area
        let resize = Resize::Scale(Some(FilterType::Lanczos3));
        let img_rect = img.size_for(resize.clone(), image_area);

        let centered_area = center_image(img_rect, image_area);

        let image = StatefulImage::default().resize(resize);
        frame.render_stateful_widget(image, centered_area, img);
    } else {
        let width = (placeholder.width() as u16).min(image_area.width);
        let placeholder_area =
            center_area(image_area, Constraint::Length(width), Constraint::Length(1));
        let placeholder = Paragraph::new(placeholder.to_string()).style(Style::default().dark_gray());
        frame.render_widget(placeholder, placeholder_area);
    }
}
