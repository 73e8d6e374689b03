use ratatui::layout::{Constraint, Flex, Layout, Rect};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Truncate a string to fit within the given display width, marking the cut with "…"
pub fn truncate_by_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let mut result = String::new();
    let mut current_width = 0;
    for ch in s.chars() {
        let char_width = ch.width().unwrap_or(0);
        if current_width + char_width + 1 > max_width {
            break;
        }
        result.push(ch);
        current_width += char_width;
    }
    result.push('…');
    result
}

/// Number of lines `s` occupies when wrapped at `width` columns
pub fn wrapped_line_count(s: &str, width: usize) -> usize {
    if width == 0 {
        return 1;
    }
    s.width().div_ceil(width).max(1)
}

/// Helper function to center a rect within another rect
pub fn center_area(area: Rect, horizontal: Constraint, vertical: Constraint) -> Rect {
    let [area] = Layout::horizontal([horizontal])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::vertical([vertical]).flex(Flex::Center).areas(area);
    area
}

pub fn center_image(image_dimensions: Rect, available_area: Rect) -> Rect {
    let width = image_dimensions.width.min(available_area.width);
    let height = image_dimensions.height.min(available_area.height);
    Rect {
        x: available_area.x + (available_area.width - width) / 2,
        y: available_area.y + (available_area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_marks_cut() {
        assert_eq!(truncate_by_width("sunset", 10), "sunset");
        assert_eq!(truncate_by_width("sunset over sea", 7), "sunset…");
        assert_eq!(truncate_by_width("日本語タイトル", 5), "日本…");
        assert_eq!(truncate_by_width("abc", 0), "");
    }

    #[test]
    fn test_wrapped_line_count() {
        assert_eq!(wrapped_line_count("", 10), 1);
        assert_eq!(wrapped_line_count("0123456789", 10), 1);
        assert_eq!(wrapped_line_count("0123456789a", 10), 2);
    }

    #[test]
    fn test_center_image_clamps_to_area() {
        let area = Rect::new(10, 5, 20, 10);
        let centered = center_image(Rect::new(0, 0, 10, 4), area);
        assert_eq!(centered, Rect::new(15, 8, 10, 4));
        let clamped = center_image(Rect::new(0, 0, 40, 40), area);
        assert_eq!(clamped, area);
    }
}
