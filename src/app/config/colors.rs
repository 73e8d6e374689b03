use ratatui::style::Color;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ColorsConfig {
    #[serde(default = "ColorsConfig::default_border")]
    pub border: String,
    #[serde(default = "ColorsConfig::default_border_title")]
    pub border_title: String,
    #[serde(default = "ColorsConfig::default_card_title")]
    pub card_title: String,
    #[serde(default = "ColorsConfig::default_card_meta")]
    pub card_meta: String,
    #[serde(default = "ColorsConfig::default_tool_tag")]
    pub tool_tag: String,
    #[serde(default = "ColorsConfig::default_model_tag")]
    pub model_tag: String,
    #[serde(default = "ColorsConfig::default_cursor")]
    pub cursor: String,
    #[serde(default = "ColorsConfig::default_selected")]
    pub selected: String,
    #[serde(default = "ColorsConfig::default_sensitive")]
    pub sensitive: String,
    #[serde(default = "ColorsConfig::default_status_info")]
    pub status_info: String,
    #[serde(default = "ColorsConfig::default_status_error")]
    pub status_error: String,
}

impl ColorsConfig {
    /// Parse a hex color string like "#FF5500" into RGB values
    pub fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some((r, g, b))
    }

    fn color(hex: &str, fallback: Color) -> Color {
        Self::parse_hex(hex)
            .map(|(r, g, b)| Color::Rgb(r, g, b))
            .unwrap_or(fallback)
    }

    pub fn border_color(&self) -> Color {
        Self::color(&self.border, Color::White)
    }

    pub fn border_title_color(&self) -> Color {
        Self::color(&self.border_title, Color::White)
    }

    pub fn card_title_color(&self) -> Color {
        Self::color(&self.card_title, Color::White)
    }

    pub fn card_meta_color(&self) -> Color {
        Self::color(&self.card_meta, Color::Gray)
    }

    pub fn tool_tag_color(&self) -> Color {
        Self::color(&self.tool_tag, Color::Blue)
    }

    pub fn model_tag_color(&self) -> Color {
        Self::color(&self.model_tag, Color::Green)
    }

    pub fn cursor_color(&self) -> Color {
        Self::color(&self.cursor, Color::Yellow)
    }

    pub fn selected_color(&self) -> Color {
        Self::color(&self.selected, Color::Cyan)
    }

    pub fn sensitive_color(&self) -> Color {
        Self::color(&self.sensitive, Color::Red)
    }

    pub fn status_info_color(&self) -> Color {
        Self::color(&self.status_info, Color::Green)
    }

    pub fn status_error_color(&self) -> Color {
        Self::color(&self.status_error, Color::Red)
    }
}

impl ColorsConfig {
    fn default_border() -> String {
        "#fae280".to_string()
    }

    fn default_border_title() -> String {
        "#8193af".to_string()
    }

    fn default_card_title() -> String {
        "#fae280".to_string()
    }

    fn default_card_meta() -> String {
        "#8193af".to_string()
    }

    fn default_tool_tag() -> String {
        "#26a0a1".to_string()
    }

    fn default_model_tag() -> String {
        "#d67751".to_string()
    }

    fn default_cursor() -> String {
        "#b18a4a".to_string()
    }

    fn default_selected() -> String {
        "#26a0a1".to_string()
    }

    fn default_sensitive() -> String {
        "#e16a7c".to_string()
    }

    fn default_status_info() -> String {
        "#26a0a1".to_string()
    }

    fn default_status_error() -> String {
        "#e16a7c".to_string()
    }
}

impl Default for ColorsConfig {
    fn default() -> Self {
        Self {
            border: Self::default_border(),
            border_title: Self::default_border_title(),
            card_title: Self::default_card_title(),
            card_meta: Self::default_card_meta(),
            tool_tag: Self::default_tool_tag(),
            model_tag: Self::default_model_tag(),
            cursor: Self::default_cursor(),
            selected: Self::default_selected(),
            sensitive: Self::default_sensitive(),
            status_info: Self::default_status_info(),
            status_error: Self::default_status_error(),
        }
    }
}
