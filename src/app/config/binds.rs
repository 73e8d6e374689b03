use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyModifiers};
use serde::{Deserialize, Serialize};

use crate::app::actions::GalleryAction;

pub type KeyMap = HashMap<(KeyModifiers, KeyCode), GalleryAction>;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BindsConfig {
    #[serde(default = "BindsConfig::default_quit")]
    pub quit: Vec<String>,
    #[serde(default = "BindsConfig::default_refresh")]
    pub refresh: Vec<String>,
    #[serde(default = "BindsConfig::default_move_left")]
    pub move_left: Vec<String>,
    #[serde(default = "BindsConfig::default_move_right")]
    pub move_right: Vec<String>,
    #[serde(default = "BindsConfig::default_move_up")]
    pub move_up: Vec<String>,
    #[serde(default = "BindsConfig::default_move_down")]
    pub move_down: Vec<String>,
    #[serde(default = "BindsConfig::default_next_page")]
    pub next_page: Vec<String>,
    #[serde(default = "BindsConfig::default_previous_page")]
    pub previous_page: Vec<String>,
    #[serde(default = "BindsConfig::default_cycle_sort")]
    pub cycle_sort: Vec<String>,
    #[serde(default = "BindsConfig::default_toggle_view_mode")]
    pub toggle_view_mode: Vec<String>,
    #[serde(default = "BindsConfig::default_cycle_type_filter")]
    pub cycle_type_filter: Vec<String>,
    #[serde(default = "BindsConfig::default_cycle_tool_filter")]
    pub cycle_tool_filter: Vec<String>,
    #[serde(default = "BindsConfig::default_cycle_model_filter")]
    pub cycle_model_filter: Vec<String>,
    #[serde(default = "BindsConfig::default_search")]
    pub search: Vec<String>,
    #[serde(default = "BindsConfig::default_clear_filters")]
    pub clear_filters: Vec<String>,
    #[serde(default = "BindsConfig::default_toggle_selection_mode")]
    pub toggle_selection_mode: Vec<String>,
    #[serde(default = "BindsConfig::default_toggle_selected")]
    pub toggle_selected: Vec<String>,
    #[serde(default = "BindsConfig::default_toggle_select_all")]
    pub toggle_select_all: Vec<String>,
    #[serde(default = "BindsConfig::default_bulk_delete")]
    pub bulk_delete: Vec<String>,
    #[serde(default = "BindsConfig::default_bulk_download")]
    pub bulk_download: Vec<String>,
    #[serde(default = "BindsConfig::default_download_cover")]
    pub download_cover: Vec<String>,
    #[serde(default = "BindsConfig::default_reveal")]
    pub reveal: Vec<String>,
    #[serde(default = "BindsConfig::default_open_viewer")]
    pub open_viewer: Vec<String>,
    #[serde(default = "BindsConfig::default_hide")]
    pub hide: Vec<String>,
    #[serde(default = "BindsConfig::default_back")]
    pub back: Vec<String>,
}

/// Field names accepted in the `[binds]` section
pub const KNOWN_BINDS_FIELDS: &[&str] = &[
    "quit",
    "refresh",
    "move_left",
    "move_right",
    "move_up",
    "move_down",
    "next_page",
    "previous_page",
    "cycle_sort",
    "toggle_view_mode",
    "cycle_type_filter",
    "cycle_tool_filter",
    "cycle_model_filter",
    "search",
    "clear_filters",
    "toggle_selection_mode",
    "toggle_selected",
    "toggle_select_all",
    "bulk_delete",
    "bulk_download",
    "download_cover",
    "reveal",
    "open_viewer",
    "hide",
    "back",
];

fn keys(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl BindsConfig {
    fn default_quit() -> Vec<String> {
        keys(&["q", "ctrl-c"])
    }
    fn default_refresh() -> Vec<String> {
        keys(&["r", "f5"])
    }
    fn default_move_left() -> Vec<String> {
        keys(&["left", "h"])
    }
    fn default_move_right() -> Vec<String> {
        keys(&["right", "l"])
    }
    fn default_move_up() -> Vec<String> {
        keys(&["up", "k"])
    }
    fn default_move_down() -> Vec<String> {
        keys(&["down", "j"])
    }
    fn default_next_page() -> Vec<String> {
        keys(&["pagedown", "]", "n"])
    }
    fn default_previous_page() -> Vec<String> {
        keys(&["pageup", "[", "p"])
    }
    fn default_cycle_sort() -> Vec<String> {
        keys(&["s"])
    }
    fn default_toggle_view_mode() -> Vec<String> {
        keys(&["m"])
    }
    fn default_cycle_type_filter() -> Vec<String> {
        keys(&["t"])
    }
    fn default_cycle_tool_filter() -> Vec<String> {
        keys(&["shift-t"])
    }
    fn default_cycle_model_filter() -> Vec<String> {
        keys(&["shift-m"])
    }
    fn default_search() -> Vec<String> {
        keys(&["/"])
    }
    fn default_clear_filters() -> Vec<String> {
        keys(&["c"])
    }
    fn default_toggle_selection_mode() -> Vec<String> {
        keys(&["v"])
    }
    fn default_toggle_selected() -> Vec<String> {
        keys(&["space"])
    }
    fn default_toggle_select_all() -> Vec<String> {
        keys(&["a"])
    }
    fn default_bulk_delete() -> Vec<String> {
        keys(&["shift-d", "delete"])
    }
    fn default_bulk_download() -> Vec<String> {
        keys(&["d"])
    }
    fn default_download_cover() -> Vec<String> {
        keys(&["shift-s"])
    }
    fn default_reveal() -> Vec<String> {
        keys(&["enter"])
    }
    fn default_open_viewer() -> Vec<String> {
        keys(&["f"])
    }
    fn default_hide() -> Vec<String> {
        keys(&["x"])
    }
    fn default_back() -> Vec<String> {
        keys(&["esc"])
    }

    pub fn parse_keybinding(key_str: &str) -> Option<(KeyModifiers, KeyCode)> {
        let key_str = key_str.to_lowercase();

        // Special case for standalone "-" character
        if key_str == "-" {
            return Some((KeyModifiers::NONE, KeyCode::Char('-')));
        }

        let parts: Vec<&str> = key_str.split('-').collect();
        let (key_part, modifier_parts) = parts.split_last()?;

        let mut modifiers = KeyModifiers::NONE;
        for part in modifier_parts {
            match *part {
                "ctrl" => modifiers |= KeyModifiers::CONTROL,
                "alt" => modifiers |= KeyModifiers::ALT,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                _ => return None,
            }
        }

        let code = match *key_part {
            "esc" => KeyCode::Esc,
            "enter" => KeyCode::Enter,
            "backspace" => KeyCode::Backspace,
            "tab" => KeyCode::Tab,
            "delete" => KeyCode::Delete,
            "insert" => KeyCode::Insert,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" => KeyCode::PageUp,
            "pagedown" => KeyCode::PageDown,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "space" => KeyCode::Char(' '),
            f if f.len() > 1 && f.starts_with('f') => KeyCode::F(f[1..].parse().ok()?),
            c => {
                let mut chars = c.chars();
                let ch = chars.next()?;
                if chars.next().is_some() {
                    return None;
                }
                if modifiers.contains(KeyModifiers::SHIFT) {
                    KeyCode::Char(ch.to_ascii_uppercase())
                } else {
                    KeyCode::Char(ch)
                }
            }
        };

        Some(normalize_key(modifiers, code))
    }

    fn bindings(&self) -> [(&Vec<String>, GalleryAction); 25] {
        [
            (&self.quit, GalleryAction::Quit),
            (&self.refresh, GalleryAction::Refresh),
            (&self.move_left, GalleryAction::MoveLeft),
            (&self.move_right, GalleryAction::MoveRight),
            (&self.move_up, GalleryAction::MoveUp),
            (&self.move_down, GalleryAction::MoveDown),
            (&self.next_page, GalleryAction::NextPage),
            (&self.previous_page, GalleryAction::PreviousPage),
            (&self.cycle_sort, GalleryAction::CycleSort),
            (&self.toggle_view_mode, GalleryAction::ToggleViewMode),
            (&self.cycle_type_filter, GalleryAction::CycleTypeFilter),
            (&self.cycle_tool_filter, GalleryAction::CycleToolFilter),
            (&self.cycle_model_filter, GalleryAction::CycleModelFilter),
            (&self.search, GalleryAction::Search),
            (&self.clear_filters, GalleryAction::ClearFilters),
            (&self.toggle_selection_mode, GalleryAction::ToggleSelectionMode),
            (&self.toggle_selected, GalleryAction::ToggleSelected),
            (&self.toggle_select_all, GalleryAction::ToggleSelectAll),
            (&self.bulk_delete, GalleryAction::BulkDelete),
            (&self.bulk_download, GalleryAction::BulkDownload),
            (&self.download_cover, GalleryAction::DownloadCover),
            (&self.reveal, GalleryAction::Reveal),
            (&self.open_viewer, GalleryAction::OpenViewer),
            (&self.hide, GalleryAction::Hide),
            (&self.back, GalleryAction::Back),
        ]
    }

    /// First configured key for `action`, for help text
    pub fn first_key(&self, action: GalleryAction) -> Option<&str> {
        self.bindings()
            .into_iter()
            .find(|(_, a)| *a == action)
            .and_then(|(keys, _)| keys.first())
            .map(String::as_str)
    }

    /// Lookup table from key to action. Unparseable bindings are logged and skipped.
    pub fn build_key_map(&self) -> KeyMap {
        let mut map = KeyMap::new();
        for (bindings, action) in self.bindings() {
            for binding in bindings {
                match Self::parse_keybinding(binding) {
                    Some(key) => {
                        if let Some(previous) = map.insert(key, action) {
                            log::warn!(
                                "Key '{}' bound to both {} and {}, using {}",
                                binding,
                                previous,
                                action,
                                action
                            );
                        }
                    }
                    None => log::warn!("Ignoring invalid key binding '{}' for {}", binding, action),
                }
            }
        }
        map
    }
}

/// Character keys carry shift in their case, so the modifier is dropped
pub fn normalize_key(modifiers: KeyModifiers, code: KeyCode) -> (KeyModifiers, KeyCode) {
    match code {
        KeyCode::Char(_) => (modifiers - KeyModifiers::SHIFT, code),
        _ => (modifiers, code),
    }
}

impl Default for BindsConfig {
    fn default() -> Self {
        Self {
            quit: Self::default_quit(),
            refresh: Self::default_refresh(),
            move_left: Self::default_move_left(),
            move_right: Self::default_move_right(),
            move_up: Self::default_move_up(),
            move_down: Self::default_move_down(),
            next_page: Self::default_next_page(),
            previous_page: Self::default_previous_page(),
            cycle_sort: Self::default_cycle_sort(),
            toggle_view_mode: Self::default_toggle_view_mode(),
            cycle_type_filter: Self::default_cycle_type_filter(),
            cycle_tool_filter: Self::default_cycle_tool_filter(),
            cycle_model_filter: Self::default_cycle_model_filter(),
            search: Self::default_search(),
            clear_filters: Self::default_clear_filters(),
            toggle_selection_mode: Self::default_toggle_selection_mode(),
            toggle_selected: Self::default_toggle_selected(),
            toggle_select_all: Self::default_toggle_select_all(),
            bulk_delete: Self::default_bulk_delete(),
            bulk_download: Self::default_bulk_download(),
            download_cover: Self::default_download_cover(),
            reveal: Self::default_reveal(),
            open_viewer: Self::default_open_viewer(),
            hide: Self::default_hide(),
            back: Self::default_back(),
        }
    }
}
