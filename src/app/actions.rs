use std::fmt;

/// Everything a key binding can trigger in browse mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GalleryAction {
    // Application
    Quit,
    Refresh,

    // Cursor
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,

    // Paging and ordering
    NextPage,
    PreviousPage,
    CycleSort,
    ToggleViewMode,

    // Filters
    CycleTypeFilter,
    CycleToolFilter,
    CycleModelFilter,
    Search,
    ClearFilters,

    // Selection
    ToggleSelectionMode,
    ToggleSelected,
    ToggleSelectAll,
    BulkDelete,
    BulkDownload,
    DownloadCover,

    // Sensitive previews
    Reveal,
    OpenViewer,
    Hide,
    Back,
}

impl GalleryAction {
    /// Short label used in the help line
    pub fn label(&self) -> &'static str {
        match self {
            GalleryAction::Quit => "quit",
            GalleryAction::Refresh => "refresh",
            GalleryAction::MoveLeft => "left",
            GalleryAction::MoveRight => "right",
            GalleryAction::MoveUp => "up",
            GalleryAction::MoveDown => "down",
            GalleryAction::NextPage => "next page",
            GalleryAction::PreviousPage => "prev page",
            GalleryAction::CycleSort => "sort",
            GalleryAction::ToggleViewMode => "view",
            GalleryAction::CycleTypeFilter => "type",
            GalleryAction::CycleToolFilter => "tool",
            GalleryAction::CycleModelFilter => "model",
            GalleryAction::Search => "search",
            GalleryAction::ClearFilters => "clear filters",
            GalleryAction::ToggleSelectionMode => "select mode",
            GalleryAction::ToggleSelected => "select",
            GalleryAction::ToggleSelectAll => "select all",
            GalleryAction::BulkDelete => "delete",
            GalleryAction::BulkDownload => "download",
            GalleryAction::DownloadCover => "save image",
            GalleryAction::Reveal => "reveal",
            GalleryAction::OpenViewer => "viewer",
            GalleryAction::Hide => "hide",
            GalleryAction::Back => "back",
        }
    }
}

impl fmt::Display for GalleryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
