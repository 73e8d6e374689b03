//! Client-side state that outlives a single view but not the process,
//! plus the persisted most-recently-used tag lists.

pub mod recent_tags;

use std::cell::Cell;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use recent_tags::RecentTags;

/// How the record grid is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Uniform cards filled row by row
    #[default]
    Grid,
    /// Variable-height cards packed into the shortest column
    Masonry,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Grid => ViewMode::Masonry,
            ViewMode::Masonry => ViewMode::Grid,
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewMode::Grid => write!(f, "grid"),
            ViewMode::Masonry => write!(f, "masonry"),
        }
    }
}

/// Session-scoped flags shared between the list view and mutating flows
#[derive(Debug, Default)]
pub struct SessionState {
    view_mode: Cell<ViewMode>,
    refresh_requested: Cell<bool>,
}

impl SessionState {
    pub fn new(view_mode: ViewMode) -> Self {
        Self {
            view_mode: Cell::new(view_mode),
            refresh_requested: Cell::new(false),
        }
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode.get()
    }

    pub fn set_view_mode(&self, mode: ViewMode) {
        self.view_mode.set(mode);
    }

    /// Ask the next list load to bypass the cache
    pub fn request_refresh(&self) {
        self.refresh_requested.set(true);
    }

    /// Read and clear the refresh request; returns true at most once per request
    pub fn take_refresh_request(&self) -> bool {
        self.refresh_requested.replace(false)
    }

    pub fn refresh_pending(&self) -> bool {
        self.refresh_requested.get()
    }
}
