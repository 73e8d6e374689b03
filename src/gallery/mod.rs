pub mod archive;
pub mod orchestrator;
pub mod query;
pub mod selection;

pub use orchestrator::{CachedValue, ListOrchestrator, ListSettings, ListView, PageSource, SharedCache};
pub use query::{ListQuery, SortKey};
pub use selection::{BulkDeleteReport, BulkDownloadReport, SelectionCoordinator, SelectionMode};
