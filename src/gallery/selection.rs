//! Multi-record selection and the bulk operations that run against it.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use futures::future::join_all;

use crate::api::{ApiError, ApiResult, AssetItem, GalleryApi};
use crate::app::logging::log_bulk_operation;

use super::archive::{ArchiveBuilder, image_file_name, sanitize_name};
use super::orchestrator::ListOrchestrator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    #[default]
    Browse,
    Selecting,
}

/// Outcome of a bulk delete. The batch counts as failed if any id failed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BulkDeleteReport {
    pub succeeded: Vec<i64>,
    pub failed: Vec<(i64, ApiError)>,
}

impl BulkDeleteReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_ids(&self) -> Vec<i64> {
        self.failed.iter().map(|(id, _)| *id).collect()
    }

    pub fn user_message(&self) -> String {
        match self.failed.first() {
            None => format!("Deleted {} records", self.succeeded.len()),
            Some((_, e)) => format!("Bulk delete failed: {}", e.user_message()),
        }
    }
}

/// Outcome of a bulk download
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BulkDownloadReport {
    /// Written archive, `None` when no image could be collected
    pub archive_path: Option<PathBuf>,
    pub folders: usize,
    pub files: usize,
    pub skipped_assets: usize,
    /// Records whose details could not be fetched
    pub skipped_records: usize,
}

impl BulkDownloadReport {
    pub fn user_message(&self) -> String {
        let mut message = match &self.archive_path {
            Some(path) => format!(
                "Saved {} images from {} records to {}",
                self.files,
                self.folders,
                path.display()
            ),
            None => "No images to download in the selected records".to_string(),
        };
        if self.skipped_records > 0 {
            message.push_str(&format!(
                " ({} records could not be loaded)",
                self.skipped_records
            ));
        }
        if self.skipped_assets > 0 {
            message.push_str(&format!(" ({} images failed)", self.skipped_assets));
        }
        message
    }
}

/// Selection state over the orchestrator's current page.
///
/// The selection is dropped whenever the mode changes, a bulk operation
/// completes, or the page on screen is replaced.
#[derive(Debug, Default)]
pub struct SelectionCoordinator {
    mode: SelectionMode,
    selected: BTreeSet<i64>,
    seen_version: Option<u64>,
}

impl SelectionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn is_selecting(&self) -> bool {
        self.mode == SelectionMode::Selecting
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            SelectionMode::Browse => SelectionMode::Selecting,
            SelectionMode::Selecting => SelectionMode::Browse,
        };
        self.selected.clear();
    }

    pub fn exit(&mut self) {
        self.mode = SelectionMode::Browse;
        self.selected.clear();
    }

    pub fn is_selected(&self, id: i64) -> bool {
        self.selected.contains(&id)
    }

    pub fn selected_ids(&self) -> Vec<i64> {
        self.selected.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Drop the selection if the displayed page changed since the last call
    pub fn sync_with_view(&mut self, version: u64) {
        match self.seen_version {
            Some(seen) if seen != version => {
                if !self.selected.is_empty() {
                    log::debug!("Result set replaced, clearing {} selected", self.selected.len());
                }
                self.selected.clear();
            }
            _ => {}
        }
        self.seen_version = Some(version);
    }

    /// Flip one id. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, id: i64) -> ApiResult<bool> {
        self.require_selecting()?;
        if self.selected.remove(&id) {
            Ok(false)
        } else {
            self.selected.insert(id);
            Ok(true)
        }
    }

    /// Select every id on the page, or clear if all of them already are
    pub fn toggle_all(&mut self, page_ids: &[i64]) -> ApiResult<()> {
        self.require_selecting()?;
        let all_selected = !page_ids.is_empty() && page_ids.iter().all(|id| self.selected.contains(id));
        if all_selected {
            self.selected.clear();
        } else {
            self.selected = page_ids.iter().copied().collect();
        }
        Ok(())
    }

    /// Delete every selected record concurrently.
    ///
    /// On full success the selection is cleared, selecting mode ends and
    /// the list and tag statistics are reloaded from the server. On any
    /// failure nothing is rolled back and the selection is kept.
    pub async fn bulk_delete<A: GalleryApi>(
        &mut self,
        orchestrator: &ListOrchestrator<A>,
    ) -> ApiResult<BulkDeleteReport> {
        self.sync_with_view(orchestrator.view().version);
        let ids = self.require_selection()?;

        let api = orchestrator.api();
        let results = join_all(ids.iter().map(|&id| async move { (id, api.delete_log(id).await) })).await;

        let mut report = BulkDeleteReport::default();
        for (id, result) in results {
            match result {
                Ok(()) => report.succeeded.push(id),
                Err(e) => {
                    log::error!("Failed to delete record {}: {}", id, e);
                    report.failed.push((id, e));
                }
            }
        }
        log_bulk_operation("delete", ids.len(), report.succeeded.len(), report.failed.len());

        if report.is_success() {
            self.exit();
            if let Err(e) = orchestrator.refresh().await {
                log::warn!("Reload after bulk delete failed: {}", e);
            }
            orchestrator.load_tag_stats(true).await;
            self.seen_version = Some(orchestrator.view().version);
        }
        Ok(report)
    }

    /// Download every output image of the selected records into one zip
    /// written under `dest_dir`.
    ///
    /// Records are visited in page order, assets one at a time. Assets that
    /// fail to download are skipped.
    pub async fn bulk_download<A: GalleryApi>(
        &mut self,
        orchestrator: &ListOrchestrator<A>,
        dest_dir: &Path,
        archive_prefix: &str,
    ) -> ApiResult<BulkDownloadReport> {
        self.sync_with_view(orchestrator.view().version);
        let selected = self.require_selection()?;
        let ordered = ordered_selection(&orchestrator.view().ids(), &selected);
        let api = orchestrator.api();

        let mut builder = ArchiveBuilder::new();
        let mut skipped = 0;
        let mut skipped_records = 0;
        for id in ordered {
            let detail = match api.get_log(id).await {
                Ok(detail) => detail,
                Err(e) => {
                    log::warn!("Skipping record {}: {}", id, e);
                    skipped_records += 1;
                    continue;
                }
            };
            let assets = detail.ordered_output_assets();
            if assets.is_empty() {
                log::debug!("Record {} has no output images", id);
                continue;
            }

            let mut images = Vec::with_capacity(assets.len());
            for (index, asset) in assets.iter().enumerate() {
                match api.download_asset(&asset.storage_key).await {
                    Ok(bytes) => images.push((index + 1, bytes)),
                    Err(e) => {
                        log::warn!("Failed to download asset {}: {}", asset.storage_key, e);
                        skipped += 1;
                    }
                }
            }
            if images.is_empty() {
                continue;
            }

            let folder = builder.add_folder(&detail.title, id)?;
            for (index, bytes) in images {
                builder.add_file(&folder, &image_file_name(&folder, index), &bytes)?;
            }
        }

        let mut report = BulkDownloadReport {
            archive_path: None,
            folders: builder.folder_count(),
            files: builder.file_count(),
            skipped_assets: skipped,
            skipped_records,
        };
        log_bulk_operation("download", selected.len(), report.files, skipped + skipped_records);
        if report.files == 0 {
            log::warn!("No images collected for {} selected records", selected.len());
            return Ok(report);
        }

        let bytes = builder.finish()?;
        tokio::fs::create_dir_all(dest_dir).await?;
        let path = dest_dir.join(archive_file_name(archive_prefix));
        tokio::fs::write(&path, bytes).await?;
        log::info!("Wrote {} images to {}", report.files, path.display());
        report.archive_path = Some(path);

        self.exit();
        Ok(report)
    }

    fn require_selecting(&self) -> ApiResult<()> {
        if self.is_selecting() {
            Ok(())
        } else {
            Err(ApiError::Validation(
                "Enter selection mode first".to_string(),
            ))
        }
    }

    fn require_selection(&self) -> ApiResult<Vec<i64>> {
        self.require_selecting()?;
        if self.selected.is_empty() {
            return Err(ApiError::Validation(
                "Select at least one item".to_string(),
            ));
        }
        Ok(self.selected_ids())
    }
}

/// Selected ids in page order, followed by any not on the page in id order
fn ordered_selection(page_ids: &[i64], selected: &[i64]) -> Vec<i64> {
    let mut ordered: Vec<i64> = page_ids
        .iter()
        .copied()
        .filter(|id| selected.contains(id))
        .collect();
    ordered.extend(selected.iter().copied().filter(|id| !page_ids.contains(id)));
    ordered
}

fn archive_file_name(prefix: &str) -> String {
    format!(
        "{}_{}.zip",
        prefix,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    )
}

/// Delete one record and make the next list load bypass the cache
pub async fn delete_record<A: GalleryApi>(orchestrator: &ListOrchestrator<A>, id: i64) -> ApiResult<()> {
    orchestrator.api().delete_log(id).await?;
    log::info!("Deleted record {}", id);
    orchestrator.session().request_refresh();
    Ok(())
}

/// Save a single asset as `<dir>/<title>_<index>.jpg`
pub async fn download_asset_to<A: GalleryApi>(
    api: &A,
    asset: &AssetItem,
    title: &str,
    index: usize,
    dest_dir: &Path,
) -> ApiResult<PathBuf> {
    let bytes = api.download_asset(&asset.storage_key).await?;
    let mut stem = sanitize_name(title);
    if stem.is_empty() {
        stem = format!("asset_{}", asset.id);
    }
    tokio::fs::create_dir_all(dest_dir).await?;
    let path = dest_dir.join(image_file_name(&stem, index));
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::io::Cursor;
    use std::rc::Rc;

    use super::*;
    use crate::cache::TtlCache;
    use crate::gallery::ListQuery;
    use crate::gallery::orchestrator::ListSettings;
    use crate::gallery::orchestrator::testing::{FakeApi, asset, record};
    use crate::session::SessionState;

    async fn loaded(api: FakeApi) -> ListOrchestrator<FakeApi> {
        let orch = ListOrchestrator::new(
            api,
            Rc::new(RefCell::new(TtlCache::new())),
            Rc::new(SessionState::default()),
            ListSettings::default(),
        );
        orch.load(&ListQuery::default(), false).await.unwrap();
        orch
    }

    fn three_records() -> FakeApi {
        FakeApi::with_records(vec![record(3, "three", 3), record(7, "seven", 7), record(9, "nine", 9)])
    }

    #[test]
    fn test_operations_rejected_outside_selecting_mode() {
        let mut coordinator = SelectionCoordinator::new();
        assert!(matches!(coordinator.toggle(1), Err(ApiError::Validation(_))));
        assert!(matches!(coordinator.toggle_all(&[1, 2]), Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_mode_changes_clear_selection() {
        let mut coordinator = SelectionCoordinator::new();
        coordinator.toggle_mode();
        coordinator.toggle(4).unwrap();
        assert!(coordinator.is_selected(4));

        coordinator.toggle_mode();
        assert_eq!(coordinator.mode(), SelectionMode::Browse);
        coordinator.toggle_mode();
        assert!(coordinator.is_empty());
    }

    #[test]
    fn test_toggle_and_toggle_all() {
        let mut coordinator = SelectionCoordinator::new();
        coordinator.toggle_mode();
        assert!(coordinator.toggle(1).unwrap());
        assert!(!coordinator.toggle(1).unwrap());

        coordinator.toggle(2).unwrap();
        coordinator.toggle_all(&[1, 2, 3]).unwrap();
        assert_eq!(coordinator.selected_ids(), vec![1, 2, 3]);

        coordinator.toggle_all(&[1, 2, 3]).unwrap();
        assert!(coordinator.is_empty());
    }

    #[test]
    fn test_replaced_page_clears_selection() {
        let mut coordinator = SelectionCoordinator::new();
        coordinator.sync_with_view(1);
        coordinator.toggle_mode();
        coordinator.toggle(5).unwrap();

        coordinator.sync_with_view(1);
        assert_eq!(coordinator.len(), 1);
        coordinator.sync_with_view(2);
        assert!(coordinator.is_empty());
        assert!(coordinator.is_selecting());
    }

    #[tokio::test]
    async fn test_empty_selection_is_rejected() {
        let orch = loaded(three_records()).await;
        let mut coordinator = SelectionCoordinator::new();
        coordinator.toggle_mode();

        let err = coordinator.bulk_delete(&orch).await.unwrap_err();
        assert_eq!(err, ApiError::Validation("Select at least one item".to_string()));
        assert!(orch.api().deleted.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_bulk_delete_success_resets_and_reloads() {
        let orch = loaded(three_records()).await;
        let mut coordinator = SelectionCoordinator::new();
        coordinator.toggle_mode();
        coordinator.toggle(3).unwrap();
        coordinator.toggle(9).unwrap();

        let report = coordinator.bulk_delete(&orch).await.unwrap();

        assert!(report.is_success());
        assert_eq!(report.succeeded, vec![3, 9]);
        assert_eq!(coordinator.mode(), SelectionMode::Browse);
        assert!(coordinator.is_empty());
        assert_eq!(orch.api().list_calls.get(), 2);
        assert_eq!(orch.api().tag_calls.get(), 1);
        assert_eq!(orch.view().ids(), vec![7]);
    }

    #[tokio::test]
    async fn test_bulk_delete_partial_failure_reports_batch_failed() {
        let api = three_records();
        api.failing_deletes.borrow_mut().insert(7);
        let orch = loaded(api).await;
        let mut coordinator = SelectionCoordinator::new();
        coordinator.toggle_mode();
        coordinator.toggle_all(&orch.view().ids()).unwrap();

        let report = coordinator.bulk_delete(&orch).await.unwrap();

        assert!(!report.is_success());
        assert_eq!(report.failed_ids(), vec![7]);
        assert_eq!(report.succeeded, vec![3, 9]);
        assert_eq!(report.user_message(), "Bulk delete failed: could not delete 7");
        // Selection survives and nothing was reloaded
        assert!(coordinator.is_selecting());
        assert_eq!(coordinator.selected_ids(), vec![3, 7, 9]);
        assert_eq!(orch.api().list_calls.get(), 1);
    }

    #[tokio::test]
    async fn test_bulk_download_skips_records_without_assets() {
        let api = FakeApi::with_records(vec![record(1, "Sunset", 2), record(2, "Empty", 1)]);
        api.assets.borrow_mut().insert(
            1,
            vec![asset(10, "k-a", 0), asset(11, "k-b", 1), asset(12, "k-c", 2)],
        );
        let orch = loaded(api).await;
        let dir = tempfile::tempdir().unwrap();
        let mut coordinator = SelectionCoordinator::new();
        coordinator.toggle_mode();
        coordinator.toggle_all(&[1, 2]).unwrap();

        let report = coordinator
            .bulk_download(&orch, dir.path(), "gallery")
            .await
            .unwrap();

        assert_eq!(report.folders, 1);
        assert_eq!(report.files, 3);
        let path = report.archive_path.unwrap();
        let bytes = std::fs::read(&path).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<_> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(
            names,
            vec!["Sunset/", "Sunset/Sunset_1.jpg", "Sunset/Sunset_2.jpg", "Sunset/Sunset_3.jpg"]
        );
        assert!(!coordinator.is_selecting());
    }

    #[tokio::test]
    async fn test_bulk_download_without_images_writes_nothing() {
        let api = FakeApi::with_records(vec![record(1, "a", 1)]);
        api.assets.borrow_mut().insert(1, vec![asset(10, "broken", 0)]);
        api.failing_downloads.borrow_mut().insert("broken".to_string());
        let orch = loaded(api).await;
        let dir = tempfile::tempdir().unwrap();
        let mut coordinator = SelectionCoordinator::new();
        coordinator.toggle_mode();
        coordinator.toggle(1).unwrap();

        let report = coordinator
            .bulk_download(&orch, dir.path(), "gallery")
            .await
            .unwrap();

        assert_eq!(report.archive_path, None);
        assert_eq!(report.skipped_assets, 1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert!(coordinator.is_selecting());
    }

    #[tokio::test]
    async fn test_bulk_download_counts_records_that_fail_to_load() {
        let api = FakeApi::with_records(vec![record(1, "Sunset", 2), record(2, "Harbor", 1)]);
        api.assets.borrow_mut().insert(1, vec![asset(10, "k-a", 0)]);
        api.assets.borrow_mut().insert(2, vec![asset(20, "k-b", 0)]);
        api.failing_details.borrow_mut().insert(2);
        let orch = loaded(api).await;
        let dir = tempfile::tempdir().unwrap();
        let mut coordinator = SelectionCoordinator::new();
        coordinator.toggle_mode();
        coordinator.toggle_all(&[1, 2]).unwrap();

        let report = coordinator
            .bulk_download(&orch, dir.path(), "gallery")
            .await
            .unwrap();

        assert_eq!(report.skipped_records, 1);
        assert_eq!(report.folders, 1);
        assert_eq!(report.files, 1);
        assert!(report.archive_path.is_some());
        assert!(
            report
                .user_message()
                .ends_with("(1 records could not be loaded)")
        );
    }

    #[tokio::test]
    async fn test_bulk_download_with_colliding_titles() {
        let api = FakeApi::with_records(vec![
            record(9, "Portrait_2", 3),
            record(1, "Portrait", 2),
            record(2, "Portrait", 1),
        ]);
        for (id, key) in [(9, "k-9"), (1, "k-1"), (2, "k-2")] {
            api.assets.borrow_mut().insert(id, vec![asset(id * 10, key, 0)]);
        }
        let orch = loaded(api).await;
        assert_eq!(orch.view().ids(), vec![9, 1, 2]);
        let dir = tempfile::tempdir().unwrap();
        let mut coordinator = SelectionCoordinator::new();
        coordinator.toggle_mode();
        coordinator.toggle_all(&[9, 1, 2]).unwrap();

        let report = coordinator
            .bulk_download(&orch, dir.path(), "gallery")
            .await
            .unwrap();

        assert_eq!(report.folders, 3);
        assert_eq!(report.files, 3);
        let bytes = std::fs::read(report.archive_path.unwrap()).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<_> = archive
            .file_names()
            .filter(|name| name.ends_with(".jpg"))
            .map(str::to_string)
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "Portrait/Portrait_1.jpg",
                "Portrait_2/Portrait_2_1.jpg",
                "Portrait_2_2/Portrait_2_2_1.jpg",
            ]
        );
    }

    #[tokio::test]
    async fn test_delete_record_requests_refresh() {
        let orch = loaded(three_records()).await;
        delete_record(&orch, 7).await.unwrap();
        assert!(orch.session().refresh_pending());

        orch.load(&ListQuery::default(), false).await.unwrap();
        assert_eq!(orch.view().ids(), vec![9, 3]);
    }

    #[tokio::test]
    async fn test_download_single_asset() {
        let api = FakeApi::default();
        let dir = tempfile::tempdir().unwrap();
        let path = download_asset_to(&api, &asset(1, "key-1", 0), "My: pic", 2, dir.path())
            .await
            .unwrap();
        assert_eq!(path.file_name().unwrap(), "My_ pic_2.jpg");
        assert_eq!(std::fs::read(path).unwrap(), b"key-1");
    }

    #[test]
    fn test_ordered_selection_follows_page() {
        assert_eq!(ordered_selection(&[5, 2, 8], &[2, 8, 11]), vec![2, 8, 11]);
        assert_eq!(ordered_selection(&[8, 2], &[2, 8]), vec![8, 2]);
    }
}
