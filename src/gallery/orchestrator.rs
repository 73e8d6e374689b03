//! Cached, fenced retrieval of record pages and tag statistics.

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;
use std::time::Duration;

use crate::api::{ApiResult, GalleryApi, LogRecord, TagStats};
use crate::cache::TtlCache;
use crate::session::SessionState;

use super::query::{LIST_CACHE_PREFIX, ListQuery, TAG_STATS_CACHE_KEY, sort_records};

/// Values stored in the shared query cache
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Page { items: Vec<LogRecord>, total: u64 },
    TagStats(TagStats),
}

pub type SharedCache = Rc<RefCell<TtlCache<CachedValue>>>;

/// Timing and concurrency knobs for the orchestrator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListSettings {
    pub list_ttl: Duration,
    pub tag_stats_ttl: Duration,
    /// When false, the last response to arrive wins
    pub request_fencing: bool,
}

impl Default for ListSettings {
    fn default() -> Self {
        Self {
            list_ttl: Duration::from_secs(60),
            tag_stats_ttl: Duration::from_secs(300),
            request_fencing: true,
        }
    }
}

/// Where a page came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSource {
    Cache,
    Network,
}

/// Result of one `load` call
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult {
    pub items: Vec<LogRecord>,
    pub total: u64,
    pub source: PageSource,
    /// False when a newer load was issued while this one was in flight
    pub applied: bool,
}

/// What the front-end currently displays
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListView {
    pub query: Option<ListQuery>,
    pub items: Vec<LogRecord>,
    pub total: u64,
    pub loading: bool,
    pub error: Option<String>,
    /// Bumped every time `items` is replaced
    pub version: u64,
}

impl ListView {
    pub fn ids(&self) -> Vec<i64> {
        self.items.iter().map(|r| r.id).collect()
    }
}

pub struct ListOrchestrator<A> {
    api: A,
    cache: SharedCache,
    session: Rc<SessionState>,
    settings: ListSettings,
    issued: Cell<u64>,
    view: RefCell<ListView>,
}

impl<A: GalleryApi> ListOrchestrator<A> {
    pub fn new(api: A, cache: SharedCache, session: Rc<SessionState>, settings: ListSettings) -> Self {
        Self {
            api,
            cache,
            session,
            settings,
            issued: Cell::new(0),
            view: RefCell::new(ListView::default()),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn session(&self) -> &Rc<SessionState> {
        &self.session
    }

    pub fn view(&self) -> Ref<'_, ListView> {
        self.view.borrow()
    }

    /// Load one page.
    ///
    /// A cache hit returns immediately without touching the loading flag.
    /// On a miss the page is fetched, sorted and cached under the query key.
    /// Errors are recorded on the view and returned; the previous items stay.
    pub async fn load(&self, query: &ListQuery, force_refresh: bool) -> ApiResult<PageResult> {
        let force = self.session.take_refresh_request() || force_refresh;
        if force {
            self.invalidate();
        }

        let generation = self.issued.get() + 1;
        self.issued.set(generation);
        let key = query.cache_key();

        let cached = match self.cache.borrow_mut().get(&key) {
            Some(CachedValue::Page { items, total }) => Some((items.clone(), *total)),
            _ => None,
        };
        if let Some((items, total)) = cached {
            log::debug!("List cache hit for {}", key);
            self.apply(query, &items, total);
            return Ok(PageResult {
                items,
                total,
                source: PageSource::Cache,
                applied: true,
            });
        }

        self.view.borrow_mut().loading = true;
        let response = self.api.list_logs(&query.to_request()).await;
        let is_latest = !self.settings.request_fencing || generation == self.issued.get();

        match response {
            Ok(page) => {
                let mut items = page.items;
                sort_records(&mut items, query.sort);
                let total = page.total;
                self.cache.borrow_mut().set(
                    key,
                    CachedValue::Page {
                        items: items.clone(),
                        total,
                    },
                    self.settings.list_ttl,
                );

                if is_latest {
                    self.apply(query, &items, total);
                } else {
                    log::debug!(
                        "Discarding superseded page {} (generation {} < {})",
                        query.page,
                        generation,
                        self.issued.get()
                    );
                }
                Ok(PageResult {
                    items,
                    total,
                    source: PageSource::Network,
                    applied: is_latest,
                })
            }
            Err(e) => {
                log::error!("Failed to load records: {}", e);
                if is_latest {
                    let mut view = self.view.borrow_mut();
                    view.loading = false;
                    view.error = Some(e.user_message());
                }
                Err(e)
            }
        }
    }

    /// Reload the page currently on screen, bypassing the cache
    pub async fn refresh(&self) -> ApiResult<PageResult> {
        let query = self.view.borrow().query.clone().unwrap_or_default();
        self.load(&query, true).await
    }

    /// Tag counts, cached under a fixed key. Failures are logged and yield `None`.
    pub async fn load_tag_stats(&self, force_refresh: bool) -> Option<TagStats> {
        if force_refresh {
            self.cache.borrow_mut().delete(TAG_STATS_CACHE_KEY);
        }
        let cached = match self.cache.borrow_mut().get(TAG_STATS_CACHE_KEY) {
            Some(CachedValue::TagStats(stats)) => Some(stats.clone()),
            _ => None,
        };
        if cached.is_some() {
            return cached;
        }

        match self.api.tag_stats().await {
            Ok(stats) => {
                self.cache.borrow_mut().set(
                    TAG_STATS_CACHE_KEY,
                    CachedValue::TagStats(stats.clone()),
                    self.settings.tag_stats_ttl,
                );
                Some(stats)
            }
            Err(e) => {
                log::warn!("Failed to load tag statistics: {}", e);
                None
            }
        }
    }

    /// Drop every cached page and the tag statistics
    pub fn invalidate(&self) {
        let mut cache = self.cache.borrow_mut();
        cache.clear_by_prefix(LIST_CACHE_PREFIX);
        cache.delete(TAG_STATS_CACHE_KEY);
        cache.log_stats();
    }

    fn apply(&self, query: &ListQuery, items: &[LogRecord], total: u64) {
        let mut view = self.view.borrow_mut();
        view.query = Some(query.clone());
        view.items = items.to_vec();
        view.total = total;
        view.loading = false;
        view.error = None;
        view.version += 1;
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{FakeApi, record};
    use super::*;
    use crate::gallery::query::SortKey;

    fn orchestrator(api: FakeApi) -> ListOrchestrator<FakeApi> {
        ListOrchestrator::new(
            api,
            Rc::new(RefCell::new(TtlCache::new())),
            Rc::new(SessionState::default()),
            ListSettings::default(),
        )
    }

    fn sample() -> Vec<LogRecord> {
        vec![record(1, "Cat", 10), record(2, "apple", 30), record(3, "Bird", 20)]
    }

    #[tokio::test]
    async fn test_second_identical_load_is_served_from_cache() {
        let orch = orchestrator(FakeApi::with_records(sample()));
        let query = ListQuery::default();

        let first = orch.load(&query, false).await.unwrap();
        let second = orch.load(&query, false).await.unwrap();

        assert_eq!(first.source, PageSource::Network);
        assert_eq!(second.source, PageSource::Cache);
        assert_eq!(first.items, second.items);
        assert_eq!(orch.api().list_calls.get(), 1);
    }

    #[tokio::test]
    async fn test_page_is_sorted_before_caching() {
        let orch = orchestrator(FakeApi::with_records(sample()));
        let query = ListQuery {
            sort: SortKey::TitleAsc,
            ..ListQuery::default()
        };

        let result = orch.load(&query, false).await.unwrap();
        let titles: Vec<_> = result.items.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["apple", "Bird", "Cat"]);

        let newest = orch.load(&ListQuery::default(), false).await.unwrap();
        let ids: Vec<_> = newest.items.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(orch.api().list_calls.get(), 2);
    }

    #[tokio::test]
    async fn test_force_refresh_purges_pages_and_tag_stats() {
        let orch = orchestrator(FakeApi::with_records(sample()));
        let query = ListQuery::default();
        orch.load(&query, false).await.unwrap();
        orch.load_tag_stats(false).await.unwrap();

        orch.load(&query, true).await.unwrap();
        orch.load_tag_stats(false).await.unwrap();

        assert_eq!(orch.api().list_calls.get(), 2);
        assert_eq!(orch.api().tag_calls.get(), 2);
    }

    #[tokio::test]
    async fn test_session_refresh_flag_forces_one_load() {
        let orch = orchestrator(FakeApi::with_records(sample()));
        let query = ListQuery::default();
        orch.load(&query, false).await.unwrap();

        orch.session().request_refresh();
        let forced = orch.load(&query, false).await.unwrap();
        let cached = orch.load(&query, false).await.unwrap();

        assert_eq!(forced.source, PageSource::Network);
        assert_eq!(cached.source, PageSource::Cache);
        assert!(!orch.session().refresh_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_entry_expires_after_ttl() {
        let orch = orchestrator(FakeApi::with_records(sample()));
        let query = ListQuery::default();
        orch.load(&query, false).await.unwrap();

        tokio::time::advance(Duration::from_secs(61)).await;
        let reloaded = orch.load(&query, false).await.unwrap();
        assert_eq!(reloaded.source, PageSource::Network);
    }

    #[tokio::test]
    async fn test_failure_keeps_items_and_sets_message() {
        let orch = orchestrator(FakeApi::with_records(sample()));
        orch.load(&ListQuery::default(), false).await.unwrap();

        orch.api().fail_list.set(true);
        let next = ListQuery {
            page: 2,
            ..ListQuery::default()
        };
        let err = orch.load(&next, false).await.unwrap_err();

        let view = orch.view();
        assert!(err.is_transport());
        assert_eq!(view.items.len(), 3);
        assert!(!view.loading);
        assert_eq!(view.error.as_deref(), Some(err.user_message().as_str()));
    }

    #[tokio::test]
    async fn test_tag_stats_failure_is_silent() {
        let orch = orchestrator(FakeApi::with_records(sample()));
        orch.api().fail_tags.set(true);
        assert_eq!(orch.load_tag_stats(false).await, None);
        assert_eq!(orch.view().error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_load_does_not_replace_view() {
        let records: Vec<_> = (1..=4).map(|i| record(i, "r", i as u32)).collect();
        let api = FakeApi::with_records(records);
        api.page_delays.borrow_mut().insert(1, Duration::from_millis(500));
        let orch = orchestrator(api);

        let slow = ListQuery::with_page_size(2);
        let fast = ListQuery {
            page: 2,
            ..slow.clone()
        };
        let (slow_result, fast_result) = tokio::join!(orch.load(&slow, false), orch.load(&fast, false));

        assert!(!slow_result.unwrap().applied);
        assert!(fast_result.unwrap().applied);
        let view = orch.view();
        assert_eq!(view.query.as_ref().map(|q| q.page), Some(2));
        assert_eq!(view.version, 1);

        // The slow response still filled its own slot
        drop(view);
        let cached = orch.load(&slow, false).await.unwrap();
        assert_eq!(cached.source, PageSource::Cache);
    }

    #[tokio::test(start_paused = true)]
    async fn test_without_fencing_last_response_wins() {
        let records: Vec<_> = (1..=4).map(|i| record(i, "r", i as u32)).collect();
        let api = FakeApi::with_records(records);
        api.page_delays.borrow_mut().insert(1, Duration::from_millis(500));
        let orch = ListOrchestrator::new(
            api,
            Rc::new(RefCell::new(TtlCache::new())),
            Rc::new(SessionState::default()),
            ListSettings {
                request_fencing: false,
                ..ListSettings::default()
            },
        );

        let slow = ListQuery::with_page_size(2);
        let fast = ListQuery {
            page: 2,
            ..slow.clone()
        };
        let _ = tokio::join!(orch.load(&slow, false), orch.load(&fast, false));

        assert_eq!(orch.view().query.as_ref().map(|q| q.page), Some(1));
    }
}
