//! Search page state/fetch controller.
//!
//! Reconciles deep-link query parameters, the session-persisted snapshot,
//! debounced text input, active filters, and sentinel-driven pagination.
//! Exactly one primary fetch may be outstanding; starting a new one
//! cancels the previous via its token, and a generation counter drops any
//! stale response that still manages to arrive.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::{
    error::ApiError,
    models::Game,
    nav::{Route, SharedHistory},
    search::{
        filters::FilterOptions,
        query::QueryParams,
        session::{SearchSnapshot, SessionStore},
    },
    services::search::{SearchMode, SearchRequest, SearchService, PAGE_SIZE},
    util::{CancelToken, Debouncer},
};

/// Quiet period before a purely-typed change fires a fetch.
pub const TYPING_DEBOUNCE: Duration = Duration::from_millis(300);

/// Generic localized message for any non-cancellation failure.
pub const SEARCH_ERROR_MESSAGE: &str = "Something went wrong while searching. Please try again.";

/// Lifecycle of the search view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchPhase {
    /// Results (possibly none yet) are on screen, nothing in flight.
    #[default]
    Idle,
    /// A replace fetch is in flight.
    LoadingFirstPage,
    /// An append fetch is in flight.
    LoadingMore,
    /// The last fetch failed; [`SEARCH_ERROR_MESSAGE`] is showing.
    Error,
    /// Page 0 came back with no results.
    Empty,
}

/// Everything the search screen renders.
#[derive(Debug, Clone, Default)]
pub struct SearchViewState {
    /// Free-text query as typed.
    pub query: String,
    /// Active filter selection.
    pub filters: FilterOptions,
    /// Discount/recommended/default mode.
    pub mode: SearchMode,
    /// Where in the fetch lifecycle the view is.
    pub phase: SearchPhase,
    /// Accumulated result pages.
    pub results: Vec<Game>,
    /// Index of the last page loaded.
    pub page: usize,
    /// Whether a further page is believed to exist.
    pub has_more: bool,
    /// A commit happened whose fetch has not completed yet.
    pub pending_search: bool,
    /// User-facing error text, when in the error phase.
    pub error: Option<String>,
}

impl SearchViewState {
    fn request_for(&self, page: usize) -> SearchRequest {
        SearchRequest {
            query: self.query.clone(),
            filters: self.filters.clone(),
            mode: self.mode,
            page,
        }
    }

    fn snapshot(&self) -> SearchSnapshot {
        SearchSnapshot {
            search_query: self.query.clone(),
            active_filters: self.filters.clone(),
            discount_filter: self.mode == SearchMode::Discounted,
            recommended_filter: self.mode == SearchMode::Recommended,
        }
    }

    fn query_params(&self) -> QueryParams {
        QueryParams {
            query: self.query.clone(),
            discount: self.mode == SearchMode::Discounted,
            recommended: self.mode == SearchMode::Recommended,
            from_main: false,
            category_ids: self.filters.categories.clone(),
        }
    }

    fn is_loading(&self) -> bool {
        matches!(
            self.phase,
            SearchPhase::LoadingFirstPage | SearchPhase::LoadingMore
        )
    }
}

/// Fetch seam so tests can drive the controller with a scripted backend.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run one page fetch, racing it against `cancel`.
    async fn search(
        &self,
        request: &SearchRequest,
        cancel: &CancelToken,
    ) -> Result<Vec<Game>, ApiError>;
}

/// Production backend: the search service with its degrade-gracefully
/// placeholder policy.
pub struct ApiSearchBackend {
    service: SearchService,
}

impl ApiSearchBackend {
    /// Backend calling through the given service.
    pub fn new(service: SearchService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl SearchBackend for ApiSearchBackend {
    async fn search(
        &self,
        request: &SearchRequest,
        cancel: &CancelToken,
    ) -> Result<Vec<Game>, ApiError> {
        self.service.search_or_fallback(request, cancel).await
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FetchKind {
    /// Page-0 fetch replacing the result list.
    Replace,
    /// Forward pagination appending to the result list.
    Append,
}

/// Shared fetch machinery, clonable into spawned tasks and the debouncer.
#[derive(Clone)]
struct FetchContext {
    backend: Arc<dyn SearchBackend>,
    state: Arc<Mutex<SearchViewState>>,
    seq: Arc<AtomicU64>,
    inflight: Arc<Mutex<Option<CancelToken>>>,
}

impl FetchContext {
    /// Start a fetch, superseding whatever is in flight. The loser is
    /// cancelled and its response, should it still arrive, is dropped by
    /// the generation check.
    fn fire(&self, kind: FetchKind) {
        let ticket = self.seq.fetch_add(1, Ordering::AcqRel) + 1;
        let token = CancelToken::new();
        {
            let mut guard = self.inflight.lock();
            if let Some(previous) = guard.take() {
                previous.cancel();
            }
            *guard = Some(token.clone());
        }

        let request = {
            let mut state = self.state.lock();
            match kind {
                FetchKind::Replace => {
                    state.page = 0;
                    state.phase = SearchPhase::LoadingFirstPage;
                    state.request_for(0)
                }
                FetchKind::Append => {
                    state.phase = SearchPhase::LoadingMore;
                    state.request_for(state.page + 1)
                }
            }
        };

        let ctx = self.clone();
        tokio::spawn(async move {
            let result = ctx.backend.search(&request, &token).await;
            ctx.complete(ticket, kind, request.page, result);
        });
    }

    fn complete(
        &self,
        ticket: u64,
        kind: FetchKind,
        page: usize,
        result: Result<Vec<Game>, ApiError>,
    ) {
        if self.seq.load(Ordering::Acquire) != ticket {
            debug!(page, "dropping superseded search response");
            return;
        }
        match result {
            // A cancelled fetch leaves every flag exactly as it was; the
            // operation that cancelled it owns the state now.
            Err(err) if err.is_cancelled() => {}
            Err(_) => {
                let mut state = self.state.lock();
                state.phase = SearchPhase::Error;
                state.error = Some(SEARCH_ERROR_MESSAGE.to_string());
                state.pending_search = false;
            }
            Ok(games) => {
                let mut state = self.state.lock();
                let count = games.len();
                // Best-effort end detection: the API declares no total, so
                // a short or empty page means there is nothing further.
                state.has_more = count >= PAGE_SIZE;
                match kind {
                    FetchKind::Replace => {
                        state.results = games;
                        state.page = 0;
                        state.phase = if count == 0 {
                            SearchPhase::Empty
                        } else {
                            SearchPhase::Idle
                        };
                    }
                    FetchKind::Append => {
                        state.results.extend(games);
                        state.page = page;
                        state.phase = SearchPhase::Idle;
                    }
                }
                state.pending_search = false;
                state.error = None;
            }
        }
    }
}

/// The search page controller. One instance per mounted search view.
pub struct SearchController {
    ctx: FetchContext,
    session: SessionStore,
    history: SharedHistory,
    debouncer: Mutex<Debouncer>,
}

impl SearchController {
    /// A fresh controller. State is empty until [`mount`](Self::mount).
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        session: SessionStore,
        history: SharedHistory,
    ) -> Self {
        Self {
            ctx: FetchContext {
                backend,
                state: Arc::new(Mutex::new(SearchViewState::default())),
                seq: Arc::new(AtomicU64::new(0)),
                inflight: Arc::new(Mutex::new(None)),
            },
            session,
            history,
            debouncer: Mutex::new(Debouncer::new(TYPING_DEBOUNCE)),
        }
    }

    /// Render-side view of the current state.
    pub fn state(&self) -> SearchViewState {
        self.ctx.state.lock().clone()
    }

    /// Seed state on mount and issue the first fetch.
    ///
    /// Precedence: a `from=main` navigation makes the query parameter win
    /// with filters reset to empty; otherwise the session snapshot, when
    /// present; otherwise the URL parameters; otherwise an empty,
    /// unfiltered search.
    pub fn mount(&self, params: Option<&QueryParams>) {
        {
            let mut state = self.ctx.state.lock();
            *state = SearchViewState::default();
            match params {
                Some(params) if params.from_main => {
                    state.query = params.query.clone();
                    state.filters = FilterOptions::default();
                    state.mode = params.mode();
                }
                _ => {
                    if let Some(snapshot) = self.session.load_snapshot() {
                        state.query = snapshot.search_query.clone();
                        state.filters = snapshot.active_filters.clone();
                        state.mode = snapshot.mode();
                    } else if let Some(params) = params {
                        state.query = params.query.clone();
                        state.mode = params.mode();
                        state.filters = FilterOptions {
                            categories: params.category_ids.clone(),
                            ..Default::default()
                        };
                    }
                }
            }
            state.pending_search = true;
        }
        self.checkpoint();
        self.ctx.fire(FetchKind::Replace);
    }

    /// Free-text input changed. The commit (history/session) is immediate;
    /// the fetch waits out the typing debounce.
    pub fn set_query(&self, text: &str) {
        {
            let mut state = self.ctx.state.lock();
            if state.query == text {
                return;
            }
            state.query = text.to_string();
            state.pending_search = true;
        }
        self.checkpoint();
        let ctx = self.ctx.clone();
        self.debouncer.lock().call(move || async move {
            ctx.fire(FetchKind::Replace);
        });
    }

    /// Explicit form submit: fetch immediately, superseding a pending
    /// debounce timer.
    pub fn submit(&self) {
        self.commit_immediate();
    }

    /// Flip the discount toggle. Turning it on clears recommended.
    pub fn toggle_discount(&self) {
        {
            let mut state = self.ctx.state.lock();
            state.mode = if state.mode == SearchMode::Discounted {
                SearchMode::Default
            } else {
                SearchMode::Discounted
            };
        }
        self.commit_immediate();
    }

    /// Flip the recommended toggle. Turning it on clears discount.
    pub fn toggle_recommended(&self) {
        {
            let mut state = self.ctx.state.lock();
            state.mode = if state.mode == SearchMode::Recommended {
                SearchMode::Default
            } else {
                SearchMode::Recommended
            };
        }
        self.commit_immediate();
    }

    /// Apply a filter selection from the filter modal.
    pub fn apply_filters(&self, filters: FilterOptions) {
        self.ctx.state.lock().filters = filters;
        self.commit_immediate();
    }

    /// Reset filters to empty.
    pub fn reset_filters(&self) {
        self.ctx.state.lock().filters = FilterOptions::default();
        self.commit_immediate();
    }

    /// The sentinel trailing the list entered the viewport. Fetches the
    /// next page unless one is already in flight or the end was reached.
    pub fn sentinel_visible(&self) {
        {
            let state = self.ctx.state.lock();
            if !state.has_more || state.is_loading() || state.pending_search {
                return;
            }
        }
        self.ctx.fire(FetchKind::Append);
    }

    /// Detach timers and cancel any in-flight fetch. Called on unmount so
    /// nothing acts on a dead view.
    pub fn unmount(&self) {
        self.debouncer.lock().cancel();
        if let Some(token) = self.ctx.inflight.lock().take() {
            token.cancel();
        }
        self.ctx.seq.fetch_add(1, Ordering::AcqRel);
    }

    fn commit_immediate(&self) {
        // An immediate action supersedes any debounce timer still waiting.
        self.debouncer.lock().cancel();
        {
            let mut state = self.ctx.state.lock();
            state.pending_search = true;
            state.page = 0;
        }
        self.checkpoint();
        self.ctx.fire(FetchKind::Replace);
    }

    /// Persist the snapshot and replace (not push) the history entry.
    fn checkpoint(&self) {
        let (snapshot, params) = {
            let state = self.ctx.state.lock();
            (state.snapshot(), state.query_params())
        };
        self.session.save_snapshot(&snapshot);
        self.history.lock().replace(Route::Search, params.encode());
    }
}

impl Drop for SearchController {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Whether the sentinel row (one past the last result) sits inside the
/// visible window. The terminal analogue of viewport intersection.
pub fn sentinel_in_view(scroll_offset: usize, viewport_rows: usize, result_count: usize) -> bool {
    scroll_offset + viewport_rows > result_count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::History;
    use parking_lot::Mutex as PlMutex;
    use std::collections::VecDeque;

    fn game(id: u64, title: &str) -> Game {
        Game {
            id,
            title: title.to_string(),
            thumbnail_url: None,
            current_price: 10_000,
            lowest_price: 10_000,
            rating: None,
            category_ids: Vec::new(),
            single_player: true,
            multi_player: false,
            developer: None,
            publisher: None,
            release_date: None,
        }
    }

    fn full_page(prefix: &str) -> Vec<Game> {
        (0..PAGE_SIZE as u64)
            .map(|n| game(n, &format!("{prefix}-{n}")))
            .collect()
    }

    /// One scripted response: a delay, a payload, and whether the backend
    /// honors the cancel token (a rude backend returns anyway, which is
    /// exactly the race the generation guard exists for).
    struct Step {
        delay: Duration,
        result: Result<Vec<Game>, ApiError>,
        honors_cancel: bool,
    }

    struct FakeBackend {
        steps: PlMutex<VecDeque<Step>>,
        requests: PlMutex<Vec<SearchRequest>>,
    }

    impl FakeBackend {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                steps: PlMutex::new(VecDeque::new()),
                requests: PlMutex::new(Vec::new()),
            })
        }

        fn push(&self, delay_ms: u64, result: Result<Vec<Game>, ApiError>) {
            self.steps.lock().push_back(Step {
                delay: Duration::from_millis(delay_ms),
                result,
                honors_cancel: true,
            });
        }

        fn push_rude(&self, delay_ms: u64, result: Result<Vec<Game>, ApiError>) {
            self.steps.lock().push_back(Step {
                delay: Duration::from_millis(delay_ms),
                result,
                honors_cancel: false,
            });
        }

        fn requests(&self) -> Vec<SearchRequest> {
            self.requests.lock().clone()
        }
    }

    #[async_trait]
    impl SearchBackend for FakeBackend {
        async fn search(
            &self,
            request: &SearchRequest,
            cancel: &CancelToken,
        ) -> Result<Vec<Game>, ApiError> {
            self.requests.lock().push(request.clone());
            let step = self.steps.lock().pop_front().unwrap_or(Step {
                delay: Duration::from_millis(1),
                result: Ok(full_page("default")),
                honors_cancel: true,
            });
            if step.honors_cancel {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(ApiError::Cancelled),
                    _ = tokio::time::sleep(step.delay) => {}
                }
            } else {
                tokio::time::sleep(step.delay).await;
            }
            step.result
        }
    }

    fn controller(backend: Arc<FakeBackend>) -> SearchController {
        SearchController::new(backend, SessionStore::new(), History::shared(None))
    }

    async fn settle() {
        // Paused-clock tests: advancing past every scripted delay drains
        // the spawned fetch tasks.
        tokio::time::sleep(Duration::from_secs(5)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_typing_fires_one_fetch_with_final_query() {
        let backend = FakeBackend::new();
        let ctl = controller(backend.clone());

        ctl.set_query("zeld");
        tokio::time::sleep(Duration::from_millis(100)).await;
        ctl.set_query("zelda");
        settle().await;

        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].query, "zelda");
        assert_eq!(requests[0].page, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_typing_fires_after_debounce() {
        let backend = FakeBackend::new();
        let ctl = controller(backend.clone());

        ctl.set_query("zelda");
        tokio::time::sleep(Duration::from_millis(299)).await;
        assert!(backend.requests().is_empty());
        settle().await;
        assert_eq!(backend.requests().len(), 1);
        assert_eq!(backend.requests()[0].query, "zelda");
    }

    #[tokio::test(start_paused = true)]
    async fn toggles_are_mutually_exclusive_and_fetch_immediately() {
        let backend = FakeBackend::new();
        let ctl = controller(backend.clone());

        ctl.toggle_recommended();
        settle().await;
        assert_eq!(ctl.state().mode, SearchMode::Recommended);

        ctl.toggle_discount();
        settle().await;
        let state = ctl.state();
        assert_eq!(state.mode, SearchMode::Discounted);

        let requests = backend.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].mode, SearchMode::Discounted);
        assert_eq!(requests[1].page, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_response_is_never_applied() {
        let backend = FakeBackend::new();
        // First fetch is slow and ignores cancellation; second is fast.
        backend.push_rude(500, Ok(full_page("old")));
        backend.push(10, Ok(full_page("new")));
        let ctl = controller(backend.clone());

        ctl.submit();
        tokio::time::sleep(Duration::from_millis(50)).await;
        ctl.submit();
        settle().await;

        let state = ctl.state();
        assert_eq!(state.results.len(), PAGE_SIZE);
        assert!(state.results.iter().all(|game| game.title.starts_with("new")));
        assert_eq!(state.phase, SearchPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_fetch_leaves_state_untouched() {
        let backend = FakeBackend::new();
        backend.push(500, Ok(full_page("first")));
        backend.push(10, Ok(full_page("second")));
        let ctl = controller(backend.clone());

        ctl.submit();
        tokio::time::sleep(Duration::from_millis(50)).await;
        ctl.submit();
        settle().await;

        let state = ctl.state();
        assert!(state.error.is_none());
        assert_eq!(state.phase, SearchPhase::Idle);
        assert!(state
            .results
            .iter()
            .all(|game| game.title.starts_with("second")));
    }

    #[tokio::test(start_paused = true)]
    async fn sentinel_appends_next_page() {
        let backend = FakeBackend::new();
        backend.push(10, Ok(full_page("p0")));
        backend.push(10, Ok(vec![game(900, "p1-only")]));
        let ctl = controller(backend.clone());

        ctl.submit();
        settle().await;
        assert_eq!(ctl.state().results.len(), PAGE_SIZE);
        assert!(ctl.state().has_more);

        ctl.sentinel_visible();
        settle().await;
        let state = ctl.state();
        assert_eq!(state.results.len(), PAGE_SIZE + 1);
        assert_eq!(state.page, 1);
        // Short page flips the heuristic off.
        assert!(!state.has_more);

        // Sentinel is now inert.
        ctl.sentinel_visible();
        settle().await;
        assert_eq!(backend.requests().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_first_page_is_empty_phase() {
        let backend = FakeBackend::new();
        backend.push(10, Ok(Vec::new()));
        let ctl = controller(backend.clone());

        ctl.submit();
        settle().await;
        let state = ctl.state();
        assert_eq!(state.phase, SearchPhase::Empty);
        assert!(!state.has_more);
        assert!(state.results.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_append_keeps_loaded_pages() {
        let backend = FakeBackend::new();
        backend.push(10, Ok(full_page("p0")));
        backend.push(
            10,
            Err(ApiError::Envelope {
                message: "FAIL".to_string(),
            }),
        );
        let ctl = controller(backend.clone());

        ctl.submit();
        settle().await;
        ctl.sentinel_visible();
        settle().await;

        let state = ctl.state();
        assert_eq!(state.phase, SearchPhase::Error);
        assert_eq!(state.error.as_deref(), Some(SEARCH_ERROR_MESSAGE));
        // No rollback of already-appended pages.
        assert_eq!(state.results.len(), PAGE_SIZE);
    }

    #[tokio::test(start_paused = true)]
    async fn mount_from_main_wins_over_session() {
        let session = SessionStore::new();
        session.save_snapshot(&SearchSnapshot {
            search_query: "stale".to_string(),
            active_filters: FilterOptions {
                categories: vec![1, 2],
                ..Default::default()
            },
            discount_filter: false,
            recommended_filter: true,
        });
        let backend = FakeBackend::new();
        let ctl = SearchController::new(backend.clone(), session, History::shared(None));

        let params = QueryParams {
            query: "fresh".to_string(),
            from_main: true,
            ..Default::default()
        };
        ctl.mount(Some(&params));
        settle().await;

        let state = ctl.state();
        assert_eq!(state.query, "fresh");
        assert!(state.filters.is_empty());
        assert_eq!(state.mode, SearchMode::Default);
    }

    #[tokio::test(start_paused = true)]
    async fn mount_restores_session_when_not_from_main() {
        let session = SessionStore::new();
        session.save_snapshot(&SearchSnapshot {
            search_query: "kept".to_string(),
            active_filters: FilterOptions {
                categories: vec![4],
                ..Default::default()
            },
            discount_filter: true,
            recommended_filter: false,
        });
        let backend = FakeBackend::new();
        let ctl = SearchController::new(backend.clone(), session, History::shared(None));

        let params = QueryParams {
            query: "ignored".to_string(),
            ..Default::default()
        };
        ctl.mount(Some(&params));
        settle().await;

        let state = ctl.state();
        assert_eq!(state.query, "kept");
        assert_eq!(state.filters.categories, vec![4]);
        assert_eq!(state.mode, SearchMode::Discounted);
    }

    #[tokio::test(start_paused = true)]
    async fn mount_falls_back_to_params_then_empty() {
        let backend = FakeBackend::new();
        let ctl = controller(backend.clone());
        let params = QueryParams {
            query: "deep link".to_string(),
            recommended: true,
            category_ids: vec![8],
            ..Default::default()
        };
        ctl.mount(Some(&params));
        settle().await;
        let state = ctl.state();
        assert_eq!(state.query, "deep link");
        assert_eq!(state.mode, SearchMode::Recommended);
        assert_eq!(state.filters.categories, vec![8]);

        let bare = controller(backend.clone());
        bare.mount(None);
        settle().await;
        let state = bare.state();
        assert!(state.query.is_empty());
        assert!(state.filters.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn commits_replace_history_and_checkpoint_session() {
        let session = SessionStore::new();
        let history = History::shared(None);
        let backend = FakeBackend::new();
        let ctl = SearchController::new(backend.clone(), session.clone(), history.clone());

        ctl.mount(None);
        settle().await;
        ctl.set_query("metroid");
        ctl.toggle_discount();
        settle().await;

        // History holds one replaced entry, not one per interaction.
        let guard = history.lock();
        assert_eq!(guard.len(), 1);
        let entry = guard.current().unwrap().clone();
        drop(guard);
        assert_eq!(entry.route, Route::Search);
        assert!(entry.query.contains("query=metroid"));
        assert!(entry.query.contains("discount=true"));

        let snapshot = session.load_snapshot().expect("snapshot saved");
        assert_eq!(snapshot.search_query, "metroid");
        assert!(snapshot.discount_filter);
        assert!(!snapshot.recommended_filter);
    }

    #[test]
    fn sentinel_window_math() {
        // 10 results, viewport of 5 rows: sentinel (row 10) only enters
        // once the window slides far enough.
        assert!(!sentinel_in_view(0, 5, 10));
        assert!(!sentinel_in_view(5, 5, 10));
        assert!(sentinel_in_view(6, 5, 10));
        // Short lists always show the sentinel.
        assert!(sentinel_in_view(0, 5, 3));
    }
}
