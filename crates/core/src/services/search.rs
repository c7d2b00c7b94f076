//! Search endpoint wrapper with cooperative cancellation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::{
    api::ApiClient,
    error::ApiError,
    models::Game,
    search::filters::FilterOptions,
    util::CancelToken,
};

/// Envelope discriminator for the search endpoint.
pub const MSG_SEARCH_GAMES: &str = "SUCCESS_SEARCH_GAMES";

/// Results fetched per page. End-of-results is inferred from a short page.
pub const PAGE_SIZE: usize = 20;

/// Which shelf the search is ranking against. `Discounted` and
/// `Recommended` are mutually exclusive toggles in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchMode {
    /// Plain relevance ranking.
    #[default]
    Default,
    /// Only currently-discounted games.
    Discounted,
    /// Personalized by the profile's preferred categories.
    Recommended,
}

/// One page request against the search endpoint.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchRequest {
    /// Free-text query.
    pub query: String,
    /// Active filter selection.
    pub filters: FilterOptions,
    /// Shelf mode.
    pub mode: SearchMode,
    /// Zero-based page index.
    pub page: usize,
}

impl SearchRequest {
    /// Encode as query pairs for the wire. Empty filter members are omitted.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if !self.query.is_empty() {
            pairs.push(("query", self.query.clone()));
        }
        match self.mode {
            SearchMode::Default => {}
            SearchMode::Discounted => pairs.push(("mode", "discounted".to_string())),
            SearchMode::Recommended => pairs.push(("mode", "recommended".to_string())),
        }
        pairs.push(("page", self.page.to_string()));
        pairs.push(("size", PAGE_SIZE.to_string()));
        self.filters.extend_query(&mut pairs);
        pairs
    }
}

/// Thin wrapper over the search endpoint. The abort signal is checked by
/// this layer so callers can tell "cancelled" apart from "failed".
#[derive(Debug, Clone)]
pub struct SearchService {
    api: Arc<ApiClient>,
}

impl SearchService {
    /// Search over the shared client.
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Issue one page fetch, racing it against the cancel token. A
    /// cancelled fetch resolves to [`ApiError::Cancelled`] and is never
    /// reported as a failure.
    pub async fn search(
        &self,
        request: &SearchRequest,
        cancel: &CancelToken,
    ) -> Result<Vec<Game>, ApiError> {
        if cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }
        let query = request.to_query();
        let call = self
            .api
            .get::<Vec<Game>>("games/search", &query, MSG_SEARCH_GAMES);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(page = request.page, "search fetch cancelled");
                Err(ApiError::Cancelled)
            }
            result = call => {
                if let Err(err) = &result {
                    error!("search fetch failed: {err}");
                }
                result
            }
        }
    }

    /// Degrade-gracefully variant: a non-cancellation failure yields the
    /// placeholder set instead of an error. Cancellation still propagates.
    pub async fn search_or_fallback(
        &self,
        request: &SearchRequest,
        cancel: &CancelToken,
    ) -> Result<Vec<Game>, ApiError> {
        match self.search(request, cancel).await {
            Ok(games) => Ok(games),
            Err(ApiError::Cancelled) => Err(ApiError::Cancelled),
            Err(err) => {
                error!("search degraded to placeholder games: {err}");
                Ok(fallback_games())
            }
        }
    }
}

/// Fixed placeholder games shown when the search endpoint is unreachable.
pub fn fallback_games() -> Vec<Game> {
    let placeholder = |id: u64, title: &str, price: u32| Game {
        id,
        title: title.to_string(),
        thumbnail_url: None,
        current_price: price,
        lowest_price: price,
        rating: None,
        category_ids: Vec::new(),
        single_player: true,
        multi_player: false,
        developer: None,
        publisher: None,
        release_date: None,
    };
    vec![
        placeholder(1, "Sample Quest", 20_000),
        placeholder(2, "Placeholder Racer", 30_000),
        placeholder(3, "Offline Tactics", 10_000),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_query_includes_mode_and_paging() {
        let request = SearchRequest {
            query: "zelda".to_string(),
            mode: SearchMode::Discounted,
            page: 2,
            ..Default::default()
        };
        let pairs = request.to_query();
        assert!(pairs.contains(&("query", "zelda".to_string())));
        assert!(pairs.contains(&("mode", "discounted".to_string())));
        assert!(pairs.contains(&("page", "2".to_string())));
        assert!(pairs.contains(&("size", PAGE_SIZE.to_string())));
    }

    #[test]
    fn default_mode_is_omitted_from_query() {
        let request = SearchRequest::default();
        let pairs = request.to_query();
        assert!(!pairs.iter().any(|(key, _)| *key == "mode"));
        assert!(!pairs.iter().any(|(key, _)| *key == "query"));
    }

    #[test]
    fn fallback_set_is_small_and_fixed() {
        let games = fallback_games();
        assert_eq!(games.len(), 3);
        assert_eq!(games, fallback_games());
    }
}
