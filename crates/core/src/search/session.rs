//! Run-scoped session storage.
//!
//! The browser original checkpoints search state into tab-scoped session
//! storage. Here the store lives for the process, which matches the same
//! lifetime: it survives in-app navigation, not a restart.

use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{search::filters::FilterOptions, services::search::SearchMode};

/// Key under which the search page snapshot is stored.
pub const SEARCH_PAGE_STATE_KEY: &str = "searchPageState";

/// Snapshot of the search page's committed UI state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSnapshot {
    /// Free-text query at checkpoint time.
    pub search_query: String,
    /// Filter selection at checkpoint time.
    pub active_filters: FilterOptions,
    /// Discount toggle was on.
    pub discount_filter: bool,
    /// Recommended toggle was on.
    pub recommended_filter: bool,
}

impl SearchSnapshot {
    /// Mode implied by the two toggle flags.
    pub fn mode(&self) -> SearchMode {
        if self.discount_filter {
            SearchMode::Discounted
        } else if self.recommended_filter {
            SearchMode::Recommended
        } else {
            SearchMode::Default
        }
    }
}

/// String-keyed JSON store, clonable across views.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl SessionStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw string under `key`.
    pub fn set_raw(&self, key: &str, value: String) {
        self.entries.lock().insert(key.to_string(), value);
    }

    /// Fetch the raw string under `key`.
    pub fn get_raw(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    /// Drop the entry under `key`.
    pub fn remove(&self, key: &str) {
        self.entries.lock().remove(key);
    }

    /// Persist the search snapshot. Serialization failure is logged and
    /// swallowed; a lost checkpoint only costs state restoration.
    pub fn save_snapshot(&self, snapshot: &SearchSnapshot) {
        match serde_json::to_string(snapshot) {
            Ok(json) => self.set_raw(SEARCH_PAGE_STATE_KEY, json),
            Err(err) => warn!("failed to serialize search snapshot: {err}"),
        }
    }

    /// Load the search snapshot, dropping an unreadable one.
    pub fn load_snapshot(&self) -> Option<SearchSnapshot> {
        let raw = self.get_raw(SEARCH_PAGE_STATE_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!("discarding unreadable search snapshot: {err}");
                self.remove(SEARCH_PAGE_STATE_KEY);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_round_trip_is_lossless() {
        let store = SessionStore::new();
        let snapshot = SearchSnapshot {
            search_query: "hollow knight".to_string(),
            active_filters: FilterOptions {
                categories: vec![2, 5, 7],
                min_rating: Some(4.5),
                price_min: 10_000,
                price_max: 60_000,
                players_min: 2,
                players_max: 4,
                single_player: false,
                multi_player: true,
            },
            discount_filter: true,
            recommended_filter: false,
        };
        store.save_snapshot(&snapshot);
        assert_eq!(store.load_snapshot(), Some(snapshot));
    }

    #[test]
    fn unreadable_snapshot_is_discarded() {
        let store = SessionStore::new();
        store.set_raw(SEARCH_PAGE_STATE_KEY, "{not json".to_string());
        assert!(store.load_snapshot().is_none());
        assert!(store.get_raw(SEARCH_PAGE_STATE_KEY).is_none());
    }

    #[test]
    fn missing_snapshot_is_none() {
        assert!(SessionStore::new().load_snapshot().is_none());
    }
}
