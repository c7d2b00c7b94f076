//! The search page subsystem: state reconciliation, debounced fetching,
//! cancellation, and sentinel-driven pagination.

pub mod controller;
pub mod filters;
pub mod query;
pub mod session;

pub use controller::{
    sentinel_in_view, ApiSearchBackend, SearchBackend, SearchController, SearchPhase,
    SearchViewState, SEARCH_ERROR_MESSAGE, TYPING_DEBOUNCE,
};
pub use filters::{CategoryPicker, FilterOptions, Notice, NOTICE_TTL, PLAYER_CEILING, PRICE_CEILING};
pub use query::QueryParams;
pub use session::{SearchSnapshot, SessionStore, SEARCH_PAGE_STATE_KEY};
