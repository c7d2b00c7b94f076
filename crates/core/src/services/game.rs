//! Game detail and main-page shelf fetches.

use std::sync::Arc;

use tracing::error;

use crate::{
    api::ApiClient,
    error::ApiError,
    models::{Game, PriceRecord},
};

/// Envelope discriminator for a game detail fetch.
pub const MSG_GET_GAME: &str = "SUCCESS_GET_GAME";
/// Envelope discriminator for the price history fetch.
pub const MSG_GET_PRICE_HISTORY: &str = "SUCCESS_GET_PRICE_HISTORY";
/// Envelope discriminator for the discounted shelf.
pub const MSG_GET_DISCOUNTED: &str = "SUCCESS_GET_DISCOUNTED_GAMES";
/// Envelope discriminator for the popular shelf.
pub const MSG_GET_POPULAR: &str = "SUCCESS_GET_POPULAR_GAMES";

/// Game detail and main-page shelf lookups.
#[derive(Debug, Clone)]
pub struct GameService {
    api: Arc<ApiClient>,
}

impl GameService {
    /// Game lookups over the shared client.
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Fetch one game for the detail page.
    pub async fn detail(&self, game_id: u64) -> Result<Game, ApiError> {
        self.api
            .get(&format!("games/{game_id}"), &[], MSG_GET_GAME)
            .await
            .map_err(|err| {
                error!(game_id, "failed to fetch game detail: {err}");
                err
            })
    }

    /// Historical price points for the detail page's price tab.
    pub async fn price_history(&self, game_id: u64) -> Result<Vec<PriceRecord>, ApiError> {
        self.api
            .get(
                &format!("games/{game_id}/prices"),
                &[],
                MSG_GET_PRICE_HISTORY,
            )
            .await
            .map_err(|err| {
                error!(game_id, "failed to fetch price history: {err}");
                err
            })
    }

    /// Currently-discounted shelf for the main page.
    pub async fn discounted_shelf(&self) -> Result<Vec<Game>, ApiError> {
        self.api
            .get("games/discounted", &[], MSG_GET_DISCOUNTED)
            .await
            .map_err(|err| {
                error!("failed to fetch discounted shelf: {err}");
                err
            })
    }

    /// Popular-games shelf for the main page.
    pub async fn popular_shelf(&self) -> Result<Vec<Game>, ApiError> {
        self.api
            .get("games/popular", &[], MSG_GET_POPULAR)
            .await
            .map_err(|err| {
                error!("failed to fetch popular shelf: {err}");
                err
            })
    }
}
