//! Video list lookups.

use std::sync::Arc;

use tracing::error;

use crate::{api::ApiClient, error::ApiError, models::Video};

/// Envelope discriminator for a game's video list.
pub const MSG_GET_VIDEOS: &str = "SUCCESS_GET_VIDEOS";

/// Video lookups for the detail page's video tab.
#[derive(Debug, Clone)]
pub struct VideoService {
    api: Arc<ApiClient>,
}

impl VideoService {
    /// Video lookups over the shared client.
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Fetch the videos attached to a game.
    pub async fn list(&self, game_id: u64) -> Result<Vec<Video>, ApiError> {
        self.api
            .get(&format!("games/{game_id}/videos"), &[], MSG_GET_VIDEOS)
            .await
            .map_err(|err| {
                error!(game_id, "failed to fetch videos: {err}");
                err
            })
    }
}
