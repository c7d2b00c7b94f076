//! Category list lookups.

use std::sync::Arc;

use tracing::error;

use crate::{api::ApiClient, error::ApiError, models::Category};

/// Envelope discriminator for the category list.
pub const MSG_GET_CATEGORIES: &str = "SUCCESS_GET_CATEGORIES";

/// Category lookup. The list is global and rarely changes; callers cache
/// it in [`crate::state::AppState`] for the session.
#[derive(Debug, Clone)]
pub struct CategoryService {
    api: Arc<ApiClient>,
}

impl CategoryService {
    /// Service over the shared client.
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Fetch every category.
    pub async fn list(&self) -> Result<Vec<Category>, ApiError> {
        self.api
            .get("categories", &[], MSG_GET_CATEGORIES)
            .await
            .map_err(|err| {
                error!("failed to fetch categories: {err}");
                err
            })
    }
}
