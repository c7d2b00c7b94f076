//! Shared application state: the signed-in profile and the category list.
//!
//! Exactly one state container exists for this data. Both values are
//! fetched once at app start and refreshed on demand; updates are
//! whole-object replacements, never partial mutation.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::{
    error::ApiError,
    models::{Category, UserProfile},
    services::{CategoryService, UserService},
};

#[derive(Debug, Default)]
struct Shared {
    profile: Option<UserProfile>,
    categories: Vec<Category>,
}

/// Clonable handle to the shared state.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    inner: Arc<RwLock<Shared>>,
}

impl AppState {
    /// Empty state: guest, no categories yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch categories and the profile once at startup. A profile fetch
    /// failure means "guest", not an error; a category failure propagates
    /// since every screen needs the list.
    pub async fn initialize(
        &self,
        categories: &CategoryService,
        users: &UserService,
    ) -> Result<(), ApiError> {
        let list = categories.list().await?;
        let profile = match users.profile().await {
            Ok(profile) => Some(profile),
            Err(err) if err.is_cancelled() => None,
            Err(err) => {
                warn!("no signed-in profile ({err}); continuing as guest");
                None
            }
        };
        let mut shared = self.inner.write();
        shared.categories = list;
        shared.profile = profile;
        info!(
            categories = shared.categories.len(),
            signed_in = shared.profile.is_some(),
            "application state initialized"
        );
        Ok(())
    }

    /// Re-fetch the signed-in profile, e.g. after login completes.
    pub async fn refresh_profile(&self, users: &UserService) -> Result<(), ApiError> {
        let profile = users.profile().await?;
        self.inner.write().profile = Some(profile);
        Ok(())
    }

    /// Re-fetch the category list.
    pub async fn refresh_categories(&self, categories: &CategoryService) -> Result<(), ApiError> {
        let list = categories.list().await?;
        self.inner.write().categories = list;
        Ok(())
    }

    /// Replace the cached profile wholesale (e.g. after a profile save).
    pub fn set_profile(&self, profile: Option<UserProfile>) {
        self.inner.write().profile = profile;
    }

    /// The cached profile, if signed in.
    pub fn profile(&self) -> Option<UserProfile> {
        self.inner.read().profile.clone()
    }

    /// Whether a profile is present.
    pub fn is_signed_in(&self) -> bool {
        self.inner.read().profile.is_some()
    }

    /// Snapshot of the cached category list.
    pub fn categories(&self) -> Vec<Category> {
        self.inner.read().categories.clone()
    }

    /// Display name for a category id, when known.
    pub fn category_name(&self, id: u64) -> Option<String> {
        self.inner
            .read()
            .categories
            .iter()
            .find(|category| category.id == id)
            .map(|category| category.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors_read_replaced_state() {
        let state = AppState::new();
        assert!(!state.is_signed_in());
        assert!(state.category_name(1).is_none());

        state.inner.write().categories = vec![
            Category {
                id: 1,
                name: "RPG".to_string(),
            },
            Category {
                id: 2,
                name: "Racing".to_string(),
            },
        ];
        state.set_profile(Some(UserProfile {
            id: 9,
            nickname: "dana".to_string(),
            discord_link: None,
            preferred_categories: vec![1],
        }));

        assert!(state.is_signed_in());
        assert_eq!(state.category_name(2).as_deref(), Some("Racing"));
        assert_eq!(state.profile().unwrap().nickname, "dana");

        state.set_profile(None);
        assert!(!state.is_signed_in());
    }
}
