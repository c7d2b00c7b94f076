//! Profile endpoints and the uniqueness checks.

use std::sync::Arc;

use serde::Deserialize;
use tracing::error;

use crate::{api::ApiClient, error::ApiError, models::UserProfile};

/// Envelope discriminator for the profile fetch.
pub const MSG_GET_PROFILE: &str = "SUCCESS_GET_PROFILE";
/// Envelope discriminator for the profile save.
pub const MSG_SAVE_PROFILE: &str = "SUCCESS_SAVE_PROFILE";
/// Envelope discriminator for the nickname check.
pub const MSG_CHECK_NICKNAME: &str = "SUCCESS_CHECK_NICKNAME";
/// Envelope discriminator for the Discord link check.
pub const MSG_CHECK_DISCORD_LINK: &str = "SUCCESS_CHECK_DISCORD_LINK";

#[derive(Debug, Deserialize)]
struct Availability {
    available: bool,
}

/// Profile fetch/save and the debounced uniqueness checks behind the
/// profile editor.
#[derive(Debug, Clone)]
pub struct UserService {
    api: Arc<ApiClient>,
}

impl UserService {
    /// User operations over the shared client.
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Fetch the authenticated profile. Fails for guests; the caller
    /// treats that as "signed out", not as an error.
    pub async fn profile(&self) -> Result<UserProfile, ApiError> {
        self.api.get("users/me", &[], MSG_GET_PROFILE).await
    }

    /// Persist the edited profile.
    pub async fn save_profile(&self, profile: &UserProfile) -> Result<UserProfile, ApiError> {
        self.api
            .put("users/me", profile, MSG_SAVE_PROFILE)
            .await
            .map_err(|err| {
                error!("failed to save profile: {err}");
                err
            })
    }

    /// Whether a nickname is free to claim.
    pub async fn nickname_available(&self, nickname: &str) -> Result<bool, ApiError> {
        self.api
            .get::<Availability>(
                "users/check-nickname",
                &[("nickname", nickname.to_string())],
                MSG_CHECK_NICKNAME,
            )
            .await
            .map(|check| check.available)
            .map_err(|err| {
                error!("nickname availability check failed: {err}");
                err
            })
    }

    /// Whether a Discord link is free to claim.
    pub async fn discord_link_available(&self, link: &str) -> Result<bool, ApiError> {
        self.api
            .get::<Availability>(
                "users/check-discord-link",
                &[("link", link.to_string())],
                MSG_CHECK_DISCORD_LINK,
            )
            .await
            .map(|check| check.available)
            .map_err(|err| {
                error!("discord link availability check failed: {err}");
                err
            })
    }
}
