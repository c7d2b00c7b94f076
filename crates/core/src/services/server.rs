//! Party-finding server endpoints and invite link validation.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use tracing::error;

use crate::{api::ApiClient, error::ApiError, models::ServerInfo};

/// Envelope discriminator for listing a game's servers.
pub const MSG_GET_SERVERS: &str = "SUCCESS_GET_SERVERS";
/// Envelope discriminator for registering a server.
pub const MSG_ADD_SERVER: &str = "SUCCESS_ADD_SERVER";
/// Envelope discriminator for deleting a server.
pub const MSG_DELETE_SERVER: &str = "SUCCESS_DELETE_SERVER";
/// Envelope discriminator for listing owned servers.
pub const MSG_GET_MY_SERVERS: &str = "SUCCESS_GET_MY_SERVERS";

static INVITE_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://(discord\.gg|discord\.com/invite)/[A-Za-z0-9-]+$")
        .expect("failed to compile invite link regex")
});

/// Shape check for a Discord invite link. Inline validation error, never
/// the global error channel.
pub fn is_valid_invite_link(url: &str) -> bool {
    INVITE_LINK_RE.is_match(url.trim())
}

/// Party-finding server CRUD.
#[derive(Debug, Clone)]
pub struct ServerService {
    api: Arc<ApiClient>,
}

impl ServerService {
    /// Server operations over the shared client.
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Fetch the servers registered under a game.
    pub async fn list(&self, game_id: u64) -> Result<Vec<ServerInfo>, ApiError> {
        self.api
            .get(&format!("games/{game_id}/servers"), &[], MSG_GET_SERVERS)
            .await
            .map_err(|err| {
                error!(game_id, "failed to fetch servers: {err}");
                err
            })
    }

    /// Servers owned by the authenticated user.
    pub async fn mine(&self) -> Result<Vec<ServerInfo>, ApiError> {
        self.api
            .get("servers/mine", &[], MSG_GET_MY_SERVERS)
            .await
            .map_err(|err| {
                error!("failed to fetch owned servers: {err}");
                err
            })
    }

    /// Register an invite, then refetch the game's list so the caller sees
    /// the server-resolved metadata (name, icon, member count, expiry).
    pub async fn add(&self, game_id: u64, invite_url: &str) -> Result<Vec<ServerInfo>, ApiError> {
        self.api
            .post::<serde_json::Value, _>(
                &format!("games/{game_id}/servers"),
                &json!({ "inviteUrl": invite_url }),
                MSG_ADD_SERVER,
            )
            .await
            .map_err(|err| {
                error!(game_id, "failed to add server: {err}");
                err
            })?;
        self.list(game_id).await
    }

    /// Delete an owned server. Ownership is re-checked server-side; the
    /// UI only offers the action to the owner.
    pub async fn delete(&self, server_id: u64) -> Result<(), ApiError> {
        self.api
            .delete::<serde_json::Value>(&format!("servers/{server_id}"), MSG_DELETE_SERVER)
            .await
            .map(|_| ())
            .map_err(|err| {
                error!(server_id, "failed to delete server: {err}");
                err
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invite_link_shapes() {
        assert!(is_valid_invite_link("https://discord.gg/abc123"));
        assert!(is_valid_invite_link("https://discord.com/invite/party-up"));
        assert!(is_valid_invite_link("  https://discord.gg/abc123  "));
        assert!(!is_valid_invite_link("http://discord.gg/abc123"));
        assert!(!is_valid_invite_link("https://example.com/invite/abc"));
        assert!(!is_valid_invite_link("https://discord.gg/"));
        assert!(!is_valid_invite_link("discord.gg/abc123"));
    }
}
