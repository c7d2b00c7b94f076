//! Comment CRUD against the detail-page endpoints.

use std::sync::Arc;

use serde_json::json;
use tracing::error;

use crate::{api::ApiClient, error::ApiError, models::Comment};

/// Envelope discriminator for listing comments.
pub const MSG_GET_COMMENTS: &str = "SUCCESS_GET_COMMENTS";
/// Envelope discriminator for posting a comment.
pub const MSG_CREATE_COMMENT: &str = "SUCCESS_CREATE_COMMENT";
/// Envelope discriminator for editing a comment.
pub const MSG_UPDATE_COMMENT: &str = "SUCCESS_UPDATE_COMMENT";
/// Envelope discriminator for deleting a comment.
pub const MSG_DELETE_COMMENT: &str = "SUCCESS_DELETE_COMMENT";

/// Comment CRUD for a game's detail page. Content limits are enforced by
/// [`crate::models::validate_comment`] at the input field; this layer
/// assumes validated input.
#[derive(Debug, Clone)]
pub struct CommentService {
    api: Arc<ApiClient>,
}

impl CommentService {
    /// Comment operations over the shared client.
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Fetch the comments on a game.
    pub async fn list(&self, game_id: u64) -> Result<Vec<Comment>, ApiError> {
        self.api
            .get(&format!("games/{game_id}/comments"), &[], MSG_GET_COMMENTS)
            .await
            .map_err(|err| {
                error!(game_id, "failed to fetch comments: {err}");
                err
            })
    }

    /// Post a comment on a game.
    pub async fn create(&self, game_id: u64, content: &str) -> Result<Comment, ApiError> {
        self.api
            .post(
                &format!("games/{game_id}/comments"),
                &json!({ "content": content }),
                MSG_CREATE_COMMENT,
            )
            .await
            .map_err(|err| {
                error!(game_id, "failed to create comment: {err}");
                err
            })
    }

    /// Edit an owned comment.
    pub async fn update(&self, comment_id: u64, content: &str) -> Result<Comment, ApiError> {
        self.api
            .put(
                &format!("comments/{comment_id}"),
                &json!({ "content": content }),
                MSG_UPDATE_COMMENT,
            )
            .await
            .map_err(|err| {
                error!(comment_id, "failed to update comment: {err}");
                err
            })
    }

    /// Delete an owned comment.
    pub async fn delete(&self, comment_id: u64) -> Result<(), ApiError> {
        self.api
            .delete::<serde_json::Value>(&format!("comments/{comment_id}"), MSG_DELETE_COMMENT)
            .await
            .map(|_| ())
            .map_err(|err| {
                error!(comment_id, "failed to delete comment: {err}");
                err
            })
    }
}
