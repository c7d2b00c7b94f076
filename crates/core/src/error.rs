//! Error taxonomy for the REST client layer.

use thiserror::Error;

/// Failures observable from an API call. Cancellation is a member so the
/// fetch layer can hand it back through the same channel, but it is never
/// surfaced as a user-visible error nor reported to telemetry.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure, including the client's fixed request timeout.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success HTTP status.
    #[error("server returned {status}: {body}")]
    Status {
        /// The HTTP status returned.
        status: reqwest::StatusCode,
        /// Response body, kept for the log.
        body: String,
    },

    /// The `{message, data}` envelope carried an unexpected discriminator.
    #[error("unexpected response message: {message}")]
    Envelope {
        /// The discriminator actually received.
        message: String,
    },

    /// Body did not decode into the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The in-flight request was aborted by its owner.
    #[error("request cancelled")]
    Cancelled,
}

impl ApiError {
    /// True for [`ApiError::Cancelled`], which callers filter out of
    /// error reporting.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_is_distinguishable() {
        assert!(ApiError::Cancelled.is_cancelled());
        assert!(!ApiError::Envelope {
            message: "NOPE".to_string()
        }
        .is_cancelled());
    }
}
