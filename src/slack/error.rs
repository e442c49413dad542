//! Error types exposed by the Slack layer.

use thiserror::Error;

/// Errors surfaced while talking to the Slack Web API or parsing Slack
/// payloads.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SlackError {
    /// The configured API base URL could not be parsed.
    #[error("Slack API URL is invalid: {0}")]
    InvalidUrl(String),

    /// No bot token was configured.
    #[error("Slack bot token is required")]
    MissingToken,

    /// Slack rejected the token.
    #[error("Slack rejected the token: {message}")]
    Authentication {
        /// Error code returned by Slack (e.g. `invalid_auth`).
        message: String,
    },

    /// A Web API method returned `ok: false` or an unexpected status.
    #[error("Slack API error from {method}: {message}")]
    Api {
        /// Web API method name (e.g. `chat.postMessage`).
        method: String,
        /// Error code or response body describing the failure.
        message: String,
    },

    /// Slack asked the caller to back off.
    #[error("Slack API rate limited {method}; retry after {retry_after_secs} seconds")]
    RateLimited {
        /// Web API method name.
        method: String,
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// Networking failed while calling Slack.
    #[error("network error talking to Slack: {message}")]
    Network {
        /// Transport-level error detail.
        message: String,
    },

    /// A Web API method answered with a body that does not decode.
    #[error("unexpected response from Slack {method}: {message}")]
    UnexpectedResponse {
        /// Web API method name.
        method: String,
        /// Decoder detail.
        message: String,
    },

    /// An inbound payload could not be understood.
    #[error("invalid Slack payload: {message}")]
    InvalidPayload {
        /// Parser detail.
        message: String,
    },
}

impl From<reqwest::Error> for SlackError {
    fn from(error: reqwest::Error) -> Self {
        let message = if error.is_timeout() {
            format!("request timed out: {error}")
        } else if error.is_connect() {
            format!("connection failed: {error}")
        } else {
            error.to_string()
        };
        Self::Network { message }
    }
}

impl From<serde_json::Error> for SlackError {
    fn from(error: serde_json::Error) -> Self {
        Self::InvalidPayload {
            message: error.to_string(),
        }
    }
}
