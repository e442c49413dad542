//! Error taxonomy surfaced by the reminder pipeline.

use thiserror::Error;

use crate::github::IntakeError;
use crate::persistence::PersistenceError;
use crate::slack::SlackError;

/// Failures a reminder request can end in.
///
/// Every variant displays as text fit to show a Slack user or return in an
/// HTTP body.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReminderError {
    /// A team or config record does not exist.
    #[error("{message}")]
    NotFound {
        /// What was missing.
        message: String,
    },

    /// GitHub, Slack or storage failed.
    #[error("{message}")]
    Upstream {
        /// Failure detail.
        message: String,
    },

    /// An inbound payload could not be understood.
    #[error("malformed input: {message}")]
    MalformedInput {
        /// Parser detail.
        message: String,
    },
}

impl ReminderError {
    /// Wraps a GitHub failure with the repository it happened for.
    #[must_use]
    pub fn for_repository(repository: &str, error: &IntakeError) -> Self {
        Self::Upstream {
            message: format!("{repository}: {error}"),
        }
    }
}

impl From<IntakeError> for ReminderError {
    fn from(error: IntakeError) -> Self {
        Self::Upstream {
            message: error.to_string(),
        }
    }
}

impl From<SlackError> for ReminderError {
    fn from(error: SlackError) -> Self {
        match error {
            SlackError::InvalidPayload { message } => Self::MalformedInput { message },
            other => Self::Upstream {
                message: other.to_string(),
            },
        }
    }
}

impl From<PersistenceError> for ReminderError {
    fn from(error: PersistenceError) -> Self {
        match error {
            PersistenceError::TeamNotFound { .. } | PersistenceError::ConfigNotFound { .. } => {
                Self::NotFound {
                    message: error.to_string(),
                }
            }
            other => Self::Upstream {
                message: other.to_string(),
            },
        }
    }
}
