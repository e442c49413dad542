//! Request handlers.

use axum::Form;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::{debug, error, warn};

use super::AppState;
use crate::dispatch::{DispatchOutcome, EventDispatcher};
use crate::reminder::{ReminderError, ReminderService};

const PLAIN_TEXT: &str = "text/plain; charset=utf-8";

/// Form body of the slash command.
#[derive(Debug, Deserialize)]
pub(super) struct CommandForm {
    #[serde(default)]
    team_id: String,
}

impl AppState {
    fn reminders(&self) -> ReminderService<'_> {
        ReminderService::new(
            self.registry.as_ref(),
            self.github.as_ref(),
            self.slack.as_ref(),
            self.telemetry.as_ref(),
        )
    }
}

#[expect(clippy::unused_async, reason = "axum handlers are async")]
pub(super) async fn health() -> Response {
    (StatusCode::OK, [(CONTENT_TYPE, "text/plain")], "Hello!\n").into_response()
}

pub(super) async fn pull_request_digest(
    State(state): State<AppState>,
    Form(form): Form<CommandForm>,
) -> Response {
    match state.reminders().digest_for_team(&form.team_id).await {
        Ok(digest) => (StatusCode::OK, [(CONTENT_TYPE, PLAIN_TEXT)], digest).into_response(),
        Err(failure @ ReminderError::NotFound { .. }) => {
            warn!(team = %form.team_id, "digest requested for unknown team");
            (
                StatusCode::FORBIDDEN,
                [(CONTENT_TYPE, PLAIN_TEXT)],
                failure.to_string(),
            )
                .into_response()
        }
        Err(failure) => {
            error!(team = %form.team_id, "digest failed: {failure}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(CONTENT_TYPE, PLAIN_TEXT)],
                failure.to_string(),
            )
                .into_response()
        }
    }
}

pub(super) async fn slack_events(State(state): State<AppState>, body: Bytes) -> Response {
    let Ok(text) = std::str::from_utf8(&body) else {
        warn!("events body is not UTF-8");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    let dispatcher =
        EventDispatcher::new(&state.dispatch, state.slack.as_ref(), state.reminders());
    match dispatcher.dispatch(text).await {
        Ok(DispatchOutcome::Challenge(challenge)) => {
            (StatusCode::OK, [(CONTENT_TYPE, "text")], challenge).into_response()
        }
        Ok(DispatchOutcome::Reply { channel, text: reply }) => {
            if let Err(failure) = state.slack.post_message(&channel, &reply).await {
                warn!(channel = %channel, "failed to post reply: {failure}");
            }
            StatusCode::OK.into_response()
        }
        Ok(DispatchOutcome::Silent) => StatusCode::OK.into_response(),
        Err(ReminderError::MalformedInput { message }) => {
            debug!("rejecting events body: {message}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Err(failure) => {
            error!("event dispatch failed: {failure}");
            StatusCode::OK.into_response()
        }
    }
}
