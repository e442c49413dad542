//! Slack Events API dispatch.
//!
//! Each delivery to the events endpoint is classified as a verification
//! handshake or an event callback. Callbacks are sub-dispatched on the inner
//! event kind and may produce one reply for the originating channel.

use regex::Regex;
use tracing::{debug, warn};

use crate::reminder::{ReminderError, ReminderService};
use crate::slack::{
    EventCallback, EventsApiPayload, InnerEvent, MentionEvent, MessageEvent, SlackGateway,
    challenge_of, parse_payload,
};

/// Command pattern that asks for the review reminder digest.
pub const DEFAULT_COMMAND_PATTERN: &str = "/pr|pull request";

/// Keywords the bot echoes back when they appear in channel messages.
pub const DEFAULT_KEYWORD_PATTERN: &str = "酒|ビール|ワイン|パクチー|肉|飲み";

/// Matching rules and identity used while dispatching events.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Mention text that triggers a digest.
    pub command_pattern: Regex,
    /// Keywords picked out of plain messages.
    pub keyword_pattern: Regex,
    /// The bot's own user id; looked up with `auth.test` when absent.
    pub bot_user_id: Option<String>,
    /// Legacy verification token payloads must carry, when set.
    pub verification_token: Option<String>,
}

impl DispatchConfig {
    /// Compiles the command and keyword patterns.
    ///
    /// # Errors
    ///
    /// Returns the [`regex::Error`] of the first pattern that fails to
    /// compile.
    pub fn new(command_pattern: &str, keyword_pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            command_pattern: Regex::new(command_pattern)?,
            keyword_pattern: Regex::new(keyword_pattern)?,
            bot_user_id: None,
            verification_token: None,
        })
    }

    /// Sets the bot's own user id.
    #[must_use]
    pub fn with_bot_user_id(mut self, bot_user_id: Option<String>) -> Self {
        self.bot_user_id = bot_user_id;
        self
    }

    /// Sets the verification token inbound payloads must carry.
    #[must_use]
    pub fn with_verification_token(mut self, verification_token: Option<String>) -> Self {
        self.verification_token = verification_token;
        self
    }
}

/// What the events endpoint should do with a delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Echo the handshake challenge as the response body.
    Challenge(String),
    /// Post `text` to `channel`, then acknowledge.
    Reply {
        /// Channel the triggering event came from.
        channel: String,
        /// Reply body.
        text: String,
    },
    /// Acknowledge without replying.
    Silent,
}

/// Classifies inbound payloads and builds replies.
pub struct EventDispatcher<'a> {
    config: &'a DispatchConfig,
    slack: &'a dyn SlackGateway,
    reminders: ReminderService<'a>,
}

impl<'a> EventDispatcher<'a> {
    /// Creates a dispatcher for one delivery.
    #[must_use]
    pub fn new(
        config: &'a DispatchConfig,
        slack: &'a dyn SlackGateway,
        reminders: ReminderService<'a>,
    ) -> Self {
        Self {
            config,
            slack,
            reminders,
        }
    }

    /// Dispatches a raw events endpoint body.
    ///
    /// A body that is not a typed envelope but carries a `challenge` field is
    /// treated as a handshake.
    ///
    /// # Errors
    ///
    /// Returns [`ReminderError::MalformedInput`] when the body cannot be
    /// parsed or carries the wrong verification token, and
    /// [`ReminderError::Upstream`] when the bot's own id cannot be looked up.
    /// Digest failures never surface here; they become reply text.
    pub async fn dispatch(&self, body: &str) -> Result<DispatchOutcome, ReminderError> {
        let payload = match parse_payload(body) {
            Ok(payload) => payload,
            Err(parse_error) => {
                let challenge = challenge_of(body).map_err(|_| parse_error)?;
                self.verify_token(None)?;
                debug!("answering untyped verification handshake");
                return Ok(DispatchOutcome::Challenge(challenge));
            }
        };
        self.verify_token(payload.token())?;

        match payload {
            EventsApiPayload::UrlVerification(handshake) => {
                debug!("answering verification handshake");
                Ok(DispatchOutcome::Challenge(handshake.challenge))
            }
            EventsApiPayload::EventCallback(callback) => self.dispatch_callback(callback).await,
            EventsApiPayload::Unsupported => {
                debug!("ignoring unsupported envelope");
                Ok(DispatchOutcome::Silent)
            }
        }
    }

    fn verify_token(&self, token: Option<&str>) -> Result<(), ReminderError> {
        match self.config.verification_token.as_deref() {
            Some(expected) if token != Some(expected) => Err(ReminderError::MalformedInput {
                message: "verification token mismatch".to_owned(),
            }),
            _ => Ok(()),
        }
    }

    async fn dispatch_callback(
        &self,
        callback: EventCallback,
    ) -> Result<DispatchOutcome, ReminderError> {
        match callback.event {
            InnerEvent::AppMention(mention) => {
                if self.is_own(&mention.user).await? {
                    debug!(channel = %mention.channel, "suppressing own mention");
                    return Ok(DispatchOutcome::Silent);
                }
                Ok(self.reply_to_mention(&callback.team_id, mention).await)
            }
            InnerEvent::Message(message) => {
                let Some(user) = message.user.as_deref() else {
                    debug!(channel = %message.channel, "ignoring message without a user");
                    return Ok(DispatchOutcome::Silent);
                };
                if self.is_own(user).await? {
                    debug!(channel = %message.channel, "suppressing own message");
                    return Ok(DispatchOutcome::Silent);
                }
                Ok(self.reply_to_message(user, &message))
            }
            InnerEvent::Other => {
                debug!(team = %callback.team_id, "ignoring unhandled event kind");
                Ok(DispatchOutcome::Silent)
            }
        }
    }

    async fn is_own(&self, user: &str) -> Result<bool, ReminderError> {
        if let Some(own) = self.config.bot_user_id.as_deref() {
            return Ok(own == user);
        }
        Ok(self.slack.bot_user_id().await? == user)
    }

    async fn reply_to_mention(&self, team_id: &str, mention: MentionEvent) -> DispatchOutcome {
        let text = if self.config.command_pattern.is_match(&mention.text) {
            match self.reminders.digest_for_team(team_id).await {
                Ok(digest) => digest,
                Err(ReminderError::NotFound { .. }) => {
                    warn!(team = %team_id, "digest requested for unconfigured team");
                    format!("No configuration found for team {team_id}")
                }
                Err(failure) => {
                    warn!(team = %team_id, "digest failed: {failure}");
                    format!("Failed to get the summary of your pull requests because of {failure}")
                }
            }
        } else {
            format!(
                "<@{}> Sorry, I can't understand your message: {}",
                mention.user, mention.text
            )
        };
        DispatchOutcome::Reply {
            channel: mention.channel,
            text,
        }
    }

    fn reply_to_message(&self, user: &str, message: &MessageEvent) -> DispatchOutcome {
        let keywords: Vec<&str> = self
            .config
            .keyword_pattern
            .find_iter(&message.text)
            .map(|found| found.as_str())
            .collect();
        if keywords.is_empty() {
            return DispatchOutcome::Silent;
        }
        DispatchOutcome::Reply {
            channel: message.channel.clone(),
            text: format!("<@{user}> Did you say {} !?", keywords.join(" and ")),
        }
    }
}
