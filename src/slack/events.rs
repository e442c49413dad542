//! Inbound Slack Events API payloads.
//!
//! A delivery is either a URL verification handshake or an event callback
//! wrapping one inner event. Only `app_mention` and `message` inner events
//! are modelled; everything else deserialises to [`InnerEvent::Other`].

use serde::Deserialize;

use super::error::SlackError;

/// Top-level payload posted to the events endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventsApiPayload {
    /// Endpoint ownership handshake.
    UrlVerification(UrlVerification),
    /// A subscribed event occurred.
    EventCallback(EventCallback),
    /// Any other envelope type (e.g. `app_rate_limited`).
    #[serde(other)]
    Unsupported,
}

impl EventsApiPayload {
    /// Returns the legacy verification token carried by the payload.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::UrlVerification(handshake) => handshake.token.as_deref(),
            Self::EventCallback(callback) => callback.token.as_deref(),
            Self::Unsupported => None,
        }
    }
}

/// URL verification handshake body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UrlVerification {
    /// Value that must be echoed back verbatim.
    pub challenge: String,
    /// Legacy verification token.
    #[serde(default)]
    pub token: Option<String>,
}

/// Event callback envelope.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EventCallback {
    /// Workspace the event originated in.
    pub team_id: String,
    /// Legacy verification token.
    #[serde(default)]
    pub token: Option<String>,
    /// The wrapped event.
    pub event: InnerEvent,
}

/// Events the bot reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InnerEvent {
    /// The bot was @mentioned.
    AppMention(MentionEvent),
    /// A plain channel message.
    Message(MessageEvent),
    /// Anything else.
    #[serde(other)]
    Other,
}

/// Payload of an `app_mention` event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MentionEvent {
    /// User who mentioned the bot.
    pub user: String,
    /// Message text, including the mention itself.
    #[serde(default)]
    pub text: String,
    /// Channel the mention was posted in.
    pub channel: String,
}

/// Payload of a `message` event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageEvent {
    /// Sender; absent for some subtypes such as `message_changed`.
    #[serde(default)]
    pub user: Option<String>,
    /// Message text.
    #[serde(default)]
    pub text: String,
    /// Channel the message was posted in.
    pub channel: String,
}

#[derive(Debug, Deserialize)]
struct ChallengeResponse {
    challenge: String,
}

/// Parses a raw events endpoint body.
///
/// # Errors
///
/// Returns [`SlackError::InvalidPayload`] when the body is not a JSON
/// envelope Slack would send.
pub fn parse_payload(body: &str) -> Result<EventsApiPayload, SlackError> {
    Ok(serde_json::from_str(body)?)
}

/// Extracts the challenge a verification handshake must echo.
///
/// # Errors
///
/// Returns [`SlackError::InvalidPayload`] when the body has no string
/// `challenge` field.
pub fn challenge_of(body: &str) -> Result<String, SlackError> {
    let response: ChallengeResponse = serde_json::from_str(body)?;
    Ok(response.challenge)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::{
        EventCallback, EventsApiPayload, InnerEvent, MentionEvent, MessageEvent, challenge_of,
        parse_payload,
    };
    use crate::slack::SlackError;

    #[rstest]
    fn challenge_is_echoed_verbatim() {
        let challenge = challenge_of(r#"{"challenge":"xyz123"}"#).expect("should parse");
        assert_eq!(challenge, "xyz123");
    }

    #[rstest]
    fn parses_url_verification() {
        let payload = parse_payload(
            &json!({ "type": "url_verification", "token": "tok", "challenge": "abc" }).to_string(),
        )
        .expect("should parse");

        assert_eq!(payload.token(), Some("tok"));
        assert!(
            matches!(payload, EventsApiPayload::UrlVerification(ref handshake) if handshake.challenge == "abc"),
            "expected UrlVerification, got {payload:?}"
        );
    }

    #[rstest]
    fn parses_app_mention_callback() {
        let payload = parse_payload(
            &json!({
                "type": "event_callback",
                "team_id": "T1",
                "event": {
                    "type": "app_mention",
                    "user": "U1",
                    "text": "<@B1> /pr please",
                    "channel": "C1",
                    "ts": "1.0"
                }
            })
            .to_string(),
        )
        .expect("should parse");

        assert_eq!(
            payload,
            EventsApiPayload::EventCallback(EventCallback {
                team_id: "T1".to_owned(),
                token: None,
                event: InnerEvent::AppMention(MentionEvent {
                    user: "U1".to_owned(),
                    text: "<@B1> /pr please".to_owned(),
                    channel: "C1".to_owned(),
                }),
            })
        );
    }

    #[rstest]
    fn parses_message_without_user() {
        let payload = parse_payload(
            &json!({
                "type": "event_callback",
                "team_id": "T1",
                "event": { "type": "message", "subtype": "message_changed", "channel": "C1" }
            })
            .to_string(),
        )
        .expect("should parse");

        let EventsApiPayload::EventCallback(callback) = payload else {
            panic!("expected callback, got {payload:?}");
        };
        assert_eq!(
            callback.event,
            InnerEvent::Message(MessageEvent {
                user: None,
                text: String::new(),
                channel: "C1".to_owned(),
            })
        );
    }

    #[rstest]
    fn unknown_inner_event_is_other() {
        let payload = parse_payload(
            &json!({
                "type": "event_callback",
                "team_id": "T1",
                "event": { "type": "reaction_added", "user": "U1" }
            })
            .to_string(),
        )
        .expect("should parse");

        assert!(
            matches!(payload, EventsApiPayload::EventCallback(ref callback) if callback.event == InnerEvent::Other),
            "expected Other, got {payload:?}"
        );
    }

    #[rstest]
    fn unknown_envelope_is_unsupported() {
        let payload = parse_payload(r#"{"type":"app_rate_limited","team_id":"T1"}"#)
            .expect("should parse");
        assert_eq!(payload, EventsApiPayload::Unsupported);
    }

    #[rstest]
    #[case::not_json("hello")]
    #[case::missing_type(r#"{"challenge":"abc"}"#)]
    #[case::callback_without_event(r#"{"type":"event_callback","team_id":"T1"}"#)]
    fn rejects_malformed_bodies(#[case] body: &str) {
        let result = parse_payload(body);
        assert!(
            matches!(result, Err(SlackError::InvalidPayload { .. })),
            "expected InvalidPayload, got {result:?}"
        );
    }
}
