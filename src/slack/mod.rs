//! Slack Web API access, inbound event payloads and mention resolution.

pub mod directory;
pub mod error;
pub mod events;
pub mod gateway;

pub use directory::{ChatUser, MentionResolution, resolve_mention};
pub use error::SlackError;
pub use events::{
    EventCallback, EventsApiPayload, InnerEvent, MentionEvent, MessageEvent, UrlVerification,
    challenge_of, parse_payload,
};
pub use gateway::{DEFAULT_SLACK_API_URL, ReqwestSlackGateway, SlackGateway, SlackToken};

#[cfg(test)]
pub use gateway::MockSlackGateway;
