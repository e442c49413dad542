//! Slack Web API gateway.
//!
//! Wraps the three Web API methods the bot needs: `users.list` to build the
//! mention directory, `auth.test` to learn the bot's own user id, and
//! `chat.postMessage` to reply.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use http::StatusCode;
use reqwest::header::RETRY_AFTER;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::directory::ChatUser;
use super::error::SlackError;

/// Public Slack Web API base.
pub const DEFAULT_SLACK_API_URL: &str = "https://slack.com/api";

const USERS_PAGE_LIMIT: &str = "200";
const DEFAULT_RETRY_AFTER_SECS: u64 = 30;
const AUTH_ERROR_CODES: [&str; 4] = [
    "invalid_auth",
    "not_authed",
    "account_inactive",
    "token_revoked",
];

/// Bot OAuth token wrapper enforcing presence.
#[derive(Clone, PartialEq, Eq)]
pub struct SlackToken(String);

impl SlackToken {
    /// Validates that the token is non-empty and trims whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`SlackError::MissingToken`] when the supplied string is blank.
    pub fn new(token: impl AsRef<str>) -> Result<Self, SlackError> {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return Err(SlackError::MissingToken);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the token value.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for SlackToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("SlackToken(***)")
    }
}

/// Gateway to the Slack Web API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SlackGateway: Send + Sync {
    /// Fetch every workspace member as a [`ChatUser`].
    async fn directory(&self) -> Result<Vec<ChatUser>, SlackError>;

    /// Fetch the user id the bot token belongs to.
    async fn bot_user_id(&self) -> Result<String, SlackError>;

    /// Post `text` to `channel`.
    async fn post_message(&self, channel: &str, text: &str) -> Result<(), SlackError>;
}

/// reqwest-backed Slack gateway.
pub struct ReqwestSlackGateway {
    client: reqwest::Client,
    api_base: String,
    token: SlackToken,
}

impl ReqwestSlackGateway {
    /// Builds a gateway for `token` against `api_base`.
    ///
    /// # Errors
    ///
    /// Returns [`SlackError::InvalidUrl`] when `api_base` is not an absolute
    /// URL, or [`SlackError::Network`] when the HTTP client cannot be built.
    pub fn for_token(
        token: SlackToken,
        api_base: &str,
        timeout: Duration,
    ) -> Result<Self, SlackError> {
        let parsed =
            Url::parse(api_base).map_err(|error| SlackError::InvalidUrl(error.to_string()))?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base: parsed.as_str().trim_end_matches('/').to_owned(),
            token,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{method}", self.api_base)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, SlackError> {
        let response = request.bearer_auth(self.token.value()).send().await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(SlackError::RateLimited {
                method: method.to_owned(),
                retry_after_secs,
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SlackError::Api {
                method: method.to_owned(),
                message: format!("{status}: {body}"),
            });
        }

        let unexpected = |message: String| SlackError::UnexpectedResponse {
            method: method.to_owned(),
            message,
        };
        let value: serde_json::Value = response.json().await.map_err(|error| {
            if error.is_decode() {
                unexpected(error.to_string())
            } else {
                SlackError::from(error)
            }
        })?;
        if value.get("ok").and_then(serde_json::Value::as_bool) != Some(true) {
            let code = value
                .get("error")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown_error")
                .to_owned();
            return Err(if AUTH_ERROR_CODES.contains(&code.as_str()) {
                SlackError::Authentication { message: code }
            } else {
                SlackError::Api {
                    method: method.to_owned(),
                    message: code,
                }
            });
        }

        serde_json::from_value(value).map_err(|error| unexpected(error.to_string()))
    }
}

#[async_trait]
impl SlackGateway for ReqwestSlackGateway {
    async fn directory(&self) -> Result<Vec<ChatUser>, SlackError> {
        let mut users = Vec::new();
        let mut cursor = String::new();

        loop {
            let mut query = vec![("limit", USERS_PAGE_LIMIT)];
            if !cursor.is_empty() {
                query.push(("cursor", cursor.as_str()));
            }
            let request = self.client.get(self.method_url("users.list")).query(&query);
            let page: ApiUsersPage = self.call("users.list", request).await?;

            users.extend(page.members.into_iter().map(ApiMember::into));

            let next_cursor = page
                .response_metadata
                .and_then(|metadata| metadata.next_cursor)
                .unwrap_or_default();
            if next_cursor.is_empty() {
                break;
            }
            cursor = next_cursor;
        }

        debug!(users = users.len(), "fetched Slack directory");
        Ok(users)
    }

    async fn bot_user_id(&self) -> Result<String, SlackError> {
        let request = self.client.post(self.method_url("auth.test"));
        let identity: ApiAuthTest = self.call("auth.test", request).await?;
        Ok(identity.user_id)
    }

    async fn post_message(&self, channel: &str, text: &str) -> Result<(), SlackError> {
        let request = self
            .client
            .post(self.method_url("chat.postMessage"))
            .json(&serde_json::json!({ "channel": channel, "text": text }));
        let _posted: serde_json::Value = self.call("chat.postMessage", request).await?;
        debug!(channel, "posted Slack message");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ApiUsersPage {
    #[serde(default)]
    members: Vec<ApiMember>,
    response_metadata: Option<ApiResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMetadata {
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiMember {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    real_name: String,
    #[serde(default)]
    profile: ApiProfile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiProfile {
    real_name: String,
    real_name_normalized: String,
    display_name: String,
    display_name_normalized: String,
}

#[derive(Debug, Deserialize)]
struct ApiAuthTest {
    user_id: String,
}

impl From<ApiMember> for ChatUser {
    fn from(value: ApiMember) -> Self {
        Self::new(
            value.id,
            [
                value.name,
                value.real_name,
                value.profile.real_name,
                value.profile.real_name_normalized,
                value.profile.display_name,
                value.profile.display_name_normalized,
            ],
        )
    }
}
