//! Application configuration loaded from CLI, environment, and files.
//!
//! This module provides a unified configuration struct that merges values
//! from command-line arguments, environment variables, and configuration
//! files using ortho-config's layered approach.
//!
//! # Precedence
//!
//! Configuration values are loaded with the following precedence (lowest to
//! highest):
//!
//! 1. **Defaults** – Built-in application defaults
//! 2. **Configuration file** – `.prbell.toml` in current directory, home
//!    directory, or XDG config directory
//! 3. **Environment variables** – `PRBELL_BIND_ADDRESS`, `PRBELL_GITHUB_TOKEN`,
//!    and so on
//! 4. **Command-line arguments** – `--bind-address`, `--github-token`, ...
//!
//! API tokens missing from every layer are read from the `configs` table
//! (`GITHUB_AUTH_TOKEN` and `SLACK_OAUTH_ACCESS_TOKEN`).
//!
//! # Configuration File
//!
//! ```toml
//! bind_address = "0.0.0.0:8080"
//! database_url = "prbell.sqlite"
//! slack_verification_token = "legacy-token"
//! bot_user_id = "U0BOT"
//! json_logs = true
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dispatch::{DEFAULT_COMMAND_PATTERN, DEFAULT_KEYWORD_PATTERN, DispatchConfig};
use crate::github::{DEFAULT_GITHUB_API_URL, PersonalAccessToken};
use crate::persistence::{PersistenceError, SqliteStore};
use crate::server::RoutePaths;
use crate::slack::{DEFAULT_SLACK_API_URL, SlackToken};

/// Config record holding the GitHub token.
pub const GITHUB_TOKEN_RECORD: &str = "GITHUB_AUTH_TOKEN";

/// Config record holding the Slack bot token.
pub const SLACK_TOKEN_RECORD: &str = "SLACK_OAUTH_ACCESS_TOKEN";

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";
const DEFAULT_COMMAND_PATH: &str = "/github/pull_requests";
const DEFAULT_EVENTS_PATH: &str = "/slack/subscribe";
const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Errors raised while turning configuration into runtime values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Layered configuration could not be loaded.
    #[error("failed to load configuration: {message}")]
    Load {
        /// Detail from ortho-config.
        message: String,
    },

    /// The bind address is not a socket address.
    #[error("bind address {value} is invalid: {message}")]
    InvalidBindAddress {
        /// Configured value.
        value: String,
        /// Parser detail.
        message: String,
    },

    /// A route path does not start with `/`.
    #[error("route path {path} must start with '/'")]
    InvalidRoutePath {
        /// Configured value.
        path: String,
    },

    /// A matching pattern failed to compile.
    #[error("{field} is not a valid regular expression: {message}")]
    InvalidPattern {
        /// Configuration field holding the pattern.
        field: &'static str,
        /// Compiler detail.
        message: String,
    },

    /// A required secret is absent from every source.
    #[error("{name} is not configured")]
    MissingSecret {
        /// Config record name of the secret.
        name: &'static str,
    },

    /// Reading a secret from the store failed.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Service configuration supporting CLI, environment, and file sources.
///
/// # Example
///
/// ```no_run
/// use ortho_config::OrthoConfig;
/// use prbell::PrbellConfig;
///
/// let config = PrbellConfig::load().expect("failed to load configuration");
/// let address = config.bind_address().expect("bind address should parse");
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "PRBELL",
    discovery(
        dotfile_name = ".prbell.toml",
        config_file_name = "prbell.toml",
        app_name = "prbell"
    )
)]
pub struct PrbellConfig {
    /// Socket address the HTTP server listens on.
    #[ortho_config()]
    pub bind_address: String,

    /// `SQLite` database path holding teams and config records.
    #[ortho_config()]
    pub database_url: Option<String>,

    /// Runs database migrations and exits.
    ///
    /// Without this flag migrations still run before the server starts.
    #[ortho_config()]
    pub migrate_db: bool,

    /// GitHub token; falls back to the `GITHUB_AUTH_TOKEN` record.
    #[ortho_config()]
    pub github_token: Option<String>,

    /// GitHub REST API base URL.
    #[ortho_config()]
    pub github_api_url: String,

    /// Slack bot token; falls back to the `SLACK_OAUTH_ACCESS_TOKEN` record.
    #[ortho_config()]
    pub slack_token: Option<String>,

    /// Slack Web API base URL.
    #[ortho_config()]
    pub slack_api_url: String,

    /// Legacy verification token Slack payloads must carry, when set.
    #[ortho_config()]
    pub slack_verification_token: Option<String>,

    /// The bot's own Slack user id; looked up with `auth.test` when unset.
    #[ortho_config()]
    pub bot_user_id: Option<String>,

    /// Path of the slash command endpoint.
    #[ortho_config()]
    pub command_path: String,

    /// Path of the Events API endpoint.
    #[ortho_config()]
    pub events_path: String,

    /// Mention text that triggers a digest.
    #[ortho_config()]
    pub command_pattern: String,

    /// Keywords echoed back from channel messages.
    #[ortho_config()]
    pub keyword_pattern: String,

    /// Timeout applied to every outbound GitHub and Slack call.
    #[ortho_config()]
    pub http_timeout_seconds: u64,

    /// Log filter used when `RUST_LOG` is unset.
    #[ortho_config()]
    pub log_level: String,

    /// Emits logs as JSON lines instead of human-readable text.
    #[ortho_config()]
    pub json_logs: bool,
}

impl Default for PrbellConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_owned(),
            database_url: None,
            migrate_db: false,
            github_token: None,
            github_api_url: DEFAULT_GITHUB_API_URL.to_owned(),
            slack_token: None,
            slack_api_url: DEFAULT_SLACK_API_URL.to_owned(),
            slack_verification_token: None,
            bot_user_id: None,
            command_path: DEFAULT_COMMAND_PATH.to_owned(),
            events_path: DEFAULT_EVENTS_PATH.to_owned(),
            command_pattern: DEFAULT_COMMAND_PATTERN.to_owned(),
            keyword_pattern: DEFAULT_KEYWORD_PATTERN.to_owned(),
            http_timeout_seconds: DEFAULT_HTTP_TIMEOUT_SECONDS,
            log_level: DEFAULT_LOG_LEVEL.to_owned(),
            json_logs: false,
        }
    }
}

impl PrbellConfig {
    /// Parses the configured bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBindAddress`] when the value is not a
    /// socket address.
    pub fn bind_address(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_address
            .trim()
            .parse()
            .map_err(|error: std::net::AddrParseError| ConfigError::InvalidBindAddress {
                value: self.bind_address.clone(),
                message: error.to_string(),
            })
    }

    /// Returns the database URL or an error if missing.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::MissingDatabaseUrl`] when no URL is
    /// configured.
    pub fn require_database_url(&self) -> Result<&str, PersistenceError> {
        self.database_url
            .as_deref()
            .ok_or(PersistenceError::MissingDatabaseUrl)
    }

    /// Timeout for outbound API calls.
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }

    /// Returns the command and events paths after checking their shape.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRoutePath`] for a path without a leading
    /// slash.
    pub fn route_paths(&self) -> Result<RoutePaths, ConfigError> {
        for path in [&self.command_path, &self.events_path] {
            if !path.starts_with('/') {
                return Err(ConfigError::InvalidRoutePath { path: path.clone() });
            }
        }
        Ok(RoutePaths {
            command: self.command_path.clone(),
            events: self.events_path.clone(),
        })
    }

    /// Compiles the dispatcher's patterns and identity settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPattern`] naming the pattern that failed
    /// to compile.
    pub fn dispatch_config(&self) -> Result<DispatchConfig, ConfigError> {
        let command = regex::Regex::new(&self.command_pattern).map_err(|error| {
            ConfigError::InvalidPattern {
                field: "command_pattern",
                message: error.to_string(),
            }
        })?;
        let keywords = regex::Regex::new(&self.keyword_pattern).map_err(|error| {
            ConfigError::InvalidPattern {
                field: "keyword_pattern",
                message: error.to_string(),
            }
        })?;

        Ok(DispatchConfig {
            command_pattern: command,
            keyword_pattern: keywords,
            bot_user_id: non_blank(self.bot_user_id.as_deref()),
            verification_token: non_blank(self.slack_verification_token.as_deref()),
        })
    }

    /// Resolves the GitHub token from configuration or the config store.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSecret`] when neither source has a
    /// non-blank token, or [`ConfigError::Persistence`] when the store fails.
    pub fn resolve_github_token(
        &self,
        store: &SqliteStore,
    ) -> Result<PersonalAccessToken, ConfigError> {
        let value = resolve_secret(self.github_token.as_deref(), store, GITHUB_TOKEN_RECORD)?;
        PersonalAccessToken::new(value).map_err(|_| ConfigError::MissingSecret {
            name: GITHUB_TOKEN_RECORD,
        })
    }

    /// Resolves the Slack bot token from configuration or the config store.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSecret`] when neither source has a
    /// non-blank token, or [`ConfigError::Persistence`] when the store fails.
    pub fn resolve_slack_token(&self, store: &SqliteStore) -> Result<SlackToken, ConfigError> {
        let value = resolve_secret(self.slack_token.as_deref(), store, SLACK_TOKEN_RECORD)?;
        SlackToken::new(value).map_err(|_| ConfigError::MissingSecret {
            name: SLACK_TOKEN_RECORD,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(ToOwned::to_owned)
}

fn resolve_secret(
    configured: Option<&str>,
    store: &SqliteStore,
    record: &'static str,
) -> Result<String, ConfigError> {
    if let Some(value) = non_blank(configured) {
        return Ok(value);
    }
    match store.config_value(record) {
        Ok(value) => Ok(value),
        Err(PersistenceError::ConfigNotFound { .. }) => {
            Err(ConfigError::MissingSecret { name: record })
        }
        Err(other) => Err(other.into()),
    }
}
