//! prbell: a Slack bot that reminds a team of pending pull request reviews.
//!
//! For each configured Slack team the bot lists the open pull requests of
//! the team's GitHub repositories, groups their URLs by requested reviewer,
//! resolves every reviewer to a Slack mention and renders a plain-text
//! digest. The digest is served from a slash command endpoint and posted in
//! reply to `@bot pr` mentions delivered through the Slack Events API.

pub mod config;
pub mod dispatch;
pub mod github;
pub mod persistence;
pub mod reminder;
pub mod server;
pub mod slack;
pub mod team;
pub mod telemetry;

pub use config::{ConfigError, PrbellConfig};
pub use dispatch::{DispatchConfig, DispatchOutcome, EventDispatcher};
pub use github::{IntakeError, OctocrabGateway, PersonalAccessToken, RepositoryRef};
pub use persistence::{PersistenceError, SqliteStore};
pub use reminder::{ReminderError, ReminderService};
pub use server::{AppState, RoutePaths};
pub use slack::{ReqwestSlackGateway, SlackError, SlackToken};
pub use team::{Team, TeamRegistry};
