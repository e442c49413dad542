//! GitHub pull request listing and review request collection.
//!
//! This module wraps Octocrab to list the open pull requests of a repository
//! and groups their URLs by requested reviewer. Errors are mapped into
//! user-friendly variants so that callers can surface precise failures
//! without exposing Octocrab internals.

pub mod collector;
pub mod error;
pub mod gateway;
pub mod models;
pub mod repository;

pub use collector::{ReviewRequestCollector, ReviewRequestMap, group_by_reviewer};
pub use error::IntakeError;
pub use gateway::{DEFAULT_GITHUB_API_URL, OctocrabGateway, PullRequestGateway};
pub use models::OpenPullRequest;
pub use repository::{PersonalAccessToken, RepositoryRef};

#[cfg(test)]
pub use gateway::MockPullRequestGateway;
