//! Team records and the registry that resolves them.

use std::collections::BTreeMap;

use crate::github::RepositoryRef;
use crate::persistence::PersistenceError;

/// A Slack workspace configured for review reminders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Team {
    /// Slack team id (e.g. `T0123ABCD`).
    pub id: String,
    /// Repositories to scan, in reminder order.
    pub repositories: Vec<RepositoryRef>,
    /// GitHub login → name matched against the Slack directory.
    pub overrides: BTreeMap<String, String>,
    /// Free-text note kept by whoever provisioned the team.
    pub comment: Option<String>,
}

impl Team {
    /// Returns the display key a GitHub login is merged under.
    #[must_use]
    pub fn display_key<'a>(&'a self, login: &'a str) -> &'a str {
        self.overrides.get(login).map_or(login, String::as_str)
    }
}

/// Resolves team ids to their configuration.
#[cfg_attr(test, mockall::automock)]
pub trait TeamRegistry: Send + Sync {
    /// Look up the team with `team_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::TeamNotFound`] when no team is stored under
    /// `team_id`, or another [`PersistenceError`] when storage fails.
    fn team(&self, team_id: &str) -> Result<Team, PersistenceError>;
}
