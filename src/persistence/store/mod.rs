//! Team registry and config store backed by `SQLite`.
//!
//! Teams are split across three tables: `teams` holds the record itself,
//! `team_repositories` keeps the ordered repository list and
//! `team_overrides` maps GitHub logins to display names. Named config
//! records (API tokens and similar secrets) live in `configs`.

use std::collections::BTreeMap;

use diesel::Connection;
use diesel::OptionalExtension;
use diesel::QueryableByName;
use diesel::RunQueryDsl;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Nullable, Text};
use diesel::sqlite::SqliteConnection;
use tracing::debug;

use crate::github::RepositoryRef;
use crate::team::{Team, TeamRegistry};

use super::PersistenceError;
use super::connection::open;

const TEAMS_TABLE: &str = "teams";

#[derive(Debug, QueryableByName)]
struct RepositoryRow {
    #[diesel(sql_type = Text)]
    organization: String,
    #[diesel(sql_type = Text)]
    name: String,
}

/// Team rows as stored, before repositories are validated.
#[derive(Debug)]
struct StoredTeam {
    comment: Option<String>,
    repositories: Vec<RepositoryRow>,
    overrides: BTreeMap<String, String>,
}

/// A named configuration record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRecord {
    /// Record name (e.g. `GITHUB_AUTH_TOKEN`).
    pub name: String,
    /// Stored value.
    pub value: String,
    /// Free-text note for administrators.
    pub comment: Option<String>,
}

/// SQLite-backed team registry and config store.
///
/// A connection is opened per call, so the store can be shared freely across
/// request tasks.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    database_url: String,
}

impl SqliteStore {
    /// Create a store targeting `database_url`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::BlankDatabaseUrl`] when the URL is blank.
    pub fn new(database_url: impl Into<String>) -> Result<Self, PersistenceError> {
        let database_url_string = database_url.into();
        if database_url_string.trim().is_empty() {
            return Err(PersistenceError::BlankDatabaseUrl);
        }
        Ok(Self {
            database_url: database_url_string,
        })
    }

    /// Inserts or replaces `team`, including its repositories and overrides.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the schema is missing or the write
    /// fails; nothing is written in that case.
    pub fn upsert_team(&self, team: &Team) -> Result<(), PersistenceError> {
        let mut connection = open(&self.database_url)?;

        let outcome = connection.transaction::<_, diesel::result::Error, _>(|connection| {
            sql_query(
                "INSERT INTO teams (team_id, comment) VALUES (?, ?) \
                 ON CONFLICT(team_id) DO UPDATE SET \
                   comment = excluded.comment, \
                   updated_at = CURRENT_TIMESTAMP;",
            )
            .bind::<Text, _>(team.id.as_str())
            .bind::<Nullable<Text>, _>(team.comment.as_deref())
            .execute(connection)?;

            sql_query("DELETE FROM team_repositories WHERE team_id = ?;")
                .bind::<Text, _>(team.id.as_str())
                .execute(connection)?;
            sql_query("DELETE FROM team_overrides WHERE team_id = ?;")
                .bind::<Text, _>(team.id.as_str())
                .execute(connection)?;

            for (position, repository) in team.repositories.iter().enumerate() {
                sql_query(
                    "INSERT INTO team_repositories (team_id, position, organization, name) \
                     VALUES (?, ?, ?, ?);",
                )
                .bind::<Text, _>(team.id.as_str())
                .bind::<BigInt, _>(i64::try_from(position).unwrap_or(i64::MAX))
                .bind::<Text, _>(repository.organization())
                .bind::<Text, _>(repository.name())
                .execute(connection)?;
            }

            for (login, display_name) in &team.overrides {
                sql_query(
                    "INSERT INTO team_overrides (team_id, github_login, display_name) \
                     VALUES (?, ?, ?);",
                )
                .bind::<Text, _>(team.id.as_str())
                .bind::<Text, _>(login.as_str())
                .bind::<Text, _>(display_name.as_str())
                .execute(connection)?;
            }

            Ok(())
        });

        outcome.map_err(|error| Self::map_write_error(&mut connection, &error))?;
        debug!(
            team = %team.id,
            repositories = team.repositories.len(),
            overrides = team.overrides.len(),
            "stored team"
        );
        Ok(())
    }

    /// Fetches the config record stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::ConfigNotFound`] when no record exists, or
    /// another [`PersistenceError`] when the query fails.
    pub fn config(&self, name: &str) -> Result<ConfigRecord, PersistenceError> {
        #[derive(Debug, QueryableByName)]
        struct Row {
            #[diesel(sql_type = Text)]
            value: String,
            #[diesel(sql_type = Nullable<Text>)]
            comment: Option<String>,
        }

        let mut connection = open(&self.database_url)?;

        let row: Option<Row> =
            sql_query("SELECT value, comment FROM configs WHERE name = ? LIMIT 1;")
                .bind::<Text, _>(name)
                .get_result(&mut connection)
                .optional()
                .map_err(|error| Self::map_query_error(&mut connection, &error))?;

        row.map(|found| ConfigRecord {
            name: name.to_owned(),
            value: found.value,
            comment: found.comment,
        })
        .ok_or_else(|| PersistenceError::ConfigNotFound {
            name: name.to_owned(),
        })
    }

    /// Returns the value stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::ConfigNotFound`] when no record exists, or
    /// another [`PersistenceError`] when the query fails.
    pub fn config_value(&self, name: &str) -> Result<String, PersistenceError> {
        self.config(name).map(|record| record.value)
    }

    /// Inserts or replaces a config record.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the schema is missing or the write
    /// fails.
    pub fn set_config(&self, record: &ConfigRecord) -> Result<(), PersistenceError> {
        let mut connection = open(&self.database_url)?;

        sql_query(
            "INSERT INTO configs (name, value, comment) VALUES (?, ?, ?) \
             ON CONFLICT(name) DO UPDATE SET \
               value = excluded.value, \
               comment = excluded.comment, \
               updated_at = CURRENT_TIMESTAMP;",
        )
        .bind::<Text, _>(record.name.as_str())
        .bind::<Text, _>(record.value.as_str())
        .bind::<Nullable<Text>, _>(record.comment.as_deref())
        .execute(&mut connection)
        .map(drop)
        .map_err(|error| Self::map_write_error(&mut connection, &error))
    }

    fn load_team(
        connection: &mut SqliteConnection,
        team_id: &str,
    ) -> Result<Option<StoredTeam>, diesel::result::Error> {
        #[derive(Debug, QueryableByName)]
        struct TeamRow {
            #[diesel(sql_type = Nullable<Text>)]
            comment: Option<String>,
        }

        #[derive(Debug, QueryableByName)]
        struct OverrideRow {
            #[diesel(sql_type = Text)]
            github_login: String,
            #[diesel(sql_type = Text)]
            display_name: String,
        }

        let Some(team_row) = sql_query("SELECT comment FROM teams WHERE team_id = ? LIMIT 1;")
            .bind::<Text, _>(team_id)
            .get_result::<TeamRow>(connection)
            .optional()?
        else {
            return Ok(None);
        };

        let repositories: Vec<RepositoryRow> = sql_query(
            "SELECT organization, name FROM team_repositories \
             WHERE team_id = ? ORDER BY position;",
        )
        .bind::<Text, _>(team_id)
        .load(connection)?;

        let override_rows: Vec<OverrideRow> = sql_query(
            "SELECT github_login, display_name FROM team_overrides WHERE team_id = ?;",
        )
        .bind::<Text, _>(team_id)
        .load(connection)?;

        Ok(Some(StoredTeam {
            comment: team_row.comment,
            repositories,
            overrides: override_rows
                .into_iter()
                .map(|row| (row.github_login, row.display_name))
                .collect(),
        }))
    }

    fn teams_table_exists(
        connection: &mut SqliteConnection,
    ) -> Result<bool, diesel::result::Error> {
        #[derive(Debug, QueryableByName)]
        struct Row {
            #[diesel(sql_type = BigInt)]
            count: i64,
        }

        let row: Row = sql_query(
            "SELECT COUNT(*) AS count FROM sqlite_master WHERE type = 'table' AND name = ?;",
        )
        .bind::<Text, _>(TEAMS_TABLE)
        .get_result(connection)?;

        Ok(row.count > 0)
    }

    fn map_error_with_schema_check<F>(
        connection: &mut SqliteConnection,
        error: &diesel::result::Error,
        create_error: F,
    ) -> PersistenceError
    where
        F: Fn(String) -> PersistenceError,
    {
        match Self::teams_table_exists(connection) {
            Ok(false) => PersistenceError::SchemaNotInitialised,
            Ok(true) => create_error(error.to_string()),
            Err(check_error) => create_error(format!(
                "schema presence check failed: {check_error}; original error: {error}"
            )),
        }
    }

    fn map_query_error(
        connection: &mut SqliteConnection,
        error: &diesel::result::Error,
    ) -> PersistenceError {
        Self::map_error_with_schema_check(connection, error, |message| {
            PersistenceError::QueryFailed { message }
        })
    }

    fn map_write_error(
        connection: &mut SqliteConnection,
        error: &diesel::result::Error,
    ) -> PersistenceError {
        Self::map_error_with_schema_check(connection, error, |message| {
            PersistenceError::WriteFailed { message }
        })
    }
}

impl TeamRegistry for SqliteStore {
    fn team(&self, team_id: &str) -> Result<Team, PersistenceError> {
        let mut connection = open(&self.database_url)?;

        let stored = Self::load_team(&mut connection, team_id)
            .map_err(|error| Self::map_query_error(&mut connection, &error))?
            .ok_or_else(|| PersistenceError::TeamNotFound {
                team_id: team_id.to_owned(),
            })?;

        let repositories = stored
            .repositories
            .iter()
            .map(|row| RepositoryRef::new(&row.organization, &row.name))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|error| PersistenceError::QueryFailed {
                message: format!("team {team_id} has an invalid repository: {error}"),
            })?;

        Ok(Team {
            id: team_id.to_owned(),
            repositories,
            overrides: stored.overrides,
            comment: stored.comment,
        })
    }
}
