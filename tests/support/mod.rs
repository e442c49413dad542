//! Shared test utilities.

use prbell::persistence::migrate_database;
use prbell::telemetry::NoopTelemetrySink;
use prbell::{RepositoryRef, SqliteStore, Team};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub mod runtime;

/// Creates a temporary directory for database tests.
///
/// # Panics
///
/// Panics if the temporary directory cannot be created.
pub fn create_temp_dir() -> TempDir {
    TempDir::new().unwrap_or_else(|error| panic!("failed to create temporary directory: {error}"))
}

/// A migrated store living inside a temporary directory.
pub struct TempStore {
    /// Keeps the database file alive for the test's duration.
    pub temp_dir: TempDir,
    /// Path handed to the store.
    pub database_url: String,
    /// Store over the migrated database.
    pub store: SqliteStore,
}

/// Migrates a fresh database file and opens a store over it.
///
/// # Panics
///
/// Panics if the directory, migration, or store cannot be created.
pub fn migrated_store() -> TempStore {
    let temp_dir = create_temp_dir();
    let database_url = temp_dir
        .path()
        .join("prbell.sqlite")
        .to_string_lossy()
        .to_string();
    migrate_database(&database_url, &NoopTelemetrySink)
        .unwrap_or_else(|error| panic!("migration failed: {error}"));
    let store = SqliteStore::new(database_url.clone())
        .unwrap_or_else(|error| panic!("store creation failed: {error}"));
    TempStore {
        temp_dir,
        database_url,
        store,
    }
}

/// Builds a team scanning `repositories` given as `org/name`.
///
/// # Panics
///
/// Panics if a repository name is malformed.
pub fn team_with_repositories(team_id: &str, repositories: &[&str]) -> Team {
    Team {
        id: team_id.to_owned(),
        repositories: repositories
            .iter()
            .map(|full_name| {
                RepositoryRef::parse(full_name)
                    .unwrap_or_else(|error| panic!("invalid repository {full_name}: {error}"))
            })
            .collect(),
        ..Team::default()
    }
}

/// Mounts an open pull request list for `org/name` on a GitHub mock.
pub async fn mount_open_pull_requests(
    server: &MockServer,
    full_name: &str,
    pull_requests: serde_json::Value,
) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{full_name}/pulls")))
        .respond_with(ResponseTemplate::new(200).set_body_json(pull_requests))
        .mount(server)
        .await;
}

/// Mounts a single-page `users.list` response on a Slack mock.
pub async fn mount_slack_members(server: &MockServer, members: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/users.list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "members": members,
            "response_metadata": { "next_cursor": "" }
        })))
        .mount(server)
        .await;
}
