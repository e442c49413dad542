//! `SQLite` connection setup shared by the migrator and the store.

use diesel::Connection;
use diesel::RunQueryDsl;
use diesel::sql_query;
use diesel::sqlite::SqliteConnection;

use super::PersistenceError;

/// Opens `database_url` with foreign key enforcement enabled.
///
/// # Errors
///
/// Returns [`PersistenceError::BlankDatabaseUrl`] for a blank URL and
/// [`PersistenceError::ConnectionFailed`] or
/// [`PersistenceError::ForeignKeysEnableFailed`] when `SQLite` refuses.
pub(crate) fn open(database_url: &str) -> Result<SqliteConnection, PersistenceError> {
    let trimmed = database_url.trim();
    if trimmed.is_empty() {
        return Err(PersistenceError::BlankDatabaseUrl);
    }

    let mut connection =
        SqliteConnection::establish(trimmed).map_err(|error| PersistenceError::ConnectionFailed {
            message: error.to_string(),
        })?;

    sql_query("PRAGMA foreign_keys = ON;")
        .execute(&mut connection)
        .map(drop)
        .map_err(|error| PersistenceError::ForeignKeysEnableFailed {
            message: error.to_string(),
        })?;

    Ok(connection)
}
