//! `SQLite` persistence and database migrations.
//!
//! Team configuration and named config records are stored in a `SQLite`
//! database whose schema is managed with Diesel migrations, so the database
//! can be created and upgraded consistently across deployments.

mod connection;
mod error;
mod migrator;
mod store;

pub use error::PersistenceError;
pub use migrator::{
    CURRENT_SCHEMA_VERSION, INITIAL_SCHEMA_VERSION, SchemaVersion, migrate_database,
};
pub use store::{ConfigRecord, SqliteStore};
