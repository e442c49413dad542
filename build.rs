//! Rebuilds the crate whenever a migration file changes.
//!
//! `embed_migrations!` reads the SQL at compile time, which Cargo does not
//! track on its own.

fn main() {
    println!("cargo:rerun-if-changed=migrations");
}
