//! Database schema migrations for cardbox.
//!
//! Migrations are versioned and applied automatically when opening the
//! database. The `schema_version` table tracks the current version.

use rusqlite::{Connection, Result as SqliteResult};

/// Apply all pending migrations.
///
/// # Errors
/// Returns an error if a migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

/// Create the schema_version table if it doesn't exist.
fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version, or 0 for a fresh database.
fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or(0)
}

/// Set the schema version in the database.
fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Migration v1: Initial schema (baseline).
///
/// The base tables are created by `DeckDb::migrate()` directly, so this
/// only records the version.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    set_schema_version(conn, 1)?;
    Ok(())
}

/// Migration v2: Track last-review time on cards.
///
/// Adds:
/// - `cards.reviewed_at`: timestamp of the most recent review
/// - an index covering the per-card review history query
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "ALTER TABLE cards ADD COLUMN reviewed_at TEXT;
         CREATE INDEX IF NOT EXISTS idx_logs_card_reviewed
             ON review_logs(card_id, reviewed_at);",
    )?;

    tx.execute("DELETE FROM schema_version", [])?;
    tx.execute("INSERT INTO schema_version (version) VALUES (?1)", [2])?;

    tx.commit()?;
    Ok(())
}
