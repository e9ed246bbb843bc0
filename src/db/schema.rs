// Export schema — snapshot tables.
//
// Every table is created in version 1, recorded in `schema_version`.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create all tables if they don't exist yet. Idempotent.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- One row per speech in the deduplicated, cutoff-filtered corpus
        CREATE TABLE IF NOT EXISTS speeches (
            id TEXT PRIMARY KEY,
            author TEXT NOT NULL,              -- source collection name
            date TEXT NOT NULL,                -- YYYY-MM-DD
            text TEXT NOT NULL
        );

        -- Per-date aggregate topic scores (long format)
        CREATE TABLE IF NOT EXISTS date_scores (
            date TEXT NOT NULL,
            topic TEXT NOT NULL,
            score REAL NOT NULL,
            PRIMARY KEY (date, topic)
        );

        -- Rate series aligned to speech dates
        CREATE TABLE IF NOT EXISTS aligned_rates (
            date TEXT PRIMARY KEY,
            rate REAL NOT NULL,
            rate_change REAL,                  -- NULL before the second observation
            observed_on TEXT NOT NULL          -- native observation carried forward
        );

        -- Global index axes: 'author', 'topic', 'speech', 'date'
        CREATE TABLE IF NOT EXISTS index_entries (
            axis TEXT NOT NULL,
            idx INTEGER NOT NULL,
            value TEXT NOT NULL,
            PRIMARY KEY (axis, idx)
        );

        -- Scoring runs that fed the last build, in read order
        CREATE TABLE IF NOT EXISTS scoring_runs (
            position INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            row_count INTEGER NOT NULL
        );

        -- Build metadata (last build time, averaging mode, scorer key)
        CREATE TABLE IF NOT EXISTS build_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_speeches_author ON speeches(author);
        CREATE INDEX IF NOT EXISTS idx_speeches_date ON speeches(date);
        ",
    )
    .context("Failed to create database tables")?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [1],
    )?;

    Ok(())
}

/// Highest applied schema version, or `None` for a file that was never
/// initialized as an export.
pub fn current_version(conn: &Connection) -> Result<Option<i64>> {
    let has_table: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
        [],
        |row| row.get(0),
    )?;
    if !has_table {
        return Ok(None);
    }
    let version: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(version)
}

/// Count the number of tables in the database.
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}
