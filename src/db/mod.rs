// Export store — SQLite snapshot of a built dataset.
//
// rusqlite is built with the "bundled" feature, so no system SQLite is
// needed. The file lives wherever FEDLENS_DB_PATH points (./fedlens.db by
// default). Nothing in the build reads it back; it is a hand-off for tools
// that prefer SQL to JSON.

pub mod queries;
pub mod schema;

use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create the export file if needed and bring its schema up to date.
pub fn initialize(db_path: &str) -> Result<Connection> {
    let path = Path::new(db_path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create export directory {}", parent.display()))?;
    }

    let conn = connect(path)?;
    schema::create_tables(&conn)?;
    Ok(conn)
}

/// Open an export written by an earlier `build --export`.
///
/// Refuses files that exist but were never initialized as a fedlens export.
pub fn open(db_path: &str) -> Result<Connection> {
    let path = Path::new(db_path);
    if !path.is_file() {
        anyhow::bail!(
            "No export at {db_path}. Run `fedlens build --db {db_path}` first."
        );
    }

    let conn = connect(path)?;
    if schema::current_version(&conn)?.is_none() {
        anyhow::bail!("{db_path} is not a fedlens export (no schema_version table)");
    }
    Ok(conn)
}

fn connect(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open export at {}", path.display()))?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    Ok(conn)
}
