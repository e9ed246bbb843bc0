// Database queries — write a dataset snapshot and read back what status needs.
//
// Every database interaction goes through this module. This keeps SQL
// contained in one place and gives the rest of the app clean Rust interfaces.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Transaction};

use crate::index::GlobalIndex;
use crate::pipeline::Dataset;

/// Index axis names, in the order they are written.
pub const INDEX_AXES: [&str; 4] = ["author", "topic", "speech", "date"];

// --- Build state ---

/// Get a build state value by key (e.g., "last_build_at").
pub fn get_build_state(conn: &Connection, key: &str) -> Result<Option<String>> {
    let mut stmt = conn.prepare("SELECT value FROM build_state WHERE key = ?1")?;
    let result = stmt.query_row(params![key], |row| row.get(0)).optional()?;
    Ok(result)
}

/// Set a build state value (upsert).
pub fn set_build_state(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO build_state (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
        params![key, value],
    )?;
    Ok(())
}

// --- Dataset snapshot ---

/// Replace the stored snapshot with `dataset` in a single transaction.
///
/// Rows are written in index order so a reader that does `ORDER BY rowid`
/// sees the same ordering as the in-memory structures.
pub fn write_dataset(conn: &mut Connection, dataset: &Dataset, average_across_runs: bool) -> Result<()> {
    let tx = conn.transaction()?;

    tx.execute_batch(
        "DELETE FROM speeches;
         DELETE FROM date_scores;
         DELETE FROM aligned_rates;
         DELETE FROM index_entries;
         DELETE FROM scoring_runs;",
    )?;

    {
        let mut stmt =
            tx.prepare("INSERT INTO speeches (id, author, date, text) VALUES (?1, ?2, ?3, ?4)")?;
        for speech in dataset.corpus.iter() {
            stmt.execute(params![
                speech.id,
                speech.author,
                speech.date.to_string(),
                speech.text
            ])?;
        }
    }

    {
        let mut stmt =
            tx.prepare("INSERT INTO date_scores (date, topic, score) VALUES (?1, ?2, ?3)")?;
        for (date, topics) in &dataset.date_scores {
            for (topic, score) in topics {
                stmt.execute(params![date.to_string(), topic, score])?;
            }
        }
    }

    {
        let mut stmt = tx.prepare(
            "INSERT INTO aligned_rates (date, rate, rate_change, observed_on)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for point in dataset.rates.points() {
            stmt.execute(params![
                point.date.to_string(),
                point.rate,
                point.rate_change,
                point.observed_on.to_string()
            ])?;
        }
    }

    {
        let mut stmt = tx.prepare(
            "INSERT INTO scoring_runs (position, name, row_count) VALUES (?1, ?2, ?3)",
        )?;
        for (position, run) in dataset.runs.iter().enumerate() {
            stmt.execute(params![position as i64, run.name, run.rows.len() as i64])?;
        }
    }

    write_index(&tx, &dataset.index)?;

    let mode = if average_across_runs { "average" } else { "last" };
    set_build_state(&tx, "aggregation", mode)?;
    set_build_state(&tx, "last_build_at", &chrono::Utc::now().to_rfc3339())?;

    tx.commit()?;
    Ok(())
}

fn write_index(tx: &Transaction<'_>, index: &GlobalIndex) -> Result<()> {
    let mut stmt = tx.prepare("INSERT INTO index_entries (axis, idx, value) VALUES (?1, ?2, ?3)")?;
    let axes: [(&str, Vec<String>); 4] = [
        (INDEX_AXES[0], index.authors.values().to_vec()),
        (INDEX_AXES[1], index.topics.values().to_vec()),
        (INDEX_AXES[2], index.speeches.values().to_vec()),
        (
            INDEX_AXES[3],
            index.dates.values().iter().map(|d| d.to_string()).collect(),
        ),
    ];
    for (axis, values) in axes {
        for (idx, value) in values.iter().enumerate() {
            stmt.execute(params![axis, idx as i64, value])?;
        }
    }
    Ok(())
}

/// Values of one index axis, in index order.
pub fn read_index_axis(conn: &Connection, axis: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT value FROM index_entries WHERE axis = ?1 ORDER BY idx")?;
    let rows = stmt.query_map(params![axis], |row| row.get(0))?;

    let mut values = Vec::new();
    for row in rows {
        values.push(row?);
    }
    Ok(values)
}

/// Row counts for each snapshot table, for status output.
pub fn table_counts(conn: &Connection) -> Result<Vec<(&'static str, i64)>> {
    let mut counts = Vec::new();
    for table in ["speeches", "date_scores", "aligned_rates", "index_entries", "scoring_runs"] {
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        counts.push((table, count));
    }
    Ok(counts)
}

/// Per-date score for one topic, ascending by date.
pub fn get_topic_series(conn: &Connection, topic: &str) -> Result<Vec<(String, f64)>> {
    let mut stmt =
        conn.prepare("SELECT date, score FROM date_scores WHERE topic = ?1 ORDER BY date")?;
    let rows = stmt.query_map(params![topic], |row| Ok((row.get(0)?, row.get(1)?)))?;

    let mut series = Vec::new();
    for row in rows {
        series.push(row?);
    }
    Ok(series)
}
