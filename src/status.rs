// System status display — configured inputs and the last export.

use std::path::Path;

use anyhow::Result;

use crate::cache::SourceFingerprint;
use crate::config::Config;

/// Display system status to the terminal.
pub fn show(config: &Config) -> Result<()> {
    println!("Speeches: {}", describe_input(&config.speech_dir));
    println!("Scoring runs: {}", describe_input(&config.score_dir));
    println!("Rates: {}", describe_input(&config.rates_file));
    println!("Embeddings: {}", describe_input(&config.embeddings_file));
    println!("Scorer key: {}", config.scorer_key);
    println!("Cutoff: {}", config.cutoff);

    show_export(&config.db_path)
}

#[cfg(feature = "sqlite")]
fn show_export(db_path: &str) -> Result<()> {
    if !Path::new(db_path).exists() {
        println!("Export: not built");
        println!("  Run `fedlens build --db {db_path}` to create it");
        return Ok(());
    }

    let file_size = std::fs::metadata(db_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("Export: {} ({})", db_path, file_size);

    let conn = crate::db::open(db_path)?;
    if let Some(version) = crate::db::schema::current_version(&conn)? {
        println!("  schema version: {version}");
    }
    for (table, count) in crate::db::queries::table_counts(&conn)? {
        println!("  {table}: {count} rows");
    }

    match crate::db::queries::get_build_state(&conn, "last_build_at")? {
        Some(at) => {
            let mode = crate::db::queries::get_build_state(&conn, "aggregation")?
                .unwrap_or_else(|| "unknown".to_string());
            println!("Last build: {at} (aggregation: {mode})");
        }
        None => println!("Last build: never"),
    }

    Ok(())
}

#[cfg(not(feature = "sqlite"))]
fn show_export(_db_path: &str) -> Result<()> {
    println!("Export: disabled (built without the `sqlite` feature)");
    Ok(())
}

fn describe_input(path: &Path) -> String {
    match SourceFingerprint::of(path) {
        Ok(fp) if path.is_dir() => format!("{} ({} JSON files)", path.display(), fp.file_count()),
        Ok(_) => format!("{} (present)", path.display()),
        Err(_) => format!("{} (missing)", path.display()),
    }
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
