//! Database location handling for the binary.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

pub const DEFAULT_DB_URL: &str = "sqlite://quickcal.sqlite3";

const MEMORY_URL: &str = "sqlite::memory:";

/// Turn a `--db` value into a `sqlx` connection URL.
///
/// Bare and relative paths become absolute `sqlite://` URLs; file URLs
/// without a query get `mode=rwc` so a missing database is created.
#[must_use]
pub fn normalize_db_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if matches!(trimmed, ":memory:" | "memory" | MEMORY_URL) {
        return MEMORY_URL.to_owned();
    }

    let (location, query) = match trimmed.split_once('?') {
        Some((location, query)) => (location, Some(query)),
        None => (trimmed, None),
    };
    // `sqlite:file:...` URLs are passed through for shared in-memory databases.
    if location.starts_with("sqlite:file:") {
        return trimmed.to_owned();
    }

    let path_str = location
        .strip_prefix("sqlite://")
        .or_else(|| location.strip_prefix("sqlite:"))
        .unwrap_or(location);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };

    let query = query.unwrap_or("mode=rwc");
    format!("sqlite://{}?{query}", absolute.display())
}

/// Create parent directories for a file-backed `sqlite://` URL.
///
/// # Errors
///
/// Fails when the URL has no path or the directories cannot be created.
pub fn prepare_sqlite_file(db_url: &str) -> Result<()> {
    let Some(rest) = db_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = rest.split('?').next().unwrap_or(rest);
    if path.is_empty() {
        bail!("invalid --db value: {db_url}");
    }
    if let Some(parent) = Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
