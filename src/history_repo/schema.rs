// Table schema for one component's history, with in-place widening for older files.
// Version 1: timestamp + category scores. Version 2: + nullable timing columns.

use crate::models::MetricField;
use sqlx::{Row, SqlitePool};

pub(super) const TABLE: &str = "lighthouse_report";
pub(super) const SCHEMA_VERSION: i64 = 2;

/// Column definitions in fixed schema order (after `id`).
fn column_definitions() -> Vec<(&'static str, &'static str)> {
    let mut cols = vec![("timestamp", "TEXT NOT NULL")];
    for field in MetricField::ALL {
        // Timing columns are nullable: rows sampled with a category-only set leave them empty.
        let ty = if field.is_timing() {
            "REAL"
        } else {
            "REAL NOT NULL"
        };
        cols.push((field.column(), ty));
    }
    cols
}

/// Column names in schema order, excluding `id`.
pub(super) fn columns() -> Vec<&'static str> {
    column_definitions().into_iter().map(|(name, _)| name).collect()
}

/// Create the table (widest schema) and add any column an older file lacks.
pub(super) async fn init(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_version (key TEXT PRIMARY KEY, value INTEGER NOT NULL)",
    )
    .execute(pool)
    .await?;

    let defs: Vec<String> = column_definitions()
        .into_iter()
        .map(|(name, ty)| format!("{name} {ty}"))
        .collect();
    sqlx::query(&format!(
        "CREATE TABLE IF NOT EXISTS {TABLE} (id INTEGER PRIMARY KEY AUTOINCREMENT, {})",
        defs.join(", ")
    ))
    .execute(pool)
    .await?;

    let existing: Vec<String> = sqlx::query(&format!("PRAGMA table_info({TABLE})"))
        .fetch_all(pool)
        .await?
        .iter()
        .map(|row| row.try_get::<String, _>("name"))
        .collect::<Result<_, _>>()?;

    for (name, ty) in column_definitions() {
        if existing.iter().any(|c| c == name) {
            continue;
        }
        // ADD COLUMN cannot add NOT NULL without a default; widened columns are nullable.
        let ty = ty.trim_end_matches(" NOT NULL");
        sqlx::query(&format!("ALTER TABLE {TABLE} ADD COLUMN {name} {ty}"))
            .execute(pool)
            .await?;
        tracing::info!(column = name, "history table widened");
    }

    sqlx::query(
        "INSERT INTO schema_version (key, value) VALUES ('history', $1)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(SCHEMA_VERSION)
    .execute(pool)
    .await?;

    Ok(())
}

/// Stored schema version, if the file has been initialised.
pub(super) async fn stored_version(pool: &SqlitePool) -> anyhow::Result<Option<i64>> {
    let version =
        sqlx::query_scalar::<_, i64>("SELECT value FROM schema_version WHERE key = 'history'")
            .fetch_optional(pool)
            .await?;
    Ok(version)
}
