// Per-component audit history in SQLite: one file per component, one append-only table.
// Appends are transactional (WAL + synchronous=FULL), so an interrupted run never leaves a
// partial row; completed rows survive.

mod schema;

use crate::error::PipelineError;
use crate::models::{MetricSnapshot, TimingMetrics, component_slug};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::instrument;

/// File name prefix for history tables.
pub const FILE_PREFIX: &str = "lighthouse-report-";

pub struct HistoryRepo {
    dir: PathBuf,
    pools: Mutex<HashMap<String, SqlitePool>>,
    /// Serializes appends within this process; SQLite's file lock covers other processes.
    write_lock: Mutex<()>,
}

impl HistoryRepo {
    /// Repo rooted at `dir`. Nothing is created until the first append.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            pools: Mutex::new(HashMap::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// Deterministic table file for `component`.
    pub fn table_path(&self, component: &str) -> PathBuf {
        self.dir
            .join(format!("{FILE_PREFIX}{}.db", component_slug(component)))
    }

    /// Open (creating if asked) the component's database and make sure the schema is current.
    /// Returns `None` when the file does not exist and `create` is false.
    async fn pool(&self, component: &str, create: bool) -> anyhow::Result<Option<SqlitePool>> {
        let mut pools = self.pools.lock().await;
        if let Some(pool) = pools.get(component) {
            return Ok(Some(pool.clone()));
        }

        let path = self.table_path(component);
        if !create && !path.exists() {
            return Ok(None);
        }
        std::fs::create_dir_all(&self.dir)?;

        let opts = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Full);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;
        schema::init(&pool).await?;
        tracing::debug!(component, path = %path.display(), "history table opened");

        pools.insert(component.to_string(), pool.clone());
        Ok(Some(pool))
    }

    /// Append one row for `component`, creating its table on first use.
    #[instrument(skip(self, snapshot), fields(repo = "history", operation = "append"))]
    pub async fn append(&self, component: &str, snapshot: &MetricSnapshot) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().await;
        let Some(pool) = self.pool(component, true).await? else {
            anyhow::bail!("history table for {component:?} could not be created");
        };

        let columns = schema::columns();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${i}")).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            schema::TABLE,
            columns.join(", "),
            placeholders.join(", ")
        );

        let timings = snapshot.timings.as_ref();
        let mut tx = pool.begin().await?;
        sqlx::query(&sql)
            .bind(&snapshot.timestamp)
            .bind(snapshot.performance)
            .bind(snapshot.accessibility)
            .bind(snapshot.best_practices)
            .bind(snapshot.seo)
            .bind(timings.map(|t| t.first_contentful_paint))
            .bind(timings.map(|t| t.largest_contentful_paint))
            .bind(timings.map(|t| t.speed_index))
            .bind(timings.map(|t| t.total_blocking_time))
            .bind(timings.map(|t| t.cumulative_layout_shift))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    /// All rows for `component` in append order; empty when no table exists yet.
    #[instrument(skip(self), fields(repo = "history", operation = "read_all"))]
    pub async fn read_all(&self, component: &str) -> anyhow::Result<Vec<MetricSnapshot>> {
        let Some(pool) = self.pool(component, false).await? else {
            return Ok(Vec::new());
        };
        let sql = format!(
            "SELECT id, {} FROM {} ORDER BY id ASC",
            schema::columns().join(", "),
            schema::TABLE
        );
        let rows = sqlx::query(&sql).fetch_all(&pool).await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(Self::parse_row(&row)?);
        }
        Ok(out)
    }

    /// Stored schema version for `component`; `None` when it has no table.
    pub async fn schema_version(&self, component: &str) -> anyhow::Result<Option<i64>> {
        match self.pool(component, false).await? {
            Some(pool) => schema::stored_version(&pool).await,
            None => Ok(None),
        }
    }

    /// Close every open database.
    pub async fn close(&self) {
        let mut pools = self.pools.lock().await;
        for (_, pool) in pools.drain() {
            pool.close().await;
        }
    }

    fn parse_row(row: &SqliteRow) -> anyhow::Result<MetricSnapshot> {
        let id: i64 = row.try_get("id")?;
        let timing_cols: [Option<f64>; 5] = [
            row.try_get("first_contentful_paint")?,
            row.try_get("largest_contentful_paint")?,
            row.try_get("speed_index")?,
            row.try_get("total_blocking_time")?,
            row.try_get("cumulative_layout_shift")?,
        ];
        let timings = match timing_cols {
            [Some(fcp), Some(lcp), Some(si), Some(tbt), Some(cls)] => Some(TimingMetrics {
                first_contentful_paint: fcp,
                largest_contentful_paint: lcp,
                speed_index: si,
                total_blocking_time: tbt,
                cumulative_layout_shift: cls,
            }),
            [None, None, None, None, None] => None,
            _ => {
                return Err(PipelineError::CorruptRow {
                    row_id: id,
                    reason: "partial timing columns".into(),
                }
                .into());
            }
        };

        Ok(MetricSnapshot {
            timestamp: row.try_get("timestamp")?,
            performance: row.try_get("performance")?,
            accessibility: row.try_get("accessibility")?,
            best_practices: row.try_get("best_practices")?,
            seo: row.try_get("seo")?,
            timings,
        })
    }
}
