//! SQLite storage layer -- schema, record sinks, read-back queries.

pub mod memory;
pub mod schema;

pub use self::memory::MemorySink;

use crate::generator::IncidentRecord;
use anyhow::Result;
use async_trait::async_trait;
use r2d2::Pool as R2D2Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Connection Pool type
pub type Pool = R2D2Pool<SqliteConnectionManager>;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("record rejected: {0}")]
    Rejected(String),
}

/// Destination for synthesized records.
///
/// Implementations must tolerate concurrent calls from different entity
/// lanes; the generator never coordinates access itself.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Pre-flight: whether the target store is ready to receive records.
    async fn schema_ready(&self) -> Result<bool, SinkError>;

    /// Persist a single record. Called once per record, never batched.
    async fn append_record(&self, record: &IncidentRecord) -> Result<(), SinkError>;
}

/// Open (or create) the SQLite database and return a connection pool.
///
/// The schema is not created here; see [`schema::migrate`].
pub fn open_pool(path: &str) -> Result<Pool> {
    let manager = SqliteConnectionManager::file(path).with_init(|c| {
        c.execute_batch(
            "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA temp_store = MEMORY;
                 PRAGMA busy_timeout = 5000;",
        )
    });

    let pool = R2D2Pool::new(manager)?;
    Ok(pool)
}

/// Insert one incident row.
pub fn insert_record(conn: &Connection, run_id: &Uuid, record: &IncidentRecord) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO incidents (
            run_id, entity_id, incident_date, created_at, closed_at,
            category, assignment_group, priority, outcome,
            unit_volume, is_anomaly, anomaly_type
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            run_id.to_string(),
            record.entity_id,
            record.incident_date.to_string(),
            record.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            record.closed_at.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
            record.category,
            record.group,
            record.priority,
            record.outcome,
            record.unit_volume,
            record.is_anomaly,
            record.anomaly_label(),
        ],
    )?;
    Ok(())
}

/// Writes each record to the `incidents` table on the blocking pool.
#[derive(Clone)]
pub struct SqliteSink {
    pool: Pool,
    run_id: Uuid,
}

impl SqliteSink {
    pub fn new(pool: Pool) -> Self {
        Self {
            pool,
            run_id: Uuid::new_v4(),
        }
    }

    /// Identifier stamped on every row written by this sink.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }
}

#[async_trait]
impl RecordSink for SqliteSink {
    async fn schema_ready(&self) -> Result<bool, SinkError> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<bool, SinkError> {
            let conn = pool.get()?;
            Ok(schema::schema_exists(&conn)?)
        })
        .await?
    }

    async fn append_record(&self, record: &IncidentRecord) -> Result<(), SinkError> {
        let pool = self.pool.clone();
        let run_id = self.run_id;
        let record = record.clone();
        tokio::task::spawn_blocking(move || -> Result<(), SinkError> {
            let conn = pool.get()?;
            insert_record(&conn, &run_id, &record)?;
            Ok(())
        })
        .await?
    }
}

/// Stored row and day counts for one entity and label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub entity_id: String,
    /// Empty for normal days.
    pub anomaly_type: String,
    pub days: u64,
    pub records: u64,
}

/// Group stored incidents by entity and anomaly label.
pub fn summarize(pool: &Pool) -> Result<Vec<SummaryRow>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT entity_id, anomaly_type, COUNT(DISTINCT incident_date), COUNT(*)
         FROM incidents
         GROUP BY entity_id, anomaly_type
         ORDER BY entity_id, anomaly_type",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(SummaryRow {
            entity_id: row.get(0)?,
            anomaly_type: row.get(1)?,
            days: row.get::<_, i64>(2)? as u64,
            records: row.get::<_, i64>(3)? as u64,
        })
    })?;

    let mut summary = Vec::new();
    for r in rows {
        summary.push(r?);
    }
    Ok(summary)
}

/// Days whose rows from one run disagree on the anomaly label. Should always be empty.
///
/// Separate runs may label the same day differently, so rows are only
/// compared within a run.
pub fn find_label_conflicts(pool: &Pool) -> Result<Vec<(String, String)>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT DISTINCT entity_id, incident_date
         FROM incidents
         GROUP BY run_id, entity_id, incident_date
         HAVING COUNT(DISTINCT anomaly_type) > 1 OR COUNT(DISTINCT is_anomaly) > 1",
    )?;
    let conflicts: Vec<(String, String)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<_, _>>()?;
    Ok(conflicts)
}
