//! Database schema and migrations.

use anyhow::Result;
use rusqlite::Connection;

/// Create the incidents table and its indexes.
pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS incidents (
            id INTEGER PRIMARY KEY,
            entity_id TEXT NOT NULL,
            incident_date TEXT NOT NULL,
            created_at TEXT NOT NULL,
            closed_at TEXT,
            category TEXT NOT NULL,
            assignment_group TEXT NOT NULL,
            priority TEXT NOT NULL,
            outcome TEXT NOT NULL,
            unit_volume INTEGER NOT NULL DEFAULT 1,
            is_anomaly INTEGER NOT NULL DEFAULT 0,
            anomaly_type TEXT NOT NULL DEFAULT ''
        );

        CREATE INDEX IF NOT EXISTS idx_incidents_entity_date ON incidents(entity_id, incident_date);
        CREATE INDEX IF NOT EXISTS idx_incidents_anomaly ON incidents(anomaly_type);",
    )?;

    // Migration: stores created before run tracking lack 'run_id'
    let has_run_id: i32 = conn.query_row(
        "SELECT count(*) FROM pragma_table_info('incidents') WHERE name='run_id'",
        [],
        |row| row.get(0),
    )?;

    if has_run_id == 0 {
        conn.execute("ALTER TABLE incidents ADD COLUMN run_id TEXT NOT NULL DEFAULT ''", [])?;
    }

    Ok(())
}

/// Pre-flight check: does the incidents table exist?
pub fn schema_exists(conn: &Connection) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = 'incidents'",
        [],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}
