//! incident-synth -- Calendar-aware synthetic incident generator.
//!
//! This crate produces multi-year, per-product incident streams with a
//! ground-truth label on every anomalous day (spike, drop, sustained increase,
//! sustained decrease, cyclic), for training and validating forecasting and
//! anomaly-detection models.

pub mod config;
pub mod generator;
pub mod storage;

use anyhow::{Context, Result};
use config::SynthConfig;
use generator::{Generator, RunReport};
use storage::SqliteSink;

/// Run a full generation into the configured SQLite store.
///
/// When `init_schema` is false the store must already hold the incidents
/// table; otherwise the run stops at the pre-flight check.
pub async fn generate(config: &SynthConfig, init_schema: bool) -> Result<RunReport> {
    // 1. Initialize Storage
    let db_path = config.storage.db_path.to_string_lossy().into_owned();
    tracing::info!(%db_path, "Opening incident store");
    if let Some(parent) = config.storage.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let pool = storage::open_pool(&db_path)?;

    // 2. Optional schema remediation
    if init_schema {
        let conn = pool.get()?;
        storage::schema::migrate(&conn).context("failed to create incidents schema")?;
    }

    // 3. Walk every entity
    let sink = SqliteSink::new(pool);
    tracing::info!(run_id = %sink.run_id(), "Generation run id assigned");
    let generator = Generator::new(config.run.clone(), sink);
    let report = generator.run().await?;

    Ok(report)
}
