//! In-memory record sink for dry runs and tests.

use super::{RecordSink, SinkError};
use crate::generator::IncidentRecord;
use async_trait::async_trait;
use std::sync::Mutex;

/// Collects records in insertion order. Always reports a ready schema.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<IncidentRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of everything appended so far.
    pub fn records(&self) -> Vec<IncidentRecord> {
        self.lock().clone()
    }

    /// Records of one entity, in the order they were appended.
    pub fn records_for(&self, entity_id: &str) -> Vec<IncidentRecord> {
        self.lock()
            .iter()
            .filter(|r| r.entity_id == entity_id)
            .cloned()
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<IncidentRecord>> {
        // Pushes never leave the vec half-written, so poisoning is ignored.
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn schema_ready(&self) -> Result<bool, SinkError> {
        Ok(true)
    }

    async fn append_record(&self, record: &IncidentRecord) -> Result<(), SinkError> {
        self.lock().push(record.clone());
        Ok(())
    }
}
