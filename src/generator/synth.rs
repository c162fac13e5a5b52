//! Expansion of a planned day into individual incident records.

use super::{DayPlan, IncidentRecord, CATEGORIES, GROUPS, OUTCOMES, PRIORITIES};
use crate::storage::{RecordSink, SinkError};
use chrono::{Duration, NaiveTime};
use rand::Rng;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

fn pick<R: Rng + ?Sized>(rng: &mut R, options: &[&'static str]) -> &'static str {
    options[rng.gen_range(0..options.len())]
}

/// Build one record for the planned day with randomized time and attributes.
pub fn synthesize_record<R: Rng + ?Sized>(rng: &mut R, plan: &DayPlan) -> IncidentRecord {
    let offset = Duration::seconds(rng.gen_range(0..SECONDS_PER_DAY));
    let anomaly_type = plan.anomaly_type();

    IncidentRecord {
        entity_id: plan.entity_id.clone(),
        incident_date: plan.date,
        created_at: plan.date.and_time(NaiveTime::MIN) + offset,
        closed_at: None,
        category: pick(rng, CATEGORIES),
        group: pick(rng, GROUPS),
        priority: pick(rng, PRIORITIES),
        outcome: pick(rng, OUTCOMES),
        unit_volume: 1,
        is_anomaly: anomaly_type.is_some(),
        anomaly_type,
    }
}

/// Emit `plan.volume` records to `sink`, one at a time.
///
/// Each append is awaited before the next record is built. The first failure
/// stops the day and is returned; records already appended stay appended.
pub async fn emit_day<R, S>(rng: &mut R, plan: &DayPlan, sink: &S) -> Result<u32, SinkError>
where
    R: Rng + ?Sized,
    S: RecordSink + ?Sized,
{
    for _ in 0..plan.volume {
        let record = synthesize_record(rng, plan);
        sink.append_record(&record).await?;
    }
    Ok(plan.volume)
}
