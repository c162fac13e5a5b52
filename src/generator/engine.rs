use crate::config::RunConfig;
use crate::generator::baseline::baseline_range;
use crate::generator::calendar::{is_atypical_date, is_fifth_business_day};
use crate::generator::regime::{draw_anomaly_gate, select_regime};
use crate::generator::synth::emit_day;
use crate::generator::volume::sample_volume;
use crate::generator::{DayPlan, GenerateError, RegimeTally};
use crate::storage::RecordSink;
use chrono::{Datelike, NaiveDate};
use futures::future::join_all;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, error, info};

/// Independent random streams for one entity lane.
///
/// Day planning and record attributes draw from separate streams, so a seeded
/// preview shows exactly the days a seeded generation run produces. Seeded
/// streams depend on the entity id only, never on its position in the list.
pub struct LaneRng {
    pub plan: StdRng,
    pub records: StdRng,
}

impl LaneRng {
    pub fn new(seed: Option<u64>, entity_id: &str) -> Self {
        match seed {
            Some(seed) => {
                let base = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ entity_hash(entity_id);
                Self {
                    plan: StdRng::seed_from_u64(base),
                    records: StdRng::seed_from_u64(base ^ 0xD1B5_4A32_D192_ED03),
                }
            }
            None => Self {
                plan: StdRng::from_entropy(),
                records: StdRng::from_entropy(),
            },
        }
    }
}

/// FNV-1a over the entity id. Stable across builds and platforms.
fn entity_hash(entity_id: &str) -> u64 {
    entity_id.bytes().fold(0xCBF2_9CE4_8422_2325_u64, |hash, b| {
        (hash ^ u64::from(b)).wrapping_mul(0x0000_0100_0000_01B3)
    })
}

/// Resolve everything about one day: calendar flags, baseline, gate, regime, volume.
pub fn plan_day<R: Rng + ?Sized>(
    rng: &mut R,
    entity_id: &str,
    date: NaiveDate,
    day_index: u32,
) -> DayPlan {
    let baseline = baseline_range(date.year());
    let is_anomaly_day = draw_anomaly_gate(rng);
    let regime = select_regime(date, day_index, is_anomaly_day);
    let volume = sample_volume(rng, regime, baseline, date);

    DayPlan {
        entity_id: entity_id.to_string(),
        date,
        day_index,
        baseline,
        is_atypical: is_atypical_date(date),
        is_fifth_business_day: is_fifth_business_day(date),
        is_anomaly_day,
        regime,
        volume,
    }
}

/// Iterator over the planned days of one entity, in calendar order.
pub fn plan_days<'a, R: Rng + ?Sized>(
    rng: &'a mut R,
    entity_id: &'a str,
    start: NaiveDate,
    end: NaiveDate,
) -> impl Iterator<Item = DayPlan> + 'a {
    start
        .iter_days()
        .take_while(move |d| *d <= end)
        .enumerate()
        .map(move |(i, date)| plan_day(&mut *rng, entity_id, date, i as u32))
}

/// Summary of one completed entity walk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntityReport {
    pub entity_id: String,
    pub tally: RegimeTally,
    pub days: u64,
    pub anomalous_days: u64,
    pub records: u64,
}

impl EntityReport {
    fn new(entity_id: &str) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug)]
pub struct EntityOutcome {
    pub entity_id: String,
    pub result: Result<EntityReport, GenerateError>,
}

/// Per-entity outcomes in configuration order.
#[derive(Debug)]
pub struct RunReport {
    pub outcomes: Vec<EntityOutcome>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    pub fn completed(&self) -> impl Iterator<Item = &EntityReport> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &GenerateError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.entity_id.as_str(), e)))
    }

    pub fn total_records(&self) -> u64 {
        self.completed().map(|r| r.records).sum()
    }
}

/// Drives every entity through the day-by-day pipeline into a record sink.
pub struct Generator<S> {
    run: RunConfig,
    sink: S,
}

impl<S: RecordSink> Generator<S> {
    pub fn new(run: RunConfig, sink: S) -> Self {
        Self { run, sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Validate, run the pre-flight check, then walk all entities concurrently.
    ///
    /// Lanes are polled together on the calling task; nothing is spawned.
    /// A failing lane does not stop the others.
    pub async fn run(&self) -> Result<RunReport, GenerateError> {
        self.run.validate()?;

        match self.sink.schema_ready().await {
            Ok(true) => {}
            Ok(false) => return Err(GenerateError::SchemaMissing),
            Err(e) => return Err(GenerateError::Preflight(e)),
        }

        info!(
            entities = self.run.entities.len(),
            start = %self.run.start_date,
            end = %self.run.end_date,
            days = self.run.day_count(),
            seeded = self.run.seed.is_some(),
            "Starting generation run"
        );

        let lanes = self.run.entities.iter().map(|entity_id| async move {
            let result = self.run_entity(entity_id, LaneRng::new(self.run.seed, entity_id)).await;
            if let Err(e) = &result {
                error!(entity = %entity_id, "Entity generation aborted: {}", e);
            }
            EntityOutcome {
                entity_id: entity_id.clone(),
                result,
            }
        });

        let outcomes = join_all(lanes).await;
        let report = RunReport { outcomes };

        info!(
            completed = report.completed().count(),
            failed = report.failures().count(),
            records = report.total_records(),
            "Generation run finished"
        );
        Ok(report)
    }

    /// Walk one entity's window day by day, strictly in order.
    ///
    /// The first persistence failure aborts the walk; rows already written stay.
    pub async fn run_entity(
        &self,
        entity_id: &str,
        mut rng: LaneRng,
    ) -> Result<EntityReport, GenerateError> {
        info!(entity = %entity_id, "Entity walk started");
        let mut report = EntityReport::new(entity_id);

        let days = plan_days(&mut rng.plan, entity_id, self.run.start_date, self.run.end_date);
        for plan in days {
            debug!(
                entity = %entity_id,
                date = %plan.date,
                day_index = plan.day_index,
                regime = %plan.regime,
                volume = plan.volume,
                "Day planned"
            );

            if let Some(anomaly) = plan.anomaly_type() {
                report.tally.record(anomaly);
                report.anomalous_days += 1;
            }

            let written = emit_day(&mut rng.records, &plan, &self.sink)
                .await
                .map_err(|source| GenerateError::Persist {
                    entity: entity_id.to_string(),
                    date: plan.date,
                    source,
                })?;

            report.records += u64::from(written);
            report.days += 1;
        }

        info!(
            entity = %entity_id,
            days = report.days,
            records = report.records,
            spike = report.tally.spike,
            drop = report.tally.drop,
            sustained_increase = report.tally.sustained_increase,
            sustained_decrease = report.tally.sustained_decrease,
            cyclic = report.tally.cyclic,
            "Entity walk complete"
        );
        Ok(report)
    }
}
