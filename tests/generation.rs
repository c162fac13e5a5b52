use anyhow::Result;
use chrono::NaiveDate;
use incident_synth::config::{RunConfig, SynthConfig};
use incident_synth::generator::baseline::baseline_range;
use incident_synth::generator::regime::select_regime;
use incident_synth::generator::volume::{sample_volume, volume_bounds};
use incident_synth::generator::{AnomalyType, Generator, Regime};
use incident_synth::storage::{self, MemorySink};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

// Wednesday 2024-03-13: not a listed date and not the 5th business day.
const ORDINARY_2024: (i32, u32, u32) = (2024, 3, 13);

fn assert_samples_in(regime: Regime, year: i32, date: NaiveDate, lo: u32, hi: u32) {
    let mut rng = StdRng::seed_from_u64(year as u64);
    let baseline = baseline_range(year);
    assert_eq!(volume_bounds(regime, baseline, date), (lo, hi));
    for _ in 0..500 {
        let v = sample_volume(&mut rng, regime, baseline, date);
        assert!((lo..=hi).contains(&v), "{v} outside [{lo}, {hi}]");
    }
}

#[test]
fn test_christmas_2023_forced_spike() {
    let date = d(2023, 12, 25);
    let regime = select_regime(date, 0, true);
    assert_eq!(regime, Regime::ForcedSpike);
    assert_eq!(regime.anomaly_type(), Some(AnomalyType::Spike));
    assert_samples_in(regime, 2023, date, 65, 85);
}

#[test]
fn test_index_ten_2024_is_drop() {
    let (y, m, day) = ORDINARY_2024;
    let date = d(y, m, day);
    let regime = select_regime(date, 10, true);
    assert_eq!(regime, Regime::Drop);
    assert_samples_in(regime, 2024, date, 5, 20);
}

#[test]
fn test_index_fifteen_2025_is_sustained_increase() {
    // 2025-04-09 is a Wednesday, the seventh business day of April.
    let date = d(2025, 4, 9);
    let regime = select_regime(date, 15, true);
    assert_eq!(regime, Regime::SustainedIncrease);
    assert_samples_in(regime, 2025, date, 80, 100);
}

#[test]
fn test_index_spike_keeps_baseline_volume() {
    let (y, m, day) = ORDINARY_2024;
    let date = d(y, m, day);
    let regime = select_regime(date, 5, true);
    assert_eq!(regime.anomaly_type(), Some(AnomalyType::Spike));
    assert_samples_in(regime, 2024, date, 20, 40);
}

#[test]
fn test_gate_off_is_normal_everywhere() {
    for (date, idx) in [(d(2023, 12, 25), 5), (d(2024, 3, 7), 10), (d(2025, 4, 9), 15)] {
        let regime = select_regime(date, idx, false);
        assert_eq!(regime, Regime::Normal);
        let b = baseline_range(2024);
        assert_eq!(volume_bounds(regime, b, date), (b.min, b.max));
    }
}

#[tokio::test]
async fn test_full_run_into_sqlite() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut config = SynthConfig::default();
    config.storage.db_path = dir.path().join("nested").join("incidents.db");
    config.run = RunConfig {
        entities: vec!["CRM".into(), "ERP".into(), "BILLING".into()],
        start_date: d(2022, 12, 1),
        end_date: d(2023, 2, 28),
        seed: Some(2024),
    };

    let report = incident_synth::generate(&config, true).await?;
    assert!(report.is_success());
    assert_eq!(report.completed().count(), 3);

    let pool = storage::open_pool(&config.storage.db_path.to_string_lossy())?;
    assert!(storage::find_label_conflicts(&pool)?.is_empty());

    let summary = storage::summarize(&pool)?;
    for entity in report.completed() {
        assert_eq!(entity.days, 90);

        let rows: Vec<_> = summary.iter().filter(|r| r.entity_id == entity.entity_id).collect();
        let stored: u64 = rows.iter().map(|r| r.records).sum();
        assert_eq!(stored, entity.records);

        for t in AnomalyType::ALL {
            let days = rows
                .iter()
                .find(|r| r.anomaly_type == t.as_str())
                .map(|r| r.days)
                .unwrap_or(0);
            assert_eq!(days, entity.tally.get(t), "{} {}", entity.entity_id, t);
        }
    }

    // Normal days never leave their year's baseline.
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT incident_date, COUNT(*) FROM incidents
         WHERE is_anomaly = 0
         GROUP BY entity_id, incident_date",
    )?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
    for r in rows {
        let (date, count) = r?;
        let year: i32 = date[..4].parse()?;
        let b = baseline_range(year);
        assert!(b.contains(count as u32), "{date}: {count} outside {b:?}");
    }

    // Every record is one incident with no closure.
    let bad: i64 = conn.query_row(
        "SELECT COUNT(*) FROM incidents
         WHERE unit_volume != 1 OR closed_at IS NOT NULL
            OR (is_anomaly = 1) != (anomaly_type != '')",
        [],
        |row| row.get(0),
    )?;
    assert_eq!(bad, 0);
    Ok(())
}

#[tokio::test]
async fn test_repeated_unseeded_runs_keep_day_labels_consistent() {
    let run = RunConfig {
        entities: vec!["A".into()],
        start_date: d(2024, 11, 1),
        end_date: d(2025, 1, 31),
        seed: None,
    };

    for _ in 0..2 {
        let generator = Generator::new(run.clone(), MemorySink::new());
        let report = generator.run().await.unwrap();
        let entity = report.completed().next().unwrap();
        let records = generator.sink().records();
        assert_eq!(records.len() as u64, entity.records);

        let mut per_day = std::collections::BTreeMap::new();
        for r in &records {
            assert_eq!(r.is_anomaly, r.anomaly_type.is_some());
            let entry = per_day.entry(r.incident_date).or_insert((r.anomaly_type, 0u32));
            assert_eq!(entry.0, r.anomaly_type);
            entry.1 += 1;
        }
        assert_eq!(per_day.len(), 92);
        for (date, (label, count)) in per_day {
            if label.is_none() {
                let b = baseline_range(chrono::Datelike::year(&date));
                assert!(b.contains(count), "{date}: {count}");
            }
        }
    }
}
