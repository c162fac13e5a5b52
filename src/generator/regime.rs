//! Anomaly regime selection.
//!
//! Each day first draws a Bernoulli gate. Only gated days can be anomalous,
//! and they are resolved in a fixed order:
//!
//! 1. Atypical date or 5th business day: forced spike with amplified volume.
//! 2. `day_index % 31` residues 5/10/15/20 map to spike, drop, sustained
//!    increase and sustained decrease; otherwise `day_index % 7 == 3` is cyclic.
//! 3. Anything else stays normal.
//!
//! The rule-2 spike carries the SPIKE label but samples from the plain
//! baseline range. Existing datasets depend on that signature, so it is kept.

use super::calendar::{is_atypical_date, is_fifth_business_day};
use super::AnomalyType;
use chrono::NaiveDate;
use rand::Rng;
use serde::Serialize;

/// Probability that a given day is eligible to be anomalous.
pub const ANOMALY_DAY_PROBABILITY: f64 = 0.15;

const INDEX_CYCLE: u32 = 31;
const WEEK_CYCLE: u32 = 7;

/// Volume regime resolved for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    Normal,
    /// Calendar-driven spike; volume is stretched above baseline.
    ForcedSpike,
    /// Index-driven spike; labeled SPIKE but sampled from baseline.
    Spike,
    Drop,
    SustainedIncrease,
    SustainedDecrease,
    Cyclic,
}

impl Regime {
    pub fn anomaly_type(&self) -> Option<AnomalyType> {
        match self {
            Regime::Normal => None,
            Regime::ForcedSpike | Regime::Spike => Some(AnomalyType::Spike),
            Regime::Drop => Some(AnomalyType::Drop),
            Regime::SustainedIncrease => Some(AnomalyType::SustainedIncrease),
            Regime::SustainedDecrease => Some(AnomalyType::SustainedDecrease),
            Regime::Cyclic => Some(AnomalyType::Cyclic),
        }
    }

    pub fn is_anomaly(&self) -> bool {
        !matches!(self, Regime::Normal)
    }
}

impl std::fmt::Display for Regime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Regime::Normal => "normal",
            Regime::ForcedSpike => "forced_spike",
            Regime::Spike => "spike",
            Regime::Drop => "drop",
            Regime::SustainedIncrease => "sustained_increase",
            Regime::SustainedDecrease => "sustained_decrease",
            Regime::Cyclic => "cyclic",
        })
    }
}

/// Draw the per-day eligibility gate.
pub fn draw_anomaly_gate<R: Rng + ?Sized>(rng: &mut R) -> bool {
    rng.gen_bool(ANOMALY_DAY_PROBABILITY)
}

pub fn select_regime(date: NaiveDate, day_index: u32, is_anomaly_day: bool) -> Regime {
    if !is_anomaly_day {
        return Regime::Normal;
    }

    if is_atypical_date(date) || is_fifth_business_day(date) {
        return Regime::ForcedSpike;
    }

    match day_index % INDEX_CYCLE {
        5 => Regime::Spike,
        10 => Regime::Drop,
        15 => Regime::SustainedIncrease,
        20 => Regime::SustainedDecrease,
        _ if day_index % WEEK_CYCLE == 3 => Regime::Cyclic,
        _ => Regime::Normal,
    }
}
