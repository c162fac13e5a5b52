//! Synthetic incident generation: calendar rules, regime selection, volume
//! sampling, and per-entity orchestration.

pub mod baseline;
pub mod calendar;
pub mod engine;
pub mod regime;
pub mod synth;
pub mod volume;

pub use self::baseline::BaselineRange;
pub use self::engine::{EntityOutcome, EntityReport, Generator, RunReport};
pub use self::regime::Regime;

use crate::config::ConfigError;
use crate::storage::SinkError;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("target store has no incidents schema; run `incident-synth migrate` first")]
    SchemaMissing,

    #[error("pre-flight check failed: {0}")]
    Preflight(#[source] SinkError),

    #[error("failed to persist record for {entity} on {date}: {source}")]
    Persist {
        entity: String,
        date: NaiveDate,
        #[source]
        source: SinkError,
    },
}

/// Label attached to an anomalous day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyType {
    Spike,
    Drop,
    SustainedIncrease,
    SustainedDecrease,
    Cyclic,
}

impl AnomalyType {
    pub const ALL: [AnomalyType; 5] = [
        AnomalyType::Spike,
        AnomalyType::Drop,
        AnomalyType::SustainedIncrease,
        AnomalyType::SustainedDecrease,
        AnomalyType::Cyclic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyType::Spike => "SPIKE",
            AnomalyType::Drop => "DROP",
            AnomalyType::SustainedIncrease => "SUSTAINED_INCREASE",
            AnomalyType::SustainedDecrease => "SUSTAINED_DECREASE",
            AnomalyType::Cyclic => "CYCLIC",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl std::fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

pub const CATEGORIES: &[&str] = &[
    "Hardware",
    "Software",
    "Network",
    "Access",
    "Database",
    "Security",
];

pub const GROUPS: &[&str] = &[
    "Service Desk",
    "Infrastructure",
    "Applications",
    "Database Team",
    "Network Operations",
    "Security Operations",
];

pub const PRIORITIES: &[&str] = &["Critical", "High", "Medium", "Low"];

pub const OUTCOMES: &[&str] = &[
    "Resolved",
    "Workaround",
    "Duplicate",
    "Cancelled",
    "Escalated",
];

/// One synthesized incident. One row equals one incident.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncidentRecord {
    pub entity_id: String,
    pub incident_date: NaiveDate,
    pub created_at: NaiveDateTime,
    /// Closure is not modeled.
    pub closed_at: Option<NaiveDateTime>,
    pub category: &'static str,
    pub group: &'static str,
    pub priority: &'static str,
    pub outcome: &'static str,
    pub unit_volume: u32,
    pub is_anomaly: bool,
    pub anomaly_type: Option<AnomalyType>,
}

impl IncidentRecord {
    /// Anomaly label as stored: the type name, or an empty string.
    pub fn anomaly_label(&self) -> &'static str {
        self.anomaly_type.map(|t| t.as_str()).unwrap_or("")
    }
}

/// Everything decided about one day of one entity before records are built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayPlan {
    pub entity_id: String,
    pub date: NaiveDate,
    pub day_index: u32,
    pub baseline: BaselineRange,
    pub is_atypical: bool,
    pub is_fifth_business_day: bool,
    pub is_anomaly_day: bool,
    pub regime: Regime,
    pub volume: u32,
}

impl DayPlan {
    pub fn anomaly_type(&self) -> Option<AnomalyType> {
        self.regime.anomaly_type()
    }
}

/// Per-entity count of days resolved to each anomaly type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimeTally {
    #[serde(rename = "SPIKE")]
    pub spike: u64,
    #[serde(rename = "DROP")]
    pub drop: u64,
    #[serde(rename = "SUSTAINED_INCREASE")]
    pub sustained_increase: u64,
    #[serde(rename = "SUSTAINED_DECREASE")]
    pub sustained_decrease: u64,
    #[serde(rename = "CYCLIC")]
    pub cyclic: u64,
}

impl RegimeTally {
    pub fn record(&mut self, anomaly: AnomalyType) {
        *self.slot(anomaly) += 1;
    }

    pub fn get(&self, anomaly: AnomalyType) -> u64 {
        match anomaly {
            AnomalyType::Spike => self.spike,
            AnomalyType::Drop => self.drop,
            AnomalyType::SustainedIncrease => self.sustained_increase,
            AnomalyType::SustainedDecrease => self.sustained_decrease,
            AnomalyType::Cyclic => self.cyclic,
        }
    }

    pub fn total(&self) -> u64 {
        AnomalyType::ALL.iter().map(|t| self.get(*t)).sum()
    }

    fn slot(&mut self, anomaly: AnomalyType) -> &mut u64 {
        match anomaly {
            AnomalyType::Spike => &mut self.spike,
            AnomalyType::Drop => &mut self.drop,
            AnomalyType::SustainedIncrease => &mut self.sustained_increase,
            AnomalyType::SustainedDecrease => &mut self.sustained_decrease,
            AnomalyType::Cyclic => &mut self.cyclic,
        }
    }
}
