use super::{BaselineRange, Regime};
use chrono::{Datelike, NaiveDate, Weekday};
use rand::Rng;

/// Floor for the low end of a drop or sustained decrease.
const DEPRESSED_MIN: u32 = 5;
/// The depressed range tops out at no less than this.
const DEPRESSED_MAX_FLOOR: u32 = 10;

/// Inclusive sampling bounds for a regime, given the year's baseline.
pub fn volume_bounds(regime: Regime, baseline: BaselineRange, date: NaiveDate) -> (u32, u32) {
    let BaselineRange { min, max } = baseline;
    match regime {
        Regime::Normal | Regime::Spike => (min, max),
        Regime::ForcedSpike => (max + 40, max + 60),
        Regime::SustainedIncrease => (max + 20, max + 40),
        Regime::Drop | Regime::SustainedDecrease => {
            (DEPRESSED_MIN, DEPRESSED_MAX_FLOOR.max(min))
        }
        Regime::Cyclic if date.weekday() == Weekday::Mon => (max + 30, max + 50),
        Regime::Cyclic => (min, max),
    }
}

/// Draw the day's total incident count.
pub fn sample_volume<R: Rng + ?Sized>(
    rng: &mut R,
    regime: Regime,
    baseline: BaselineRange,
    date: NaiveDate,
) -> u32 {
    let (lo, hi) = volume_bounds(regime, baseline, date);
    rng.gen_range(lo..=hi)
}
