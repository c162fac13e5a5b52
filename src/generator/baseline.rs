use serde::Serialize;

/// Inclusive bounds of normal daily volume for one calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BaselineRange {
    pub min: u32,
    pub max: u32,
}

impl BaselineRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, volume: u32) -> bool {
        (self.min..=self.max).contains(&volume)
    }
}

/// Baseline volume bounds for `year`. Years before 2023 use the default range.
pub fn baseline_range(year: i32) -> BaselineRange {
    match year {
        2023 => BaselineRange::new(10, 25),
        2024 => BaselineRange::new(20, 40),
        y if y >= 2025 => BaselineRange::new(30, 60),
        _ => BaselineRange::new(15, 35),
    }
}
