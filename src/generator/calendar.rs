//! Calendar predicates used to bias spikes toward holiday-like dates and
//! month-start business days.

use chrono::{Datelike, NaiveDate, Weekday};

/// Recurring (month, day) pairs treated as holiday-like, independent of year.
const ATYPICAL_DATES: &[(u32, u32)] = &[
    (1, 1),
    (4, 21),
    (5, 1),
    (5, 15),
    (9, 7),
    (10, 12),
    (11, 2),
    (11, 15),
    (11, 20),
    (12, 24),
    (12, 25),
    (12, 31),
];

/// Ordinal of the business day that counts as the month's reporting day.
const TARGET_BUSINESS_DAY: u32 = 5;

pub fn is_atypical_date(date: NaiveDate) -> bool {
    ATYPICAL_DATES.contains(&(date.month(), date.day()))
}

fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Position of `date` among Mon-Fri days of its month, counting from the 1st.
/// Returns `None` for Saturdays and Sundays.
pub fn business_day_ordinal(date: NaiveDate) -> Option<u32> {
    if !is_weekday(date) {
        return None;
    }
    let count = date
        .with_day(1)
        .into_iter()
        .flat_map(|first| first.iter_days().take(date.day() as usize))
        .filter(|d| is_weekday(*d))
        .count();
    Some(count as u32)
}

pub fn is_fifth_business_day(date: NaiveDate) -> bool {
    business_day_ordinal(date) == Some(TARGET_BUSINESS_DAY)
}
