//! Daily seed derivation.
//! Seed format: `YYYYMMDD + day`, e.g. 2026-01-01 on day 1 -> 20260102.

use chrono::{Datelike, NaiveDate};

/// Calendar component of the seed: `year*10000 + month*100 + day_of_month`.
#[must_use]
pub fn calendar_seed(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 10_000 + i64::from(date.month()) * 100 + i64::from(date.day())
}

/// Seed for the stream used on `date` while the save is on in-game `day`.
///
/// The sum is computed in 64 bits and wrapped to 32 bits.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn daily_seed(date: NaiveDate, day: u32) -> i32 {
    calendar_seed(date).wrapping_add(i64::from(day)) as i32
}
