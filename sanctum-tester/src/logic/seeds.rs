use anyhow::{Result, bail};
use chrono::{Days, NaiveDate};
use sanctum_game::daily_seed;

/// Resolve the `--start-date` argument.
///
/// Accepts `today`, ISO dates (`2026-01-31`) and packed dates (`20260131`).
pub fn resolve_start_date(token: &str, today: NaiveDate) -> Result<NaiveDate> {
    let token = token.trim();
    if token.is_empty() || token.eq_ignore_ascii_case("today") {
        return Ok(today);
    }
    if let Ok(date) = NaiveDate::parse_from_str(token, "%Y-%m-%d") {
        return Ok(date);
    }
    if token.len() == 8
        && let Ok(date) = NaiveDate::parse_from_str(token, "%Y%m%d")
    {
        return Ok(date);
    }
    bail!("Unrecognized start date: {token}");
}

/// One calendar start date per run, a day apart, so every run sees a
/// different daily stream.
#[must_use]
pub fn run_dates(start: NaiveDate, runs: usize) -> Vec<NaiveDate> {
    (0..runs)
        .map_while(|offset| {
            let offset = u64::try_from(offset).ok()?;
            start.checked_add_days(Days::new(offset))
        })
        .collect()
}

/// Seed for a run's policy, derived from its start date so replays match.
#[must_use]
pub fn run_seed(start: NaiveDate) -> u64 {
    u64::from(daily_seed(start, 0).cast_unsigned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_supported_formats() {
        let today = date(2026, 10, 18);
        assert_eq!(resolve_start_date("today", today).unwrap(), today);
        assert_eq!(resolve_start_date("", today).unwrap(), today);
        assert_eq!(resolve_start_date("2026-01-31", today).unwrap(), date(2026, 1, 31));
        assert_eq!(resolve_start_date("20260131", today).unwrap(), date(2026, 1, 31));
        assert!(resolve_start_date("soon", today).is_err());
        assert!(resolve_start_date("2026-02-30", today).is_err());
    }

    #[test]
    fn runs_start_on_consecutive_days() {
        let dates = run_dates(date(2026, 12, 30), 3);
        assert_eq!(dates, vec![date(2026, 12, 30), date(2026, 12, 31), date(2027, 1, 1)]);
        assert!(run_dates(date(2026, 1, 1), 0).is_empty());
    }

    #[test]
    fn seeds_follow_the_start_date() {
        assert_eq!(run_seed(date(2026, 1, 1)), 20_260_101);
        assert_ne!(run_seed(date(2026, 1, 1)), run_seed(date(2026, 1, 2)));
    }
}
