//! Competition season derivation.

use chrono::{DateTime, Datelike, TimeZone};

/// Month (1-based) in which a new league season starts.
///
/// European leagues typically kick off in July or August.
pub const SEASON_START_MONTH: u32 = 7;

/// Returns the `"YYYY-YYYY"` season label for a timestamp.
///
/// Dates from [`SEASON_START_MONTH`] onwards open the season starting that
/// year; earlier dates belong to the season that started the year before.
/// Year and month are read in the timestamp's own offset.
#[must_use]
pub fn derive_season<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> String {
    let year = timestamp.year();
    if timestamp.month() >= SEASON_START_MONTH {
        format!("{year}-{}", year + 1)
    } else {
        format!("{}-{year}", year - 1)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::timestamp::parse_timestamp;

    fn season_of(value: &str) -> String {
        let Ok(ts) = parse_timestamp(value) else {
            panic!("invalid test timestamp {value}");
        };
        derive_season(&ts)
    }

    #[test]
    fn start_month_opens_new_season() {
        assert_eq!(season_of("2024-07-01T00:00:00+0000"), "2024-2025");
        assert_eq!(season_of("2024-06-30T23:59:59+0000"), "2023-2024");
    }

    #[test]
    fn mid_season_dates() {
        assert_eq!(season_of("2024-02-15T13:30:00+0000"), "2023-2024");
        assert_eq!(season_of("2024-10-15T16:30:00+0000"), "2024-2025");
    }

    #[test]
    fn year_boundary_follows_arithmetic() {
        assert_eq!(season_of("2024-12-31T23:59:59+0000"), "2024-2025");
        assert_eq!(season_of("2025-01-01T00:00:00+0000"), "2024-2025");
    }

    #[test]
    fn uses_local_calendar_of_the_offset() {
        // 2024-07-01 00:30 at +0200 is still June in UTC.
        assert_eq!(season_of("2024-07-01T00:30:00+0200"), "2024-2025");
    }
}
