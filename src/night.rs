//! Night directory naming for the RMS capture tree.
//!
//! An observing night runs from 12:00 UTC to 11:59 UTC the following day,
//! so every file captured during one session lands in the same directory
//! regardless of which calendar date it was recorded on.

use chrono::{DateTime, Duration, Timelike, Utc};

/// Return the RMS-style night directory name for a given UTC instant.
///
/// A recording at 02:00 on the 16th belongs to the night that started at
/// 12:00 on the 15th; a recording at exactly 12:00 belongs to the night
/// starting at that instant. The name encodes the night start with the
/// time fields fixed: `YYYYMMDD_120000_000000`.
pub fn night_dir_name(dt: DateTime<Utc>) -> String {
    let night_start_date = if dt.hour() < 12 {
        dt.date_naive() - Duration::days(1)
    } else {
        dt.date_naive()
    };

    format!("{}_120000_000000", night_start_date.format("%Y%m%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn early_morning_belongs_to_previous_day() {
        assert_eq!(
            night_dir_name(utc(2024, 6, 16, 2, 0, 0)),
            "20240615_120000_000000"
        );
    }

    #[test]
    fn noon_starts_a_new_night() {
        assert_eq!(
            night_dir_name(utc(2024, 6, 16, 12, 0, 0)),
            "20240616_120000_000000"
        );
    }

    #[test]
    fn just_before_noon_is_still_previous_night() {
        assert_eq!(
            night_dir_name(utc(2024, 6, 16, 11, 59, 59)),
            "20240615_120000_000000"
        );
    }

    #[test]
    fn evening_belongs_to_same_day() {
        assert_eq!(
            night_dir_name(utc(2024, 6, 16, 23, 30, 0)),
            "20240616_120000_000000"
        );
    }

    #[test]
    fn midnight_belongs_to_previous_day() {
        assert_eq!(
            night_dir_name(utc(2024, 6, 16, 0, 0, 0)),
            "20240615_120000_000000"
        );
    }

    #[test]
    fn crosses_month_and_year_boundaries() {
        assert_eq!(
            night_dir_name(utc(2024, 3, 1, 3, 0, 0)),
            "20240229_120000_000000"
        );
        assert_eq!(
            night_dir_name(utc(2025, 1, 1, 0, 30, 0)),
            "20241231_120000_000000"
        );
    }

    #[test]
    fn deterministic_for_repeated_calls() {
        let instant = utc(2024, 6, 16, 4, 15, 27);
        assert_eq!(night_dir_name(instant), night_dir_name(instant));
    }
}
