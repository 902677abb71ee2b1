//! Locally computed time data, used whenever the live page is unavailable.

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use icu_calendar::islamic::IslamicCivil;
use icu_calendar::persian::Persian;
use icu_calendar::{AsCalendar, Date, Iso};

use crate::types::TimeSnapshot;

/// Build a snapshot for the current local instant.
pub fn fallback_now() -> TimeSnapshot {
    fallback_snapshot(Local::now().naive_local())
}

/// Build a snapshot for a fixed local instant.
///
/// All four fields are derived from the same instant. The solar and lunar
/// dates are not zero-padded; the civil date is.
pub fn fallback_snapshot(now: NaiveDateTime) -> TimeSnapshot {
    let date = now.date();

    TimeSnapshot {
        current_time: now.format("%H:%M:%S").to_string(),
        current_date: persian_date(date),
        hijri_date: hijri_date(date),
        gregorian_date: now.format("%Y/%m/%d").to_string(),
    }
}

/// Solar Hijri date as `year/month/day`.
pub fn persian_date(date: NaiveDate) -> String {
    convert(date, Persian::new())
}

/// Tabular (civil epoch) lunar Hijri date as `year/month/day`.
pub fn hijri_date(date: NaiveDate) -> String {
    convert(date, IslamicCivil::new())
}

fn convert<C: AsCalendar>(date: NaiveDate, calendar: C) -> String {
    match to_iso(date) {
        Some(iso) => {
            let converted = iso.to_calendar(calendar);
            format!(
                "{}/{}/{}",
                converted.year().number,
                converted.month().ordinal,
                converted.day_of_month().0
            )
        }
        None => {
            tracing::error!("Date {date} is outside the supported calendar range");
            date.format("%Y/%-m/%-d").to_string()
        }
    }
}

fn to_iso(date: NaiveDate) -> Option<Date<Iso>> {
    Date::try_new_iso_date(date.year(), date.month() as u8, date.day() as u8).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_nowruz_1403() {
        let snapshot = fallback_snapshot(at(2024, 3, 20, 13, 5, 9));
        assert_eq!(snapshot.current_time, "13:05:09");
        assert_eq!(snapshot.current_date, "1403/1/1");
        assert_eq!(snapshot.hijri_date, "1445/9/10");
        assert_eq!(snapshot.gregorian_date, "2024/03/20");
    }

    #[test]
    fn test_last_day_of_common_year() {
        let snapshot = fallback_snapshot(at(2024, 3, 19, 0, 0, 0));
        assert_eq!(snapshot.current_time, "00:00:00");
        assert_eq!(snapshot.current_date, "1402/12/29");
        assert_eq!(snapshot.hijri_date, "1445/9/9");
        assert_eq!(snapshot.gregorian_date, "2024/03/19");
    }

    #[test]
    fn test_leap_year_new_year() {
        // 1403 is a leap year, so 1404 starts a day later in March.
        assert_eq!(
            persian_date(NaiveDate::from_ymd_opt(2025, 3, 20).unwrap()),
            "1403/12/30"
        );
        assert_eq!(
            persian_date(NaiveDate::from_ymd_opt(2025, 3, 21).unwrap()),
            "1404/1/1"
        );
    }

    #[test]
    fn test_hijri_civil_epoch() {
        assert_eq!(
            hijri_date(NaiveDate::from_ymd_opt(2025, 3, 21).unwrap()),
            "1446/9/21"
        );
    }

    #[test]
    fn test_deterministic_for_fixed_instant() {
        let instant = at(2023, 12, 31, 23, 59, 59);
        assert_eq!(fallback_snapshot(instant), fallback_snapshot(instant));
    }

    #[test]
    fn test_fallback_now_is_well_formed() {
        let snapshot = fallback_now();
        let parts: Vec<&str> = snapshot.current_time.split(':').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| p.len() == 2));
        for date in [
            &snapshot.current_date,
            &snapshot.hijri_date,
            &snapshot.gregorian_date,
        ] {
            assert_eq!(date.split('/').count(), 3, "malformed date {date}");
        }
    }
}
