//! Week navigation for the appointment calendar.
//!
//! Weeks run Sunday to Saturday. The navigator keeps a reference date and
//! derives the 7-day span from it; moving a week forward or back shifts
//! the reference date by exactly 7 days and recomputes the span. Dates
//! are calendar days (midnight local time); there is no backend
//! dependency and no failure mode here.

use std::sync::RwLock;

use chrono::{Datelike, Duration, Local, NaiveDate};

/// The Sunday on or before `date`.
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// The 7 consecutive days beginning at `start`.
pub fn week_days(start: NaiveDate) -> [NaiveDate; 7] {
    std::array::from_fn(|i| start + Duration::days(i as i64))
}

struct WeekState {
    reference: NaiveDate,
    week: [NaiveDate; 7],
}

/// Reference date plus the derived Sunday-to-Saturday span.
pub struct WeekNavigator {
    state: RwLock<WeekState>,
}

impl WeekNavigator {
    /// Navigator anchored on today's local date.
    pub fn new() -> Self {
        Self::starting_at(Local::now().date_naive())
    }

    /// Navigator anchored on an explicit reference date.
    pub fn starting_at(reference: NaiveDate) -> Self {
        Self {
            state: RwLock::new(WeekState {
                reference,
                week: week_days(start_of_week(reference)),
            }),
        }
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.state.read().unwrap().reference
    }

    /// The current week, Sunday first.
    pub fn week(&self) -> [NaiveDate; 7] {
        self.state.read().unwrap().week
    }

    pub fn set_reference_date(&self, reference: NaiveDate) {
        let mut state = self.state.write().unwrap();
        state.reference = reference;
        state.week = week_days(start_of_week(reference));
    }

    /// Move the reference date 7 days forward.
    pub fn advance_week(&self) {
        self.shift(7);
    }

    /// Move the reference date 7 days back.
    pub fn retreat_week(&self) {
        self.shift(-7);
    }

    fn shift(&self, days: i64) {
        let reference = self.reference_date() + Duration::days(days);
        self.set_reference_date(reference);
    }
}

impl Default for WeekNavigator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn start_of_week_is_the_sunday_on_or_before() {
        // 2026-08-19 is a Wednesday; the week starts on Sunday the 16th.
        assert_eq!(start_of_week(date(2026, 8, 19)), date(2026, 8, 16));
        // A Sunday is its own week start.
        assert_eq!(start_of_week(date(2026, 8, 16)), date(2026, 8, 16));
        // Saturday belongs to the week that started six days earlier.
        assert_eq!(start_of_week(date(2026, 8, 22)), date(2026, 8, 16));
    }

    #[test]
    fn week_days_are_seven_consecutive_dates_from_sunday() {
        let days = week_days(start_of_week(date(2026, 8, 19)));
        assert_eq!(days.len(), 7);
        assert_eq!(days[0].weekday(), Weekday::Sun);
        for pair in days.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::days(1));
        }
    }

    #[test]
    fn week_span_crosses_month_boundaries() {
        // 2026-08-31 is a Monday; its week starts Sunday 2026-08-30
        // and ends Saturday 2026-09-05.
        let days = week_days(start_of_week(date(2026, 8, 31)));
        assert_eq!(days[0], date(2026, 8, 30));
        assert_eq!(days[6], date(2026, 9, 5));
    }

    #[test]
    fn advance_then_retreat_round_trips() {
        let navigator = WeekNavigator::starting_at(date(2026, 8, 19));
        let before = navigator.reference_date();

        navigator.advance_week();
        assert_eq!(navigator.reference_date(), date(2026, 8, 26));

        navigator.retreat_week();
        assert_eq!(navigator.reference_date(), before);
    }

    #[test]
    fn week_recomputes_when_reference_changes() {
        let navigator = WeekNavigator::starting_at(date(2026, 8, 19));
        assert_eq!(navigator.week()[0], date(2026, 8, 16));

        navigator.advance_week();
        assert_eq!(navigator.week()[0], date(2026, 8, 23));

        navigator.set_reference_date(date(2026, 1, 1));
        assert_eq!(navigator.week()[0], date(2025, 12, 28));
    }
}
