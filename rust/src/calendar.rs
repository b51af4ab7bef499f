//! Mapping between month indices and calendar months.
//!
//! Scheduling math only ever sees integer month indices; this is for display.

use chrono::{Datelike, Months, NaiveDate};

/// Calendar anchored at the first day of the plan's month 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlanCalendar {
    origin: NaiveDate,
}

impl PlanCalendar {
    /// Anchor at the month containing `date`.
    pub fn starting(date: NaiveDate) -> Self {
        Self {
            origin: first_of_month(date),
        }
    }

    pub fn origin(&self) -> NaiveDate {
        self.origin
    }

    /// First day of month `index`. `None` when outside chrono's date range.
    pub fn month_start(&self, index: i64) -> Option<NaiveDate> {
        let magnitude = u32::try_from(index.unsigned_abs()).ok()?;
        if index >= 0 {
            self.origin.checked_add_months(Months::new(magnitude))
        } else {
            self.origin.checked_sub_months(Months::new(magnitude))
        }
    }

    /// Month index containing `date` (negative before the origin).
    pub fn month_index(&self, date: NaiveDate) -> i64 {
        months_between(self.origin, date)
    }

    /// Fractional position of `today` on the month axis: the month index plus
    /// the elapsed share of that month.
    pub fn today_marker(&self, today: NaiveDate) -> f64 {
        let index = self.month_index(today);
        let days = days_in_month(today) as f64;
        index as f64 + (today.day0() as f64) / days
    }

    /// Short label such as `"Mar 2027"`.
    pub fn month_label(&self, index: i64) -> String {
        self.month_start(index)
            .map(|date| date.format("%b %Y").to_string())
            .unwrap_or_default()
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to.year() as i64 - from.year() as i64) * 12 + (to.month() as i64 - from.month() as i64)
}

fn days_in_month(date: NaiveDate) -> u32 {
    let first = first_of_month(date);
    match first.checked_add_months(Months::new(1)) {
        Some(next) => (next - first).num_days() as u32,
        None => 31,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_anchor_is_first_of_month() {
        let calendar = PlanCalendar::starting(date(2026, 10, 18));
        assert_eq!(calendar.origin(), date(2026, 10, 1));
    }

    #[test]
    fn test_month_start_crosses_years() {
        let calendar = PlanCalendar::starting(date(2026, 10, 1));
        assert_eq!(calendar.month_start(0), Some(date(2026, 10, 1)));
        assert_eq!(calendar.month_start(3), Some(date(2027, 1, 1)));
        assert_eq!(calendar.month_start(-10), Some(date(2025, 12, 1)));
    }

    #[test]
    fn test_month_index() {
        let calendar = PlanCalendar::starting(date(2026, 10, 1));
        assert_eq!(calendar.month_index(date(2026, 10, 31)), 0);
        assert_eq!(calendar.month_index(date(2027, 2, 14)), 4);
        assert_eq!(calendar.month_index(date(2026, 9, 30)), -1);
    }

    #[test]
    fn test_today_marker_is_fractional() {
        let calendar = PlanCalendar::starting(date(2027, 1, 1));
        // Feb 2027 has 28 days; the 15th is 14/28 through it
        assert_eq!(calendar.today_marker(date(2027, 2, 15)), 1.5);
        assert_eq!(calendar.today_marker(date(2027, 1, 1)), 0.0);
    }

    #[test]
    fn test_month_label() {
        let calendar = PlanCalendar::starting(date(2027, 1, 1));
        assert_eq!(calendar.month_label(2), "Mar 2027");
    }

    #[test]
    fn test_mid_month_start_and_out_of_range() {
        let calendar = PlanCalendar::starting(date(2026, 10, 18));
        assert_eq!(calendar.month_start(1), Some(date(2026, 11, 1)));
        assert_eq!(calendar.today_marker(date(2026, 10, 1)), 0.0);
        assert_eq!(calendar.month_start(i64::MAX), None);
        assert_eq!(calendar.month_label(i64::MIN), "");
    }
}
