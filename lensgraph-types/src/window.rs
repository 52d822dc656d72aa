use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

pub const DEFAULT_RECENT_DAYS: u32 = 7;

/// Inclusive calendar range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// "Recent" as used by the notification and followed-photo queries.
///
/// Always covers the last `days` days up to and including today. With
/// `include_year_ago` the same span one calendar year earlier is covered
/// too; that half is opt-in until its intent is confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecencyWindow {
    pub days: u32,
    pub include_year_ago: bool,
}

impl Default for RecencyWindow {
    fn default() -> Self {
        Self {
            days: DEFAULT_RECENT_DAYS,
            include_year_ago: false,
        }
    }
}

impl RecencyWindow {
    pub fn last_days(days: u32) -> Self {
        Self {
            days,
            include_year_ago: false,
        }
    }

    pub fn with_year_ago(mut self, include: bool) -> Self {
        self.include_year_ago = include;
        self
    }

    pub fn ranges(&self, today: NaiveDate) -> Vec<DateRange> {
        let mut ranges = vec![Self::span_ending(today, self.days)];

        if self.include_year_ago {
            // Feb 29 clamps to Feb 28
            if let Some(year_ago) = today.checked_sub_months(Months::new(12)) {
                ranges.push(Self::span_ending(year_ago, self.days));
            }
        }

        ranges
    }

    pub fn contains(&self, today: NaiveDate, date: NaiveDate) -> bool {
        self.ranges(today).iter().any(|range| range.contains(date))
    }

    fn span_ending(end: NaiveDate, days: u32) -> DateRange {
        let start = end
            .checked_sub_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MIN);
        DateRange { start, end }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_three_days_ago_is_recent() {
        let today = date(2018, 5, 6);
        let window = RecencyWindow::default();
        assert!(window.contains(today, date(2018, 5, 3)));
    }

    #[test]
    fn test_ten_days_ago_is_not_recent() {
        let today = date(2018, 5, 13);
        let window = RecencyWindow::default();
        assert!(!window.contains(today, date(2018, 5, 3)));
    }

    #[test]
    fn test_window_boundaries_are_inclusive() {
        let today = date(2018, 5, 10);
        let window = RecencyWindow::default();
        assert!(window.contains(today, today));
        assert!(window.contains(today, date(2018, 5, 3)));
        assert!(!window.contains(today, date(2018, 5, 2)));
    }

    #[test]
    fn test_future_dates_are_excluded() {
        let today = date(2018, 5, 1);
        assert!(!RecencyWindow::default().contains(today, date(2018, 5, 2)));
    }

    #[test]
    fn test_window_crosses_month_boundary() {
        let today = date(2018, 5, 2);
        assert!(RecencyWindow::default().contains(today, date(2018, 4, 27)));
    }

    #[test]
    fn test_year_ago_week_is_opt_in() {
        let today = date(2019, 5, 5);
        let last_year = date(2018, 5, 3);

        assert!(!RecencyWindow::default().contains(today, last_year));
        assert!(RecencyWindow::default()
            .with_year_ago(true)
            .contains(today, last_year));
    }

    #[test]
    fn test_year_ago_from_leap_day_clamps() {
        let ranges = RecencyWindow::default()
            .with_year_ago(true)
            .ranges(date(2020, 2, 29));
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[1].end, date(2019, 2, 28));
        assert_eq!(ranges[1].start, date(2019, 2, 21));
    }

    #[test]
    fn test_seventy_day_offset_is_not_special() {
        let today = date(2018, 7, 15);
        let seventy_days_ago = date(2018, 5, 6);
        let window = RecencyWindow::default().with_year_ago(true);
        assert!(!window.contains(today, seventy_days_ago));
    }

    proptest! {
        #[test]
        fn prop_recent_iff_within_days(offset in 0u64..400, days in 0u32..30) {
            let today = date(2018, 5, 15);
            let candidate = today.checked_sub_days(Days::new(offset)).unwrap();
            let window = RecencyWindow::last_days(days);
            prop_assert_eq!(window.contains(today, candidate), offset <= u64::from(days));
        }
    }
}
