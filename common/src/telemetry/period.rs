//! Period filtering of reading tables.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::telemetry::clock::Clock;
use crate::telemetry::ReadingTable;

/// The filtering mode chosen in the sidebar, with its optional explicit
/// date or month.
///
/// `Daily(None)` and `Monthly(None)` mean "live today": they resolve
/// against the clock at evaluation time, so the same selector can match
/// different rows once a calendar-day boundary passes. Resolution is the
/// only clock-dependent step; the filter itself is pure.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PeriodSelector {
    #[default]
    All,
    Daily(Option<NaiveDate>),
    Monthly(Option<(i32, u32)>),
}

impl PeriodSelector {
    /// Fills the "live today" defaults from `clock`.
    pub fn resolve(&self, clock: &dyn Clock) -> ResolvedPeriod {
        match *self {
            PeriodSelector::All => ResolvedPeriod::All,
            PeriodSelector::Daily(date) => {
                ResolvedPeriod::Day(date.unwrap_or_else(|| clock.today()))
            }
            PeriodSelector::Monthly(month) => {
                let (year, month) = month.unwrap_or_else(|| {
                    let today = clock.today();
                    (today.year(), today.month())
                });
                ResolvedPeriod::Month { year, month }
            }
        }
    }
}

/// A period selector with its defaults filled in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolvedPeriod {
    All,
    Day(NaiveDate),
    Month { year: i32, month: u32 },
}

impl ResolvedPeriod {
    fn matches(&self, date: NaiveDate) -> bool {
        match *self {
            ResolvedPeriod::All => true,
            ResolvedPeriod::Day(day) => date == day,
            ResolvedPeriod::Month { year, month } => date.year() == year && date.month() == month,
        }
    }
}

impl ReadingTable {
    /// The rows whose timestamp falls inside `period`, in source order.
    ///
    /// `All` is the identity. `Day` compares calendar dates only, `Month`
    /// compares year and month only.
    pub fn filter_period(&self, period: &ResolvedPeriod) -> ReadingTable {
        self.iter()
            .filter(|reading| period.matches(reading.timestamp.date()))
            .cloned()
            .collect::<Vec<_>>()
            .into()
    }
}

/// The trailing `count` calendar months ending with the month of `today`,
/// ascending. Backs the month picker, which offers the trailing six months.
pub fn recent_months(today: NaiveDate, count: u32) -> Vec<(i32, u32)> {
    let mut months = Vec::new();
    let mut year = today.year();
    let mut month = today.month();

    for _ in 0..count {
        months.push((year, month));
        if month == 1 {
            year -= 1;
            month = 12;
        } else {
            month -= 1;
        }
    }

    months.reverse();
    months
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::clock::FixedClock;
    use crate::telemetry::Reading;
    use chrono::NaiveDateTime;

    fn reading(timestamp: &str) -> Reading {
        Reading {
            timestamp: NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S").unwrap(),
            conductivity: 100.0,
            turbidity: 1.0,
            temperature: 20.0,
            latitude: None,
            longitude: None,
        }
    }

    fn sample_table() -> ReadingTable {
        ReadingTable::from(vec![
            reading("2024-01-01 08:00:00"),
            reading("2024-01-02 09:30:00"),
            reading("2024-02-01 10:00:00"),
        ])
    }

    fn day(text: &str) -> NaiveDate {
        text.parse().unwrap()
    }

    #[test]
    fn all_is_the_identity() {
        let table = sample_table();
        assert_eq!(table.filter_period(&ResolvedPeriod::All), table);
    }

    #[test]
    fn daily_keeps_exactly_the_matching_date() {
        let filtered = sample_table().filter_period(&ResolvedPeriod::Day(day("2024-01-01")));

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.rows()[0].timestamp.date(), day("2024-01-01"));
    }

    #[test]
    fn daily_ignores_time_of_day() {
        let table = ReadingTable::from(vec![
            reading("2024-01-01 00:00:00"),
            reading("2024-01-01 23:59:59"),
        ]);
        let filtered = table.filter_period(&ResolvedPeriod::Day(day("2024-01-01")));

        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn monthly_keeps_matching_months_in_source_order() {
        let filtered = sample_table().filter_period(&ResolvedPeriod::Month {
            year: 2024,
            month: 1,
        });

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered.rows()[0].timestamp.date(), day("2024-01-01"));
        assert_eq!(filtered.rows()[1].timestamp.date(), day("2024-01-02"));
    }

    #[test]
    fn filtering_is_idempotent() {
        let period = ResolvedPeriod::Month {
            year: 2024,
            month: 1,
        };
        let once = sample_table().filter_period(&period);
        let twice = once.filter_period(&period);

        assert_eq!(once, twice);
    }

    #[test]
    fn unresolved_daily_defaults_to_the_clock_date() {
        let clock = FixedClock(day("2024-01-02").and_hms_opt(12, 0, 0).unwrap());

        let period = PeriodSelector::Daily(None).resolve(&clock);
        assert_eq!(period, ResolvedPeriod::Day(day("2024-01-02")));

        let filtered = sample_table().filter_period(&period);
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn unresolved_monthly_defaults_to_the_clock_month() {
        let clock = FixedClock(day("2024-02-15").and_hms_opt(12, 0, 0).unwrap());

        assert_eq!(
            PeriodSelector::Monthly(None).resolve(&clock),
            ResolvedPeriod::Month {
                year: 2024,
                month: 2,
            }
        );
    }

    #[test]
    fn explicit_date_wins_over_the_clock() {
        let clock = FixedClock(day("2024-02-15").and_hms_opt(12, 0, 0).unwrap());

        assert_eq!(
            PeriodSelector::Daily(Some(day("2024-01-01"))).resolve(&clock),
            ResolvedPeriod::Day(day("2024-01-01"))
        );
    }

    #[test]
    fn recent_months_spans_a_year_boundary() {
        let months = recent_months(day("2024-02-15"), 6);

        assert_eq!(
            months,
            vec![
                (2023, 9),
                (2023, 10),
                (2023, 11),
                (2023, 12),
                (2024, 1),
                (2024, 2),
            ]
        );
    }
}
