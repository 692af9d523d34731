use std::collections::BTreeMap;

use chrono::Datelike;
use serde::Serialize;

use super::StatRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthStat {
    pub month: u32,
    pub total_duration: i64,
    pub total_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearStat {
    pub year: i32,
    /// Always twelve entries, January first.
    pub months: Vec<MonthStat>,
}

impl YearStat {
    fn empty(year: i32) -> Self {
        Self {
            year,
            months: (1..=12)
                .map(|month| MonthStat {
                    month,
                    total_duration: 0,
                    total_rate: 0.0,
                })
                .collect(),
        }
    }

    pub fn total_duration(&self) -> i64 {
        self.months.iter().map(|m| m.total_duration).sum()
    }

    pub fn total_rate(&self) -> f64 {
        self.months.iter().map(|m| m.total_rate).sum()
    }
}

/// Group by the month a record begins in (in its own timezone), newest year first.
pub fn monthly_rollup(records: &[StatRecord]) -> Vec<YearStat> {
    let mut years: BTreeMap<i32, YearStat> = BTreeMap::new();
    for record in records {
        let local = record.begin.with_timezone(&record.timezone);
        let year = years
            .entry(local.year())
            .or_insert_with(|| YearStat::empty(local.year()));
        let month = &mut year.months[local.month0() as usize];
        month.total_duration += record.duration;
        month.total_rate += record.rate;
    }
    years.into_values().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::fixtures::{record, utc};
    use chrono_tz::Tz;

    #[test]
    fn test_no_records() {
        assert!(monthly_rollup(&[]).is_empty());
    }

    #[test]
    fn test_years_descending_months_zero_filled() {
        let records = [
            record(utc(2025, 11, 3, 9, 0), utc(2025, 11, 3, 10, 0), Tz::UTC, 50.0, 1, 2, 3),
            record(utc(2026, 2, 3, 9, 0), utc(2026, 2, 3, 11, 0), Tz::UTC, 80.0, 1, 2, 3),
            record(utc(2026, 2, 4, 9, 0), utc(2026, 2, 4, 10, 0), Tz::UTC, 40.0, 1, 2, 3),
        ];
        let years = monthly_rollup(&records);

        assert_eq!(years.len(), 2);
        assert_eq!(years[0].year, 2026);
        assert_eq!(years[1].year, 2025);
        assert!(years.iter().all(|y| y.months.len() == 12));
        assert_eq!(years[0].months[1].total_duration, 3 * 3600);
        assert_eq!(years[0].months[1].total_rate, 120.0);
        assert_eq!(years[0].months[0].total_duration, 0);
        assert_eq!(years[1].months[10].total_rate, 50.0);
        assert_eq!(years[1].total_duration(), 3600);
    }

    #[test]
    fn test_month_follows_record_timezone() {
        // 23:30 UTC on Jan 31st is already February in Berlin.
        let r = record(
            utc(2026, 1, 31, 23, 30),
            utc(2026, 2, 1, 0, 30),
            chrono_tz::Europe::Berlin,
            10.0,
            1,
            2,
            3,
        );
        let years = monthly_rollup(&[r]);
        assert_eq!(years[0].months[1].total_rate, 10.0);
        assert_eq!(years[0].months[0].total_rate, 0.0);
    }

    #[test]
    fn test_records_are_not_prorated() {
        let r = record(utc(2025, 12, 31, 22, 0), utc(2026, 1, 1, 2, 0), Tz::UTC, 40.0, 1, 2, 3);
        let years = monthly_rollup(&[r]);
        assert_eq!(years.len(), 1);
        assert_eq!(years[0].year, 2025);
        assert_eq!(years[0].months[11].total_duration, 4 * 3600);
    }
}
