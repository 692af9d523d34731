use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use super::days::split_across_days;
use super::{NamedRef, StatRecord};

/// Per `(customer, project)` share of one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayDetail {
    pub customer_id: Uuid,
    pub project: NamedRef,
    /// First activity seen for this project on this day.
    pub activity: NamedRef,
    pub duration: i64,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayStat {
    pub date: NaiveDate,
    pub total_duration: i64,
    pub total_rate: f64,
    pub details: Vec<DayDetail>,
}

impl DayStat {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            total_duration: 0,
            total_rate: 0.0,
            details: Vec::new(),
        }
    }
}

/// One entry per day of `[begin, end]`, zero-filled.
///
/// Records spanning midnight are split in their own timezone; each slice
/// carries `rate × slice / elapsed` of the record's billed amount. Slices
/// outside the range are dropped.
pub fn daily_rollup(records: &[StatRecord], begin: NaiveDate, end: NaiveDate) -> Vec<DayStat> {
    let mut days: BTreeMap<NaiveDate, DayStat> = begin
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|d| (d, DayStat::empty(d)))
        .collect();
    let mut detail_index: HashMap<(NaiveDate, Uuid, Uuid), usize> = HashMap::new();

    let mut ordered: Vec<&StatRecord> = records.iter().collect();
    ordered.sort_by_key(|r| (r.begin, r.id));

    for record in ordered {
        let elapsed = record.elapsed();
        for (date, overlap) in split_across_days(record.begin, record.end, record.timezone) {
            let Some(day) = days.get_mut(&date) else {
                continue;
            };
            let rate = if elapsed > 0 {
                record.rate * overlap as f64 / elapsed as f64
            } else {
                0.0
            };
            day.total_duration += overlap;
            day.total_rate += rate;

            let key = (date, record.customer.id, record.project.id);
            match detail_index.get(&key) {
                Some(&i) => {
                    let detail = &mut day.details[i];
                    detail.duration += overlap;
                    detail.rate += rate;
                }
                None => {
                    detail_index.insert(key, day.details.len());
                    day.details.push(DayDetail {
                        customer_id: record.customer.id,
                        project: record.project.clone(),
                        activity: record.activity.clone(),
                        duration: overlap,
                        rate,
                    });
                }
            }
        }
    }

    days.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::fixtures::{record, utc};
    use chrono_tz::Tz;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_empty_range_is_zero_filled() {
        let days = daily_rollup(&[], date(2026, 2, 25), date(2026, 3, 3));
        assert_eq!(days.len(), 7);
        assert_eq!(days[0].date, date(2026, 2, 25));
        assert_eq!(days[6].date, date(2026, 3, 3));
        assert!(days.iter().all(|d| d.total_duration == 0 && d.details.is_empty()));
    }

    #[test]
    fn test_inverted_range_is_empty() {
        assert!(daily_rollup(&[], date(2026, 3, 3), date(2026, 3, 1)).is_empty());
    }

    #[test]
    fn test_cross_midnight_record_is_prorated() {
        let r = record(utc(2026, 3, 2, 22, 0), utc(2026, 3, 3, 2, 0), Tz::UTC, 100.0, 1, 2, 3);
        let days = daily_rollup(&[r], date(2026, 3, 1), date(2026, 3, 4));

        assert_eq!(days.len(), 4);
        assert_eq!(days[1].total_duration, 7200);
        assert_eq!(days[1].total_rate, 50.0);
        assert_eq!(days[2].total_duration, 7200);
        assert_eq!(days[2].total_rate, 50.0);
        assert_eq!(days[2].details.len(), 1);
        assert_eq!(days[2].details[0].duration, 7200);
    }

    #[test]
    fn test_conservation_over_long_record() {
        let r = record(utc(2026, 3, 1, 8, 15), utc(2026, 3, 4, 19, 45), Tz::UTC, 333.0, 1, 2, 3);
        let days = daily_rollup(std::slice::from_ref(&r), date(2026, 2, 28), date(2026, 3, 5));

        let duration: i64 = days.iter().map(|d| d.total_duration).sum();
        let rate: f64 = days.iter().map(|d| d.total_rate).sum();
        assert_eq!(duration, r.duration);
        assert!((rate - r.rate).abs() < 1e-9);
    }

    #[test]
    fn test_slices_outside_range_are_dropped() {
        let r = record(utc(2026, 3, 2, 22, 0), utc(2026, 3, 3, 2, 0), Tz::UTC, 100.0, 1, 2, 3);
        let days = daily_rollup(&[r], date(2026, 3, 3), date(2026, 3, 3));
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].total_duration, 7200);
        assert_eq!(days[0].total_rate, 50.0);
    }

    #[test]
    fn test_details_group_by_customer_and_project() {
        let records = [
            record(utc(2026, 3, 2, 9, 0), utc(2026, 3, 2, 10, 0), Tz::UTC, 50.0, 1, 2, 3),
            record(utc(2026, 3, 2, 11, 0), utc(2026, 3, 2, 12, 0), Tz::UTC, 50.0, 1, 2, 4),
            record(utc(2026, 3, 2, 13, 0), utc(2026, 3, 2, 13, 30), Tz::UTC, 10.0, 1, 5, 3),
        ];
        let days = daily_rollup(&records, date(2026, 3, 2), date(2026, 3, 2));
        let day = &days[0];

        assert_eq!(day.total_duration, 9000);
        assert_eq!(day.total_rate, 110.0);
        assert_eq!(day.details.len(), 2);
        assert_eq!(day.details[0].duration, 7200);
        assert_eq!(day.details[0].rate, 100.0);
        assert_eq!(day.details[0].activity.id, Uuid::from_u128(3));
        assert_eq!(day.details[1].project.id, Uuid::from_u128(5));
    }

    #[test]
    fn test_zero_length_record_counts_nothing() {
        let at = utc(2026, 3, 2, 9, 0);
        let r = record(at, at, Tz::UTC, 75.0, 1, 2, 3);
        let days = daily_rollup(&[r], date(2026, 3, 2), date(2026, 3, 2));
        assert_eq!(days[0].total_duration, 0);
        assert_eq!(days[0].total_rate, 0.0);
        assert_eq!(days[0].details.len(), 1);
    }
}
