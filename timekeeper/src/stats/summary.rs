use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use super::{NamedRef, StatRecord};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivitySummary {
    pub activity: NamedRef,
    pub rate: f64,
    pub duration: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectSummary {
    pub customer: NamedRef,
    pub project: NamedRef,
    pub currency: String,
    pub rate: f64,
    pub duration: i64,
    pub activities: Vec<ActivitySummary>,
}

/// Flat per-(customer, project) totals with per-activity sub-totals.
pub fn summarize(records: &[StatRecord]) -> Vec<ProjectSummary> {
    let mut groups: BTreeMap<(Uuid, Uuid), (ProjectSummary, BTreeMap<Uuid, ActivitySummary>)> =
        BTreeMap::new();

    for record in records {
        let (summary, activities) = groups
            .entry((record.customer.id, record.project.id))
            .or_insert_with(|| {
                (
                    ProjectSummary {
                        customer: NamedRef {
                            id: record.customer.id,
                            name: record.customer.name.clone(),
                        },
                        project: record.project.clone(),
                        currency: record.customer.currency.clone(),
                        rate: 0.0,
                        duration: 0,
                        activities: Vec::new(),
                    },
                    BTreeMap::new(),
                )
            });
        summary.rate += record.rate;
        summary.duration += record.duration;

        let activity = activities
            .entry(record.activity.id)
            .or_insert_with(|| ActivitySummary {
                activity: record.activity.clone(),
                rate: 0.0,
                duration: 0,
            });
        activity.rate += record.rate;
        activity.duration += record.duration;
    }

    groups
        .into_values()
        .map(|(mut summary, activities)| {
            summary.activities = activities.into_values().collect();
            summary
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::fixtures::{record, utc};
    use chrono_tz::Tz;

    #[test]
    fn test_groups_and_subtotals() {
        let records = [
            record(utc(2026, 3, 2, 9, 0), utc(2026, 3, 2, 10, 0), Tz::UTC, 50.0, 1, 20, 300),
            record(utc(2026, 3, 3, 9, 0), utc(2026, 3, 3, 11, 0), Tz::UTC, 100.0, 1, 20, 300),
            record(utc(2026, 3, 3, 12, 0), utc(2026, 3, 3, 12, 30), Tz::UTC, 25.0, 1, 20, 400),
            record(utc(2026, 3, 4, 9, 0), utc(2026, 3, 4, 10, 0), Tz::UTC, 70.0, 2, 10, 300),
        ];
        let summary = summarize(&records);

        assert_eq!(summary.len(), 2);
        let first = &summary[0];
        assert_eq!(first.customer.id, Uuid::from_u128(1));
        assert_eq!(first.currency, "EUR");
        assert_eq!(first.rate, 175.0);
        assert_eq!(first.duration, 3 * 3600 + 1800);
        assert_eq!(first.activities.len(), 2);
        assert_eq!(first.activities[0].activity.id, Uuid::from_u128(300));
        assert_eq!(first.activities[0].rate, 150.0);
        assert_eq!(first.activities[1].duration, 1800);

        assert_eq!(summary[1].project.id, Uuid::from_u128(10));
        assert_eq!(summary[1].rate, 70.0);
    }

    #[test]
    fn test_empty() {
        assert!(summarize(&[]).is_empty());
    }
}
