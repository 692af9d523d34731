//! Read-only aggregation over stopped timesheet records.
//!
//! The rollups are pure functions over [`StatRecord`]s; [`query`] loads
//! records from the store and feeds them through.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

pub mod daily;
pub mod days;
pub mod monthly;
pub mod query;
pub mod summary;

pub use daily::{DayDetail, DayStat, daily_rollup};
pub use days::split_across_days;
pub use monthly::{MonthStat, YearStat, monthly_rollup};
pub use summary::{ActivitySummary, ProjectSummary, summarize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerRef {
    pub id: Uuid,
    pub name: String,
    pub currency: String,
}

/// A stopped record with its associations resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct StatRecord {
    pub id: Uuid,
    pub begin: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub timezone: Tz,
    pub duration: i64,
    pub rate: f64,
    pub customer: CustomerRef,
    pub project: NamedRef,
    pub activity: NamedRef,
}

impl StatRecord {
    /// Wall-clock span in seconds; the denominator for prorating.
    pub fn elapsed(&self) -> i64 {
        (self.end - self.begin).num_seconds().max(0)
    }
}

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("timesheet {record} references missing {entity} {id}")]
    MissingAssociation {
        record: Uuid,
        entity: &'static str,
        id: Uuid,
    },
    #[error("timesheet {record} has unknown timezone '{timezone}'")]
    InvalidTimezone { record: Uuid, timezone: String },
    #[error("Database error: {0}")]
    Db(#[from] sea_orm::DbErr),
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    pub fn record(
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
        tz: Tz,
        rate: f64,
        customer: u128,
        project: u128,
        activity: u128,
    ) -> StatRecord {
        StatRecord {
            id: Uuid::now_v7(),
            begin,
            end,
            timezone: tz,
            duration: (end - begin).num_seconds(),
            rate,
            customer: CustomerRef {
                id: Uuid::from_u128(customer),
                name: format!("Customer {customer}"),
                currency: "EUR".into(),
            },
            project: NamedRef {
                id: Uuid::from_u128(project),
                name: format!("Project {project}"),
            },
            activity: NamedRef {
                id: Uuid::from_u128(activity),
                name: format!("Activity {activity}"),
            },
        }
    }

    pub fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }
}
