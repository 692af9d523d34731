//! Store-backed statistics.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use chrono_tz::Tz;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::Serialize;
use uuid::Uuid;

use super::days::local_midnight;
use super::{
    CustomerRef, DayStat, NamedRef, ProjectSummary, StatRecord, StatsError, YearStat,
    daily_rollup, monthly_rollup, summarize,
};
use crate::entity::{activity, customer, project, timesheet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsFilter {
    pub user: Option<Uuid>,
    pub begin: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStatistics {
    pub records_total: u64,
    pub duration_total: i64,
    pub rate_total: f64,
    pub duration_this_month: i64,
    pub rate_this_month: f64,
    pub first_entry: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectStatistics {
    pub record_count: u64,
    pub duration: i64,
    pub rate: f64,
    pub activity_count: u64,
}

/// Per-day breakdown of one user's records between two local dates (inclusive).
pub async fn daily_stats<C: ConnectionTrait>(
    conn: &C,
    user: Uuid,
    begin: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<DayStat>, StatsError> {
    // Records are split in their own timezone, so widen the UTC window by a
    // day on both sides and let the rollup drop what falls outside.
    let from = begin
        .checked_sub_days(Days::new(1))
        .unwrap_or(begin)
        .and_hms_opt(0, 0, 0)
        .map(|d| d.and_utc());
    let to = end
        .checked_add_days(Days::new(2))
        .unwrap_or(end)
        .and_hms_opt(0, 0, 0)
        .map(|d| d.and_utc());

    let mut condition = Condition::all()
        .add(timesheet::Column::UserId.eq(user))
        .add(timesheet::Column::End.is_not_null());
    if let Some(from) = from {
        condition = condition.add(timesheet::Column::End.gt(from.naive_utc()));
    }
    if let Some(to) = to {
        condition = condition.add(timesheet::Column::Begin.lt(to.naive_utc()));
    }

    let records = load(conn, condition).await?;
    Ok(daily_rollup(&records, begin, end))
}

/// Yearly/monthly totals of records strictly inside `(begin, end)`.
pub async fn monthly_stats<C: ConnectionTrait>(
    conn: &C,
    filter: StatsFilter,
) -> Result<Vec<YearStat>, StatsError> {
    let mut condition = Condition::all().add(timesheet::Column::End.is_not_null());
    if let Some(user) = filter.user {
        condition = condition.add(timesheet::Column::UserId.eq(user));
    }
    if let Some(begin) = filter.begin {
        condition = condition.add(timesheet::Column::Begin.gt(begin.naive_utc()));
    }
    if let Some(end) = filter.end {
        condition = condition.add(timesheet::Column::End.lt(end.naive_utc()));
    }
    let records = load(conn, condition).await?;
    Ok(monthly_rollup(&records))
}

/// Per-project summary of records inside `[begin, end]`.
pub async fn summary<C: ConnectionTrait>(
    conn: &C,
    filter: StatsFilter,
) -> Result<Vec<ProjectSummary>, StatsError> {
    let mut condition = Condition::all().add(timesheet::Column::End.is_not_null());
    if let Some(user) = filter.user {
        condition = condition.add(timesheet::Column::UserId.eq(user));
    }
    if let Some(begin) = filter.begin {
        condition = condition.add(timesheet::Column::Begin.gte(begin.naive_utc()));
    }
    if let Some(end) = filter.end {
        condition = condition.add(timesheet::Column::End.lte(end.naive_utc()));
    }
    let records = load(conn, condition).await?;
    Ok(summarize(&records))
}

/// Lifetime and current-month totals of a user. `today` and the month
/// boundaries are taken in `tz`.
pub async fn user_statistics<C: ConnectionTrait>(
    conn: &C,
    user: Uuid,
    today: NaiveDate,
    tz: Tz,
) -> Result<UserStatistics, StatsError> {
    let records = timesheet::Entity::find()
        .filter(timesheet::Column::UserId.eq(user))
        .order_by_asc(timesheet::Column::Begin)
        .all(conn)
        .await?;

    let month_start = today.with_day(1).and_then(|d| local_midnight(d, tz));
    let month_end = today
        .with_day(1)
        .and_then(|d| d.checked_add_months(chrono::Months::new(1)))
        .and_then(|d| local_midnight(d, tz));
    let in_month = |begin: DateTime<Utc>| match (month_start, month_end) {
        (Some(start), Some(end)) => begin >= start && begin < end,
        _ => false,
    };

    let mut stats = UserStatistics {
        records_total: records.len() as u64,
        duration_total: 0,
        rate_total: 0.0,
        duration_this_month: 0,
        rate_this_month: 0.0,
        first_entry: records.first().map(|r| r.begin.and_utc()),
    };
    for record in &records {
        stats.duration_total += record.duration;
        stats.rate_total += record.rate;
        if in_month(record.begin.and_utc()) {
            stats.duration_this_month += record.duration;
            stats.rate_this_month += record.rate;
        }
    }
    Ok(stats)
}

pub async fn project_statistics<C: ConnectionTrait>(
    conn: &C,
    project: Uuid,
) -> Result<ProjectStatistics, StatsError> {
    let records = timesheet::Entity::find()
        .filter(timesheet::Column::ProjectId.eq(project))
        .all(conn)
        .await?;
    let activity_count = activity::Entity::find()
        .filter(activity::Column::ProjectId.eq(project))
        .count(conn)
        .await?;

    Ok(ProjectStatistics {
        record_count: records.len() as u64,
        duration: records.iter().map(|r| r.duration).sum(),
        rate: records.iter().map(|r| r.rate).sum(),
        activity_count,
    })
}

/// Load stopped records matching `condition` with their project, customer
/// and activity.
async fn load<C: ConnectionTrait>(
    conn: &C,
    condition: Condition,
) -> Result<Vec<StatRecord>, StatsError> {
    let rows = timesheet::Entity::find()
        .filter(condition)
        .order_by_asc(timesheet::Column::Begin)
        .all(conn)
        .await?;
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let project_ids: HashSet<Uuid> = rows.iter().map(|r| r.project_id).collect();
    let activity_ids: HashSet<Uuid> = rows.iter().map(|r| r.activity_id).collect();

    let projects: HashMap<Uuid, project::Model> = project::Entity::find()
        .filter(project::Column::Id.is_in(project_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();
    let customer_ids: HashSet<Uuid> = projects.values().map(|p| p.customer_id).collect();
    let customers: HashMap<Uuid, customer::Model> = customer::Entity::find()
        .filter(customer::Column::Id.is_in(customer_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();
    let activities: HashMap<Uuid, activity::Model> = activity::Entity::find()
        .filter(activity::Column::Id.is_in(activity_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|a| (a.id, a))
        .collect();

    rows.into_iter()
        .filter_map(|row| row.end.map(|end| (end, row)))
        .map(|(end, row)| {
            let missing = |entity: &'static str, id: Uuid| StatsError::MissingAssociation {
                record: row.id,
                entity,
                id,
            };
            let project = projects
                .get(&row.project_id)
                .ok_or_else(|| missing("project", row.project_id))?;
            let customer = customers
                .get(&project.customer_id)
                .ok_or_else(|| missing("customer", project.customer_id))?;
            let activity = activities
                .get(&row.activity_id)
                .ok_or_else(|| missing("activity", row.activity_id))?;
            let timezone = Tz::from_str(&row.timezone).map_err(|_| StatsError::InvalidTimezone {
                record: row.id,
                timezone: row.timezone.clone(),
            })?;

            Ok(StatRecord {
                id: row.id,
                begin: row.begin.and_utc(),
                end: end.and_utc(),
                timezone,
                duration: row.duration,
                rate: row.rate,
                customer: CustomerRef {
                    id: customer.id,
                    name: customer.name.clone(),
                    currency: customer.currency.clone(),
                },
                project: NamedRef {
                    id: project.id,
                    name: project.name.clone(),
                },
                activity: NamedRef {
                    id: activity.id,
                    name: activity.name.clone(),
                },
            })
        })
        .collect()
}
