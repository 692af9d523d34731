use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, IntoActiveModel, Set};
use tracing::debug;
use uuid::Uuid;

use super::{StoreError, non_empty, users};
use crate::entity::{activity, project, timesheet, user_preference};
use crate::rates::{RateSources, billed_rate};
use crate::rounding;
use crate::validation::{Validate, Violations};

/// Derived-field behaviour applied when a record is written.
///
/// The live path rounds timestamps and fills in rates from the project,
/// activity and user; the importer turns both off so that imported numbers
/// are stored untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimesheetLifecycle {
    pub recalculate_rates: bool,
    /// Floor begin, end and duration to this many minutes; `0` disables.
    pub rounding_minutes: i64,
}

impl Default for TimesheetLifecycle {
    fn default() -> Self {
        Self {
            recalculate_rates: true,
            rounding_minutes: 0,
        }
    }
}

impl TimesheetLifecycle {
    pub fn disabled() -> Self {
        Self {
            recalculate_rates: false,
            rounding_minutes: 0,
        }
    }

    fn is_disabled(&self) -> bool {
        !self.recalculate_rates && self.rounding_minutes <= 0
    }

    fn round(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        if self.rounding_minutes <= 0 {
            return at;
        }
        let secs = rounding::floor(at.timestamp(), self.rounding_minutes);
        DateTime::from_timestamp(secs, 0).unwrap_or(at)
    }
}

#[derive(Debug, Clone)]
pub struct NewTimesheet {
    pub user_id: Uuid,
    pub project_id: Uuid,
    pub activity_id: Uuid,
    /// Project the activity is scoped to; `None` for global activities.
    pub activity_project_id: Option<Uuid>,
    pub begin: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub timezone: String,
    pub duration: i64,
    pub rate: f64,
    pub fixed_rate: Option<f64>,
    pub hourly_rate: Option<f64>,
    pub exported: bool,
    pub description: Option<String>,
}

impl NewTimesheet {
    pub fn new(
        user_id: Uuid,
        project_id: Uuid,
        activity: &activity::Model,
        begin: DateTime<Utc>,
        timezone: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            project_id,
            activity_id: activity.id,
            activity_project_id: activity.project_id,
            begin,
            end: None,
            timezone: timezone.into(),
            duration: 0,
            rate: 0.0,
            fixed_rate: None,
            hourly_rate: None,
            exported: false,
            description: None,
        }
    }

    async fn insert<C: ConnectionTrait>(self, conn: &C) -> Result<timesheet::Model, StoreError> {
        self.validate().map_err(|violations| StoreError::Invalid {
            entity: "timesheet",
            name: self.begin.to_rfc3339(),
            violations,
        })?;

        let model = timesheet::ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(self.user_id),
            project_id: Set(self.project_id),
            activity_id: Set(self.activity_id),
            begin: Set(self.begin.naive_utc()),
            end: Set(self.end.map(|e| e.naive_utc())),
            timezone: Set(self.timezone),
            duration: Set(self.duration),
            rate: Set(self.rate),
            fixed_rate: Set(self.fixed_rate),
            hourly_rate: Set(self.hourly_rate),
            exported: Set(self.exported),
            description: Set(non_empty(self.description)),
        }
        .insert(conn)
        .await?;
        Ok(model)
    }
}

impl Validate for NewTimesheet {
    fn validate(&self) -> Result<(), Violations> {
        let mut v = Violations::new();
        v.timezone("timezone", &self.timezone)
            .non_negative("fixed_rate", self.fixed_rate)
            .non_negative("hourly_rate", self.hourly_rate);

        if let Some(scope) = self.activity_project_id
            && scope != self.project_id
        {
            v.add("activity", "activity belongs to a different project");
        }
        if let Some(end) = self.end
            && end < self.begin
        {
            v.add("end", "must not be before begin");
        }
        if self.duration < 0 {
            v.add("duration", format!("must not be negative, got {}", self.duration));
        }
        v.into_result()
    }
}

/// Validate and insert a record, applying the lifecycle's rounding and rate rules.
pub async fn record<C: ConnectionTrait>(
    conn: &C,
    mut draft: NewTimesheet,
    lifecycle: &TimesheetLifecycle,
) -> Result<timesheet::Model, StoreError> {
    if lifecycle.is_disabled() {
        return draft.insert(conn).await;
    }

    draft.begin = lifecycle.round(draft.begin);
    draft.end = draft.end.map(|end| lifecycle.round(end));
    if let Some(end) = draft.end {
        draft.duration = rounding::floor((end - draft.begin).num_seconds(), lifecycle.rounding_minutes);
    }

    if lifecycle.recalculate_rates {
        if draft.fixed_rate.is_none() && draft.hourly_rate.is_none() {
            let sources =
                resolve_sources(conn, draft.user_id, draft.project_id, draft.activity_id).await?;
            (draft.fixed_rate, draft.hourly_rate) = sources.resolve();
        }
        draft.rate = billed_rate(draft.fixed_rate, draft.hourly_rate, draft.duration);
    }

    debug!(
        user = %draft.user_id,
        duration = draft.duration,
        rate = draft.rate,
        "Recording timesheet"
    );
    draft.insert(conn).await
}

/// Close a running record at `at`.
pub async fn stop<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    at: DateTime<Utc>,
    lifecycle: &TimesheetLifecycle,
) -> Result<timesheet::Model, StoreError> {
    let existing = timesheet::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or(StoreError::NotFound {
            entity: "timesheet",
            id,
        })?;
    if existing.end.is_some() {
        return Err(StoreError::AlreadyStopped(id));
    }

    let begin = existing.begin.and_utc();
    let end = lifecycle.round(at);
    if end < begin {
        let mut violations = Violations::new();
        violations.add("end", "must not be before begin");
        return Err(StoreError::Invalid {
            entity: "timesheet",
            name: id.to_string(),
            violations,
        });
    }

    let duration = rounding::floor((end - begin).num_seconds(), lifecycle.rounding_minutes);
    let (mut fixed, mut hourly) = (existing.fixed_rate, existing.hourly_rate);
    if lifecycle.recalculate_rates && fixed.is_none() && hourly.is_none() {
        let sources =
            resolve_sources(conn, existing.user_id, existing.project_id, existing.activity_id)
                .await?;
        (fixed, hourly) = sources.resolve();
    }

    let mut active = existing.into_active_model();
    active.end = Set(Some(end.naive_utc()));
    active.duration = Set(duration);
    active.fixed_rate = Set(fixed);
    active.hourly_rate = Set(hourly);
    active.rate = Set(billed_rate(fixed, hourly, duration));
    Ok(active.update(conn).await?)
}

/// Collect the rate overrides of the activity, the project and the user.
pub async fn resolve_sources<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    project_id: Uuid,
    activity_id: Uuid,
) -> Result<RateSources, StoreError> {
    let activity = activity::Entity::find_by_id(activity_id).one(conn).await?;
    let project = project::Entity::find_by_id(project_id).one(conn).await?;
    let user_hourly = users::preference(conn, user_id, user_preference::HOURLY_RATE)
        .await?
        .and_then(|p| p.as_f64());

    Ok(RateSources {
        activity_fixed: activity.as_ref().and_then(|a| a.fixed_rate),
        activity_hourly: activity.as_ref().and_then(|a| a.hourly_rate),
        project_fixed: project.as_ref().and_then(|p| p.fixed_rate),
        project_hourly: project.as_ref().and_then(|p| p.hourly_rate),
        user_hourly,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::user::Role;
    use crate::store::activities::NewActivity;
    use crate::store::customers::NewCustomer;
    use crate::store::projects::NewProject;
    use crate::store::users::NewUser;
    use chrono::TimeZone;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{Database, DatabaseConnection};

    struct Fixture {
        db: DatabaseConnection,
        user: Uuid,
        project: project::Model,
        other_project: project::Model,
        activity: activity::Model,
    }

    async fn setup() -> Fixture {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let user = NewUser::new("alice", "$argon2id$stub".into(), Role::User)
            .preference(user_preference::HOURLY_RATE, "40")
            .insert(&db)
            .await
            .unwrap();
        let customer = NewCustomer {
            name: "Acme".into(),
            country: "DE".into(),
            currency: "EUR".into(),
            timezone: "Europe/Berlin".into(),
            visible: true,
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
        let mut project = NewProject::new(customer.id, "Website");
        project.hourly_rate = Some(60.0);
        let project = project.insert(&db).await.unwrap();
        let other_project = NewProject::new(customer.id, "Intranet")
            .insert(&db)
            .await
            .unwrap();
        let activity = NewActivity::new(None, "Development")
            .insert(&db)
            .await
            .unwrap();

        Fixture {
            db,
            user: user.id,
            project,
            other_project,
            activity,
        }
    }

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, m, s).unwrap()
    }

    #[tokio::test]
    async fn test_record_resolves_project_hourly_rate() {
        let f = setup().await;
        let mut draft = NewTimesheet::new(f.user, f.project.id, &f.activity, at(9, 0, 0), "UTC");
        draft.end = Some(at(10, 30, 0));

        let ts = record(&f.db, draft, &TimesheetLifecycle::default()).await.unwrap();
        assert_eq!(ts.duration, 5400);
        assert_eq!(ts.hourly_rate, Some(60.0));
        assert_eq!(ts.rate, 90.0);
    }

    #[tokio::test]
    async fn test_record_falls_back_to_user_hourly_rate() {
        let f = setup().await;
        let mut draft =
            NewTimesheet::new(f.user, f.other_project.id, &f.activity, at(9, 0, 0), "UTC");
        draft.end = Some(at(11, 0, 0));

        let ts = record(&f.db, draft, &TimesheetLifecycle::default()).await.unwrap();
        assert_eq!(ts.hourly_rate, Some(40.0));
        assert_eq!(ts.rate, 80.0);
    }

    #[tokio::test]
    async fn test_record_with_rounding() {
        let f = setup().await;
        let mut draft = NewTimesheet::new(f.user, f.project.id, &f.activity, at(9, 7, 12), "UTC");
        draft.end = Some(at(10, 14, 59));
        let lifecycle = TimesheetLifecycle {
            recalculate_rates: true,
            rounding_minutes: 15,
        };

        let ts = record(&f.db, draft, &lifecycle).await.unwrap();
        assert_eq!(ts.begin, at(9, 0, 0).naive_utc());
        assert_eq!(ts.end, Some(at(10, 0, 0).naive_utc()));
        assert_eq!(ts.duration, 3600);
        assert_eq!(ts.rate, 60.0);
    }

    #[tokio::test]
    async fn test_disabled_lifecycle_stores_values_untouched() {
        let f = setup().await;
        let mut draft = NewTimesheet::new(f.user, f.project.id, &f.activity, at(9, 7, 12), "UTC");
        draft.end = Some(at(10, 7, 12));
        draft.duration = 3600;
        draft.rate = 12.5;

        let ts = record(&f.db, draft, &TimesheetLifecycle::disabled()).await.unwrap();
        assert_eq!(ts.begin, at(9, 7, 12).naive_utc());
        assert_eq!(ts.rate, 12.5);
        assert_eq!(ts.hourly_rate, None);
    }

    #[tokio::test]
    async fn test_activity_of_other_project_is_rejected() {
        let f = setup().await;
        let scoped = NewActivity::new(Some(f.other_project.id), "Design")
            .insert(&f.db)
            .await
            .unwrap();
        let draft = NewTimesheet::new(f.user, f.project.id, &scoped, at(9, 0, 0), "UTC");

        let err = record(&f.db, draft, &TimesheetLifecycle::default())
            .await
            .unwrap_err();
        match err {
            StoreError::Invalid { violations, .. } => assert!(violations.has_field("activity")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stop_running_record() {
        let f = setup().await;
        let draft = NewTimesheet::new(f.user, f.project.id, &f.activity, at(9, 0, 0), "UTC");
        let running = record(&f.db, draft, &TimesheetLifecycle::default()).await.unwrap();
        assert!(running.is_running());
        assert_eq!(running.rate, 0.0);

        let stopped = stop(&f.db, running.id, at(11, 0, 0), &TimesheetLifecycle::default())
            .await
            .unwrap();
        assert_eq!(stopped.duration, 7200);
        assert_eq!(stopped.rate, 120.0);

        let err = stop(&f.db, running.id, at(12, 0, 0), &TimesheetLifecycle::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyStopped(id) if id == running.id));
    }

    #[tokio::test]
    async fn test_stop_before_begin_is_invalid() {
        let f = setup().await;
        let draft = NewTimesheet::new(f.user, f.project.id, &f.activity, at(9, 0, 0), "UTC");
        let running = record(&f.db, draft, &TimesheetLifecycle::default()).await.unwrap();

        let err = stop(&f.db, running.id, at(8, 0, 0), &TimesheetLifecycle::default())
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_stop_unknown_record() {
        let f = setup().await;
        let err = stop(&f.db, Uuid::now_v7(), at(8, 0, 0), &TimesheetLifecycle::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
