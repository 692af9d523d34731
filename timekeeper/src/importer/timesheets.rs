use chrono::DateTime;
use sea_orm::{DatabaseTransaction, TransactionTrait};
use tracing::{debug, warn};
use uuid::Uuid;

use super::activities::{self, Scope};
use super::context::{ActivityRef, ImportContext, UserRef};
use super::{ImportCause, PhaseInput, RunReport};
use crate::auth::hash_password;
use crate::entity::user::Role;
use crate::legacy::{LegacyTimesheet, decimal_to_f64};
use crate::rates::billed_rate;
use crate::store::timesheets::{NewTimesheet, TimesheetLifecycle, record};
use crate::store::users::NewUser;

enum Outcome {
    Imported,
    Mismatch,
    Failed(String),
}

/// Single pass over the legacy records.
///
/// Records are written in batches: every `batch_size` imported records the
/// transaction is committed and a new one opened. Each write runs in its own
/// savepoint so a failing record never poisons the batch.
pub(super) async fn import(
    input: &PhaseInput<'_>,
    ctx: &mut ImportContext,
    report: &mut RunReport,
) -> Result<(), ImportCause> {
    let total = input.snapshot.timesheets.len();
    let mut txn = input.db.begin().await?;
    let mut in_batch = 0;

    for (position, legacy) in input.snapshot.timesheets.iter().enumerate() {
        match import_one(&txn, input, ctx, legacy, report).await? {
            Outcome::Imported => {
                report.timesheets += 1;
                in_batch += 1;
                if in_batch >= input.options.batch_size {
                    txn.commit().await?;
                    txn = input.db.begin().await?;
                    in_batch = 0;
                    debug!(done = position + 1, total, "Committed timesheet batch");
                }
            }
            Outcome::Mismatch => report.mismatched.push(legacy.time_entry_id),
            Outcome::Failed(reason) => {
                warn!(legacy_id = legacy.time_entry_id, "{reason}");
                report.failed += 1;
            }
        }
    }

    txn.commit().await?;
    Ok(())
}

/// `Err` only for failures of the surrounding transaction.
async fn import_one(
    txn: &DatabaseTransaction,
    input: &PhaseInput<'_>,
    ctx: &mut ImportContext,
    legacy: &LegacyTimesheet,
    report: &mut RunReport,
) -> Result<Outcome, ImportCause> {
    let Some(project) = ctx.projects.get(&legacy.project_id).copied() else {
        return Ok(Outcome::Failed(format!(
            "Could not create timesheet record, missing project with ID: {}",
            legacy.project_id
        )));
    };

    let activity = match ctx.resolve_activity(legacy.activity_id, legacy.project_id) {
        Some(activity) => Some(activity),
        None => lazy_activity(txn, input, ctx, legacy, report).await?,
    };
    let Some(activity) = activity else {
        return Ok(Outcome::Failed(format!(
            "Could not import timesheet record, missing activity with ID: {}/{}/{}",
            legacy.activity_id, legacy.project_id, project.customer_id
        )));
    };

    let Some(end) = legacy.end.filter(|_| !legacy.is_running()) else {
        return Ok(Outcome::Failed(format!(
            "Cannot import running timesheet record, skipping: {}",
            legacy.time_entry_id
        )));
    };
    let duration = end - legacy.start;

    let owner = match ctx.users.get(&legacy.user_id).copied() {
        Some(owner) => owner,
        None => match placeholder_user(txn, input).await? {
            Ok(owner) => {
                ctx.users.insert(legacy.user_id, owner);
                report.synthesized_users += 1;
                owner
            }
            Err(reason) => return Ok(Outcome::Failed(reason)),
        },
    };

    if let Some(scope) = activity.project_id
        && scope != project.id
    {
        return Ok(Outcome::Mismatch);
    }

    let (Some(begin), Some(end)) = (
        DateTime::from_timestamp(legacy.start, 0),
        DateTime::from_timestamp(end, 0),
    ) else {
        return Ok(Outcome::Failed(format!(
            "Timestamps of timesheet record {} are out of range",
            legacy.time_entry_id
        )));
    };

    let fixed_rate = legacy.fixed_rate.map(decimal_to_f64).filter(|r| *r != 0.0);
    let hourly_rate = legacy.rate.map(decimal_to_f64).filter(|r| *r != 0.0);
    let description = legacy
        .description
        .clone()
        .or_else(|| legacy.comment.clone());

    let draft = NewTimesheet {
        user_id: owner.id,
        project_id: project.id,
        activity_id: activity.id,
        activity_project_id: activity.project_id,
        begin,
        end: Some(end),
        timezone: owner.timezone.name().to_string(),
        duration,
        rate: billed_rate(fixed_rate, hourly_rate, duration),
        fixed_rate,
        hourly_rate,
        exported: legacy.cleared != 0,
        description,
    };

    let savepoint = txn.begin().await?;
    match record(&savepoint, draft, &TimesheetLifecycle::disabled()).await {
        Ok(_) => {
            savepoint.commit().await?;
            Ok(Outcome::Imported)
        }
        Err(err) => {
            savepoint.rollback().await?;
            Ok(Outcome::Failed(format!(
                "Failed to import timesheet record {}: {err}",
                legacy.time_entry_id
            )))
        }
    }
}

/// Create the activity of a record whose `(activity, project)` pair was never
/// mapped in the legacy database.
async fn lazy_activity(
    txn: &DatabaseTransaction,
    input: &PhaseInput<'_>,
    ctx: &mut ImportContext,
    legacy: &LegacyTimesheet,
    report: &mut RunReport,
) -> Result<Option<ActivityRef>, ImportCause> {
    let Some(source) = ctx.legacy_activities.get(&legacy.activity_id).cloned() else {
        return Ok(None);
    };
    let scope = Scope {
        project: Some(legacy.project_id),
        budget: 0.0,
        lazy: true,
    };

    let savepoint = txn.begin().await?;
    match activities::create(&savepoint, input, ctx, &source, scope, report).await {
        Ok(created) => {
            savepoint.commit().await?;
            if created.is_some() {
                report.synthesized_activities += 1;
            }
            Ok(created)
        }
        Err(err) => {
            savepoint.rollback().await?;
            warn!(
                legacy_id = legacy.activity_id,
                error = %err,
                "Failed to create activity for timesheet record"
            );
            Ok(None)
        }
    }
}

/// A disabled user standing in for an owner missing from the legacy `users` table.
async fn placeholder_user(
    txn: &DatabaseTransaction,
    input: &PhaseInput<'_>,
) -> Result<Result<UserRef, String>, ImportCause> {
    let username = Uuid::new_v4().simple().to_string()[..13].to_string();
    let password = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
    let hash = hash_password(&password).map_err(|e| ImportCause::Hash(e.to_string()))?;

    let mut draft = NewUser::new(username.clone(), hash, Role::User);
    draft.alias = Some(format!("Import: {username}"));
    draft.email = Some(format!("{username}@example.com"));
    draft.enabled = false;
    draft.synthesized = true;

    let savepoint = txn.begin().await?;
    match draft.insert(&savepoint).await {
        Ok(user) => {
            savepoint.commit().await?;
            debug!(username = %user.username, "Created deactivated user");
            Ok(Ok(UserRef {
                id: user.id,
                timezone: input.options.timezone,
            }))
        }
        Err(err) => {
            savepoint.rollback().await?;
            Ok(Err(format!("Failed to create user {username}: {err}")))
        }
    }
}
