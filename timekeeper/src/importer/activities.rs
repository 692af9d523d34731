use std::collections::HashMap;

use sea_orm::ConnectionTrait;
use tracing::debug;

use super::context::{ActivityKey, ActivityRef, ImportContext};
use super::{ImportCause, PhaseInput, RunReport, name_or_placeholder, skip_dependent};
use crate::legacy::{LegacyActivity, LegacyProjectActivity, decimal_to_f64};
use crate::store::StoreError;
use crate::store::activities::NewActivity;

/// Two passes: activities without any project mapping become global, every
/// mapped `(activity, project)` pair becomes one project scoped activity.
pub(super) async fn import(
    input: &PhaseInput<'_>,
    ctx: &mut ImportContext,
    report: &mut RunReport,
) -> Result<(), ImportCause> {
    let mut mappings: HashMap<i64, Vec<&LegacyProjectActivity>> = HashMap::new();
    for mapping in &input.snapshot.project_activities {
        mappings.entry(mapping.activity_id).or_default().push(mapping);
    }

    for legacy in &input.snapshot.activities {
        ctx.legacy_activities
            .insert(legacy.activity_id, legacy.clone());
    }

    for legacy in input
        .snapshot
        .activities
        .iter()
        .filter(|a| !mappings.contains_key(&a.activity_id))
    {
        match create(input.db, input, ctx, legacy, Scope::global(), report).await {
            Ok(Some(_)) => report.global_activities += 1,
            Ok(None) => {}
            Err(err) => input.on_store_error(err, report)?,
        }
    }

    for legacy in &input.snapshot.activities {
        let Some(scoped) = mappings.get(&legacy.activity_id) else {
            continue;
        };
        for mapping in scoped {
            if ctx.dropped_projects.contains(&mapping.project_id) {
                skip_dependent(report, "activity", legacy.activity_id, "project", mapping.project_id);
                continue;
            }
            if !ctx.projects.contains_key(&mapping.project_id) {
                return Err(ImportCause::UnresolvedReference {
                    entity: "activity",
                    legacy_id: legacy.activity_id,
                    target: "project",
                    target_id: mapping.project_id,
                });
            }
            let scope = Scope {
                project: Some(mapping.project_id),
                budget: mapping.budget.map(decimal_to_f64).unwrap_or(0.0),
                lazy: false,
            };
            match create(input.db, input, ctx, legacy, scope, report).await {
                Ok(Some(_)) => report.scoped_activities += 1,
                Ok(None) => {}
                Err(err) => input.on_store_error(err, report)?,
            }
        }
    }
    Ok(())
}

/// Where a new activity lives and how it came to be.
#[derive(Debug, Clone, Copy)]
pub(super) struct Scope {
    /// Legacy project id; `None` for a global activity.
    pub project: Option<i64>,
    pub budget: f64,
    /// Created on demand for a timesheet record.
    pub lazy: bool,
}

impl Scope {
    fn global() -> Self {
        Self {
            project: None,
            budget: 0.0,
            lazy: false,
        }
    }
}

/// Create the activity for `(legacy, project)` unless it already exists.
///
/// Returns `Ok(None)` for an existing instance or an unknown project.
pub(super) async fn create<C: ConnectionTrait>(
    conn: &C,
    input: &PhaseInput<'_>,
    ctx: &mut ImportContext,
    legacy: &LegacyActivity,
    scope: Scope,
    report: &mut RunReport,
) -> Result<Option<ActivityRef>, StoreError> {
    let project = scope.project;
    let key = ActivityKey {
        legacy_id: legacy.activity_id,
        project,
    };
    if ctx.activities.contains_key(&key) {
        return Ok(None);
    }
    let project_id = match project {
        Some(p) => match ctx.projects.get(&p) {
            Some(project) => Some(project.id),
            None => return Ok(None),
        },
        None => None,
    };

    let (name, synthesized) = name_or_placeholder(legacy.name.as_deref(), "activity", report);
    let mut draft = NewActivity::new(project_id, name);
    draft.comment = legacy.comment.clone();
    draft.visible = legacy.visible != 0 && legacy.trash == 0;
    draft.budget = scope.budget;
    draft.fixed_rate = input.rates.activity_fixed(legacy.activity_id, project);
    draft.hourly_rate = input.rates.activity_hourly(legacy.activity_id, project);
    draft.synthesized = synthesized || scope.lazy;

    let activity = draft.insert(conn).await?;
    debug!(
        name = %activity.name,
        legacy_id = legacy.activity_id,
        legacy_project = ?project,
        "Created activity"
    );
    let created = ActivityRef {
        id: activity.id,
        project_id,
    };
    ctx.activities.insert(key, created);
    Ok(Some(created))
}
