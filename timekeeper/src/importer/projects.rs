use tracing::debug;

use super::context::{ImportContext, ProjectRef};
use super::{ImportCause, PhaseInput, RunReport, name_or_placeholder, skip_dependent};
use crate::legacy::decimal_to_f64;
use crate::store::projects::NewProject;

pub(super) async fn import(
    input: &PhaseInput<'_>,
    ctx: &mut ImportContext,
    report: &mut RunReport,
) -> Result<(), ImportCause> {
    for legacy in &input.snapshot.projects {
        if ctx.dropped_customers.contains(&legacy.customer_id) {
            skip_dependent(report, "project", legacy.project_id, "customer", legacy.customer_id);
            ctx.dropped_projects.insert(legacy.project_id);
            continue;
        }
        let Some(&customer_id) = ctx.customers.get(&legacy.customer_id) else {
            return Err(ImportCause::UnresolvedReference {
                entity: "project",
                legacy_id: legacy.project_id,
                target: "customer",
                target_id: legacy.customer_id,
            });
        };

        let (name, synthesized) = name_or_placeholder(legacy.name.as_deref(), "project", report);
        let mut draft = NewProject::new(customer_id, name);
        draft.comment = legacy.comment.clone();
        draft.visible = legacy.visible != 0 && legacy.trash == 0;
        draft.budget = legacy.budget.map(decimal_to_f64).unwrap_or(0.0);
        draft.fixed_rate = input.rates.project_fixed(legacy.project_id);
        draft.hourly_rate = input.rates.project_hourly(legacy.project_id);
        draft.synthesized = synthesized;

        match draft.insert(input.db).await {
            Ok(project) => {
                debug!(name = %project.name, legacy_id = legacy.project_id, "Created project");
                ctx.projects.insert(
                    legacy.project_id,
                    ProjectRef {
                        id: project.id,
                        customer_id,
                    },
                );
                report.projects += 1;
            }
            Err(err) => {
                input.on_store_error(err, report)?;
                ctx.dropped_projects.insert(legacy.project_id);
            }
        }
    }
    Ok(())
}
