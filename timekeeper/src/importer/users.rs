use std::str::FromStr;

use chrono_tz::Tz;
use tracing::debug;

use super::context::{ImportContext, UserRef};
use super::{ImportCause, PhaseInput, RunReport};
use crate::auth::hash_password;
use crate::entity::user::Role;
use crate::entity::user_preference;
use crate::legacy::LegacyUser;
use crate::store::users::NewUser;

/// Kimai v1 preference names and their counterparts.
const PREFERENCE_MAP: [(&str, &str); 2] = [
    ("ui.lang", user_preference::LANGUAGE),
    ("timezone", user_preference::TIMEZONE),
];

const SUPER_ADMIN_ROLE_ID: i64 = 1;

pub(super) async fn import(
    input: &PhaseInput<'_>,
    ctx: &mut ImportContext,
    report: &mut RunReport,
) -> Result<(), ImportCause> {
    for legacy in &input.snapshot.users {
        let draft = draft(input, legacy, report)?;
        let timezone = draft
            .preferences
            .get(user_preference::TIMEZONE)
            .and_then(|tz| Tz::from_str(tz).ok())
            .unwrap_or(input.options.timezone);

        match draft.insert(input.db).await {
            Ok(user) => {
                debug!(username = %user.username, legacy_id = legacy.user_id, "Created user");
                ctx.users.insert(
                    legacy.user_id,
                    UserRef {
                        id: user.id,
                        timezone,
                    },
                );
                report.users += 1;
            }
            Err(err) => input.on_store_error(err, report)?,
        }
    }
    Ok(())
}

fn draft(
    input: &PhaseInput<'_>,
    legacy: &LegacyUser,
    report: &mut RunReport,
) -> Result<NewUser, ImportCause> {
    let role = if legacy.global_role_id == Some(SUPER_ADMIN_ROLE_ID) {
        Role::SuperAdmin
    } else {
        Role::User
    };
    let hash =
        hash_password(&input.options.password).map_err(|e| ImportCause::Hash(e.to_string()))?;

    let mut draft = NewUser::new(legacy.name.clone(), hash, role);
    draft.alias = legacy.alias.clone();
    draft.email = legacy.mail.clone();
    draft.enabled = legacy.is_active();

    let preferences = input
        .snapshot
        .preferences
        .iter()
        .filter(|p| p.user_id == legacy.user_id);
    for pref in preferences {
        let Some(value) = pref.value.as_deref().map(str::trim).filter(|v| !v.is_empty()) else {
            continue;
        };
        let Some((_, name)) = PREFERENCE_MAP.iter().find(|(old, _)| *old == pref.option) else {
            continue;
        };
        if *name == user_preference::TIMEZONE && Tz::from_str(value).is_err() {
            report.warn(format!(
                "Ignoring unknown timezone '{value}' of user {}",
                legacy.name
            ));
            continue;
        }
        draft = draft.preference(name, value);
    }

    if let Some(rate) = input.rates.user_hourly(legacy.user_id) {
        draft = draft.preference(user_preference::HOURLY_RATE, rate.to_string());
    }

    Ok(draft)
}
