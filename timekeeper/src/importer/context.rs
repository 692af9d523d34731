use std::collections::{HashMap, HashSet};

use chrono_tz::Tz;
use uuid::Uuid;

use crate::legacy::LegacyActivity;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserRef {
    pub id: Uuid,
    pub timezone: Tz,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectRef {
    pub id: Uuid,
    pub customer_id: Uuid,
}

/// Import identity of an activity: the legacy id plus the legacy project it is
/// scoped to (`None` for global activities).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActivityKey {
    pub legacy_id: i64,
    pub project: Option<i64>,
}

impl ActivityKey {
    pub fn global(legacy_id: i64) -> Self {
        Self {
            legacy_id,
            project: None,
        }
    }

    pub fn scoped(legacy_id: i64, project: i64) -> Self {
        Self {
            legacy_id,
            project: Some(project),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityRef {
    pub id: Uuid,
    pub project_id: Option<Uuid>,
}

/// Legacy id → created entity, filled phase by phase.
#[derive(Debug, Default)]
pub struct ImportContext {
    pub users: HashMap<i64, UserRef>,
    pub customers: HashMap<i64, Uuid>,
    pub projects: HashMap<i64, ProjectRef>,
    pub activities: HashMap<ActivityKey, ActivityRef>,
    /// Source rows for activities created lazily during the timesheet phase.
    pub legacy_activities: HashMap<i64, LegacyActivity>,
    /// Legacy customers that were skipped or failed to persist.
    pub dropped_customers: HashSet<i64>,
    /// Legacy projects that were skipped, failed to persist, or belong to a
    /// dropped customer.
    pub dropped_projects: HashSet<i64>,
}

impl ImportContext {
    /// The activity a record should use: the instance scoped to its project,
    /// else the global one.
    pub fn resolve_activity(&self, legacy_id: i64, project: i64) -> Option<ActivityRef> {
        self.activities
            .get(&ActivityKey::scoped(legacy_id, project))
            .or_else(|| self.activities.get(&ActivityKey::global(legacy_id)))
            .copied()
    }
}
