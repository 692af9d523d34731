//! Validated writes to the target store.
//!
//! Every entity is created from a `New*` draft: the draft is validated, then
//! inserted through any SeaORM connection (plain connection, transaction or
//! savepoint), so callers decide the transactional scope.

use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

use crate::validation::Violations;

pub mod activities;
pub mod customers;
pub mod projects;
pub mod timesheets;
pub mod users;

pub use timesheets::TimesheetLifecycle;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid {entity} '{name}': {violations}")]
    Invalid {
        entity: &'static str,
        name: String,
        violations: Violations,
    },
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },
    #[error("timesheet {0} is already stopped")]
    AlreadyStopped(Uuid),
    #[error("Database error: {0}")]
    Db(#[from] DbErr),
}

impl StoreError {
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Invalid { .. })
    }
}

/// Empty or whitespace-only strings collapse to `None`.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
