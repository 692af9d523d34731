//! Migration of a Kimai v1 database into the target store.
//!
//! A run reads every legacy table first, then writes users, customers,
//! projects, activities and timesheet records in that order. Each phase
//! finishes before the next starts; a phase-level failure stops the run but
//! keeps what earlier phases committed.

use std::fmt;
use std::str::FromStr;

use chrono_tz::Tz;
use sea_orm::{DatabaseConnection, DbErr};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::legacy::{LegacyError, LegacySnapshot, LegacySource};
use crate::store::StoreError;
use crate::validation::Violations;

mod activities;
pub mod context;
mod customers;
mod projects;
pub mod rates;
pub mod report;
mod timesheets;
mod users;
pub mod version;

pub use context::ImportContext;
pub use rates::RateTable;
pub use report::RunReport;

pub const MIN_VERSION: &str = "1.0.1";
pub const MIN_REVISION: &str = "1388";
pub const DEFAULT_BATCH_SIZE: usize = 80;

/// What to do when a user, customer, project or activity fails validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationPolicy {
    #[default]
    Abort,
    Skip,
}

impl FromStr for ValidationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "abort" => Ok(ValidationPolicy::Abort),
            "skip" => Ok(ValidationPolicy::Skip),
            other => Err(format!("unknown validation policy '{other}' (expected abort or skip)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Password given to every imported user.
    pub password: String,
    pub country: String,
    pub currency: String,
    pub timezone: Tz,
    pub policy: ValidationPolicy,
    /// Timesheet records per committed transaction.
    pub batch_size: usize,
}

impl ImportOptions {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            country: "DE".to_string(),
            currency: "EUR".to_string(),
            timezone: Tz::UTC,
            policy: ValidationPolicy::Abort,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Trimmed, upper-cased copy, or the list of violated constraints.
    pub fn normalized(&self) -> Result<Self, Violations> {
        let password = self.password.trim().to_string();
        let country = self.country.trim().to_uppercase();
        let currency = self.currency.trim().to_uppercase();

        let mut v = Violations::new();
        if password.chars().count() < 6 {
            v.add("password", "must have at least 6 characters");
        }
        if country.chars().count() != 2 {
            v.add("country", format!("'{country}' must have exactly 2 characters"));
        }
        if currency.chars().count() != 3 {
            v.add("currency", format!("'{currency}' must have exactly 3 characters"));
        }
        if self.batch_size == 0 {
            v.add("batch_size", "must be at least 1");
        }
        v.into_result()?;

        Ok(Self {
            password,
            country,
            currency,
            ..self.clone()
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Preflight,
    Fetch,
    Users,
    Customers,
    Projects,
    Activities,
    Timesheets,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Preflight => "preflight",
            Phase::Fetch => "fetch",
            Phase::Users => "users",
            Phase::Customers => "customers",
            Phase::Projects => "projects",
            Phase::Activities => "activities",
            Phase::Timesheets => "timesheet records",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ImportCause {
    #[error("invalid options: {0}")]
    InvalidOptions(Violations),
    #[error(
        "unsupported Kimai version {found_version}/{found_revision}, requires at least {min_version}/{min_revision}",
        min_version = MIN_VERSION,
        min_revision = MIN_REVISION
    )]
    UnsupportedVersion {
        found_version: String,
        found_revision: String,
    },
    #[error(transparent)]
    Legacy(#[from] LegacyError),
    #[error("failed to validate {entity} '{name}': {violations}")]
    Invalid {
        entity: &'static str,
        name: String,
        violations: Violations,
    },
    #[error("{entity} {legacy_id} references unknown {target} {target_id}")]
    UnresolvedReference {
        entity: &'static str,
        legacy_id: i64,
        target: &'static str,
        target_id: i64,
    },
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("Database error: {0}")]
    Db(#[from] DbErr),
}

/// A failed run: where it stopped, why, and what had been imported by then.
#[derive(Debug, Error)]
#[error("import failed in {phase} phase: {cause}")]
pub struct ImportError {
    pub phase: Phase,
    #[source]
    pub cause: ImportCause,
    pub partial: Box<RunReport>,
}

impl ImportError {
    fn new(phase: Phase, cause: ImportCause, partial: &RunReport) -> Self {
        Self {
            phase,
            cause,
            partial: Box::new(partial.clone()),
        }
    }
}

/// Shared, read-only inputs of the write phases.
pub(crate) struct PhaseInput<'a> {
    pub db: &'a DatabaseConnection,
    pub options: &'a ImportOptions,
    pub snapshot: &'a LegacySnapshot,
    pub rates: &'a RateTable,
}

impl PhaseInput<'_> {
    /// Apply the validation policy to a failed insert of phases 1–4.
    ///
    /// Persistence errors other than validation are logged and the entity is
    /// left out of the index.
    pub(crate) fn on_store_error(
        &self,
        err: StoreError,
        report: &mut RunReport,
    ) -> Result<(), ImportCause> {
        match err {
            StoreError::Invalid {
                entity,
                name,
                violations,
            } => match self.options.policy {
                ValidationPolicy::Abort => Err(ImportCause::Invalid {
                    entity,
                    name,
                    violations,
                }),
                ValidationPolicy::Skip => {
                    report.skipped += 1;
                    report.warn(format!("Skipped invalid {entity} '{name}': {violations}"));
                    Ok(())
                }
            },
            other => {
                error!(error = %other, "Failed to persist entity");
                Ok(())
            }
        }
    }
}

pub struct Importer<'a> {
    source: &'a dyn LegacySource,
    db: &'a DatabaseConnection,
    options: ImportOptions,
}

impl<'a> Importer<'a> {
    pub fn new(source: &'a dyn LegacySource, db: &'a DatabaseConnection, options: ImportOptions) -> Self {
        Self { source, db, options }
    }

    pub async fn run(self) -> Result<RunReport, ImportError> {
        let mut report = RunReport::default();
        report.memory.start = report::memory_usage();

        let options = self
            .options
            .normalized()
            .map_err(|v| ImportError::new(Phase::Preflight, ImportCause::InvalidOptions(v), &report))?;

        self.check_version()
            .await
            .map_err(|cause| ImportError::new(Phase::Preflight, cause, &report))?;

        let snapshot = self
            .fetch()
            .await
            .map_err(|cause| ImportError::new(Phase::Fetch, cause.into(), &report))?;
        report.legacy_rows = snapshot.row_count();
        report.memory.after_fetch = report::memory_usage();
        info!(rows = report.legacy_rows, "Fetched Kimai v1 data, trying to import now ...");

        let rates = RateTable::from_rows(&snapshot.fixed_rates, &snapshot.rates);
        let input = PhaseInput {
            db: self.db,
            options: &options,
            snapshot: &snapshot,
            rates: &rates,
        };
        let mut ctx = ImportContext::default();

        if let Err(cause) = users::import(&input, &mut ctx, &mut report).await {
            return Err(ImportError::new(Phase::Users, cause, &report));
        }
        info!(count = report.users, "Imported users");

        if let Err(cause) = customers::import(&input, &mut ctx, &mut report).await {
            return Err(ImportError::new(Phase::Customers, cause, &report));
        }
        info!(count = report.customers, "Imported customers");

        if let Err(cause) = projects::import(&input, &mut ctx, &mut report).await {
            return Err(ImportError::new(Phase::Projects, cause, &report));
        }
        info!(count = report.projects, "Imported projects");

        if let Err(cause) = activities::import(&input, &mut ctx, &mut report).await {
            return Err(ImportError::new(Phase::Activities, cause, &report));
        }
        info!(
            global = report.global_activities,
            scoped = report.scoped_activities,
            "Imported activities"
        );

        if let Err(cause) = timesheets::import(&input, &mut ctx, &mut report).await {
            return Err(ImportError::new(Phase::Timesheets, cause, &report));
        }
        info!(
            count = report.timesheets,
            failed = report.failed,
            mismatched = report.mismatched.len(),
            "Imported timesheet records"
        );

        report.memory.after_import = report::memory_usage();
        Ok(report)
    }

    async fn check_version(&self) -> Result<(), ImportCause> {
        let found_version = self.source.configuration("version").await?;
        let found_revision = self.source.configuration("revision").await?;

        let supported = version::at_least(found_version.as_deref(), MIN_VERSION)
            && version::at_least(found_revision.as_deref(), MIN_REVISION);
        if !supported {
            warn!(
                version = ?found_version,
                revision = ?found_revision,
                "Unsupported Kimai v1 database"
            );
            return Err(ImportCause::UnsupportedVersion {
                found_version: found_version.unwrap_or_else(|| "0".into()),
                found_revision: found_revision.unwrap_or_else(|| "0".into()),
            });
        }
        Ok(())
    }

    async fn fetch(&self) -> Result<LegacySnapshot, LegacyError> {
        Ok(LegacySnapshot {
            users: self.source.users().await?,
            preferences: self.source.preferences().await?,
            customers: self.source.customers().await?,
            projects: self.source.projects().await?,
            activities: self.source.activities().await?,
            project_activities: self.source.project_activities().await?,
            timesheets: self.source.timesheets().await?,
            fixed_rates: self.source.fixed_rates().await?,
            rates: self.source.rates().await?,
        })
    }
}

/// Non-empty legacy name, or a generated placeholder recorded as a warning.
pub(crate) fn name_or_placeholder(
    name: Option<&str>,
    entity: &str,
    report: &mut RunReport,
) -> (String, bool) {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => (name.to_string(), false),
        None => {
            let placeholder = uuid::Uuid::new_v4().simple().to_string()[..13].to_string();
            report.warn(format!(
                "Found empty {entity} name, setting it to: {placeholder}"
            ));
            (placeholder, true)
        }
    }
}

/// Count an entity whose parent never made it into the store as skipped.
pub(crate) fn skip_dependent(
    report: &mut RunReport,
    entity: &str,
    legacy_id: i64,
    target: &str,
    target_id: i64,
) {
    report.skipped += 1;
    report.warn(format!(
        "Skipped {entity} {legacy_id}: {target} {target_id} was not imported"
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_are_normalized() {
        let mut options = ImportOptions::new("  secret  ");
        options.country = "at".into();
        options.currency = "chf".into();
        let options = options.normalized().unwrap();
        assert_eq!(options.password, "secret");
        assert_eq!(options.country, "AT");
        assert_eq!(options.currency, "CHF");
        assert_eq!(options.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn test_invalid_options() {
        let mut options = ImportOptions::new("  12345 ");
        options.country = "DEU".into();
        options.currency = "EU".into();
        let violations = options.normalized().unwrap_err();
        assert!(violations.has_field("password"));
        assert!(violations.has_field("country"));
        assert!(violations.has_field("currency"));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("skip".parse::<ValidationPolicy>().unwrap(), ValidationPolicy::Skip);
        assert_eq!("ABORT".parse::<ValidationPolicy>().unwrap(), ValidationPolicy::Abort);
        assert!("ignore".parse::<ValidationPolicy>().is_err());
    }

    #[test]
    fn test_placeholder_names_are_reported() {
        let mut report = RunReport::default();
        let (name, synthesized) = name_or_placeholder(Some("  "), "customer", &mut report);
        assert!(synthesized);
        assert_eq!(name.len(), 13);
        assert_eq!(report.warnings.len(), 1);

        let (name, synthesized) = name_or_placeholder(Some("Acme"), "customer", &mut report);
        assert!(!synthesized);
        assert_eq!(name, "Acme");
    }
}
