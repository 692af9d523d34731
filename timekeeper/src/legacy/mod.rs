//! Read access to a Kimai v1 database.
//!
//! A [`LegacySource`] hands out each legacy table as a fully materialized
//! vector of rows. Column names are normalized to snake_case; flag columns are
//! integers as in the legacy schema.

use std::path::Path;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sea_orm::FromQueryResult;
use serde::Deserialize;
use thiserror::Error;

pub mod dump;
pub mod sql;

pub use dump::DumpSource;
pub use sql::SqlSource;

// ---------- rows ----------

#[derive(Debug, Clone, Default, PartialEq, Deserialize, FromQueryResult)]
#[serde(default)]
pub struct LegacyUser {
    pub user_id: i64,
    pub name: String,
    pub alias: Option<String>,
    pub mail: Option<String>,
    pub active: i64,
    pub trash: i64,
    pub ban: i64,
    pub global_role_id: Option<i64>,
}

impl LegacyUser {
    pub fn is_active(&self) -> bool {
        self.active != 0 && self.trash == 0 && self.ban == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, FromQueryResult)]
#[serde(default)]
pub struct LegacyPreference {
    pub user_id: i64,
    pub option: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, FromQueryResult)]
#[serde(default)]
pub struct LegacyCustomer {
    pub customer_id: i64,
    pub name: Option<String>,
    pub comment: Option<String>,
    pub visible: i64,
    pub company: Option<String>,
    pub contact: Option<String>,
    pub street: Option<String>,
    pub zipcode: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub fax: Option<String>,
    pub mobile: Option<String>,
    pub mail: Option<String>,
    pub homepage: Option<String>,
    pub trash: i64,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, FromQueryResult)]
#[serde(default)]
pub struct LegacyProject {
    pub project_id: i64,
    pub customer_id: i64,
    pub name: Option<String>,
    pub comment: Option<String>,
    pub visible: i64,
    pub trash: i64,
    pub budget: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, FromQueryResult)]
#[serde(default)]
pub struct LegacyActivity {
    pub activity_id: i64,
    pub name: Option<String>,
    pub comment: Option<String>,
    pub visible: i64,
    pub trash: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, FromQueryResult)]
#[serde(default)]
pub struct LegacyProjectActivity {
    pub project_id: i64,
    pub activity_id: i64,
    pub budget: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, FromQueryResult)]
#[serde(default)]
pub struct LegacyTimesheet {
    pub time_entry_id: i64,
    /// Epoch seconds
    pub start: i64,
    /// Epoch seconds; `None` or `0` while running.
    pub end: Option<i64>,
    pub duration: Option<i64>,
    pub user_id: i64,
    pub project_id: i64,
    pub activity_id: i64,
    pub description: Option<String>,
    pub comment: Option<String>,
    pub cleared: i64,
    pub rate: Option<Decimal>,
    pub fixed_rate: Option<Decimal>,
}

impl LegacyTimesheet {
    pub fn is_running(&self) -> bool {
        matches!(self.end, None | Some(0))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, FromQueryResult)]
#[serde(default)]
pub struct LegacyFixedRate {
    pub project_id: Option<i64>,
    pub activity_id: Option<i64>,
    pub rate: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, FromQueryResult)]
#[serde(default)]
pub struct LegacyRate {
    pub user_id: Option<i64>,
    pub project_id: Option<i64>,
    pub activity_id: Option<i64>,
    pub rate: Decimal,
}

/// Every table the importer needs, read in one go.
#[derive(Debug, Clone, Default)]
pub struct LegacySnapshot {
    pub users: Vec<LegacyUser>,
    pub preferences: Vec<LegacyPreference>,
    pub customers: Vec<LegacyCustomer>,
    pub projects: Vec<LegacyProject>,
    pub activities: Vec<LegacyActivity>,
    pub project_activities: Vec<LegacyProjectActivity>,
    pub timesheets: Vec<LegacyTimesheet>,
    pub fixed_rates: Vec<LegacyFixedRate>,
    pub rates: Vec<LegacyRate>,
}

impl LegacySnapshot {
    pub fn row_count(&self) -> usize {
        self.users.len()
            + self.preferences.len()
            + self.customers.len()
            + self.projects.len()
            + self.activities.len()
            + self.project_activities.len()
            + self.timesheets.len()
            + self.fixed_rates.len()
            + self.rates.len()
    }
}

/// Legacy DECIMAL to the float representation used by the target store.
pub fn decimal_to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

// ---------- errors ----------

#[derive(Debug, Error)]
pub enum LegacyError {
    #[error("Connection error: {0}")]
    Connect(String),
    #[error("Query error on table '{table}': {message}")]
    Query { table: String, message: String },
    #[error("Could not read dump: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed dump: {0}")]
    Format(#[from] serde_json::Error),
}

// ---------- trait ----------

#[async_trait::async_trait]
pub trait LegacySource: Send + Sync {
    /// Value of an `option` in the `configuration` table.
    async fn configuration(&self, option: &str) -> Result<Option<String>, LegacyError>;

    async fn users(&self) -> Result<Vec<LegacyUser>, LegacyError>;
    async fn preferences(&self) -> Result<Vec<LegacyPreference>, LegacyError>;
    async fn customers(&self) -> Result<Vec<LegacyCustomer>, LegacyError>;
    async fn projects(&self) -> Result<Vec<LegacyProject>, LegacyError>;
    async fn activities(&self) -> Result<Vec<LegacyActivity>, LegacyError>;
    async fn project_activities(&self) -> Result<Vec<LegacyProjectActivity>, LegacyError>;
    async fn timesheets(&self) -> Result<Vec<LegacyTimesheet>, LegacyError>;
    async fn fixed_rates(&self) -> Result<Vec<LegacyFixedRate>, LegacyError>;
    async fn rates(&self) -> Result<Vec<LegacyRate>, LegacyError>;
}

// ---------- factory ----------

/// Open a legacy database by connection URL and table prefix.
pub async fn connect(url: &str, prefix: &str) -> Result<Box<dyn LegacySource>, LegacyError> {
    let source = SqlSource::connect(url, prefix).await?;
    Ok(Box::new(source))
}

/// Open a JSON dump of the legacy tables.
pub async fn open_dump(path: &Path) -> Result<Box<dyn LegacySource>, LegacyError> {
    let source = DumpSource::from_path(path).await?;
    Ok(Box::new(source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_activity_flags() {
        let user = LegacyUser {
            active: 1,
            ..Default::default()
        };
        assert!(user.is_active());
        assert!(!LegacyUser { trash: 1, ..user.clone() }.is_active());
        assert!(!LegacyUser { ban: 1, ..user.clone() }.is_active());
        assert!(!LegacyUser { active: 0, ..user }.is_active());
    }

    #[test]
    fn test_running_record() {
        let mut record = LegacyTimesheet {
            start: 1_500_000_000,
            ..Default::default()
        };
        assert!(record.is_running());
        record.end = Some(0);
        assert!(record.is_running());
        record.end = Some(1_500_003_600);
        assert!(!record.is_running());
    }

    #[test]
    fn test_decimal_conversion() {
        assert_eq!(decimal_to_f64(Decimal::new(12550, 2)), 125.5);
    }
}
