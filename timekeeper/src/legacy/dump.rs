use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use super::{
    LegacyActivity, LegacyCustomer, LegacyError, LegacyFixedRate, LegacyPreference,
    LegacyProject, LegacyProjectActivity, LegacyRate, LegacySource, LegacyTimesheet, LegacyUser,
};

/// The legacy tables as one JSON document, keyed by unprefixed table name:
///
/// ```json
/// { "configuration": { "version": "1.0.1", "revision": "1388" },
///   "users": [ { "user_id": 1, "name": "admin", "active": 1 } ],
///   "timeSheet": [] }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DumpSource {
    configuration: HashMap<String, String>,
    users: Vec<LegacyUser>,
    preferences: Vec<LegacyPreference>,
    customers: Vec<LegacyCustomer>,
    projects: Vec<LegacyProject>,
    activities: Vec<LegacyActivity>,
    projects_activities: Vec<LegacyProjectActivity>,
    #[serde(rename = "timeSheet", alias = "timesheets")]
    timesheets: Vec<LegacyTimesheet>,
    #[serde(rename = "fixedRates", alias = "fixed_rates")]
    fixed_rates: Vec<LegacyFixedRate>,
    rates: Vec<LegacyRate>,
}

impl DumpSource {
    pub fn from_json(json: &str) -> Result<Self, LegacyError> {
        Ok(serde_json::from_str(json)?)
    }

    pub async fn from_path(path: &Path) -> Result<Self, LegacyError> {
        let json = tokio::fs::read_to_string(path).await?;
        Self::from_json(&json)
    }
}

#[async_trait::async_trait]
impl LegacySource for DumpSource {
    async fn configuration(&self, option: &str) -> Result<Option<String>, LegacyError> {
        Ok(self.configuration.get(option).cloned())
    }

    async fn users(&self) -> Result<Vec<LegacyUser>, LegacyError> {
        Ok(self.users.clone())
    }

    async fn preferences(&self) -> Result<Vec<LegacyPreference>, LegacyError> {
        Ok(self.preferences.clone())
    }

    async fn customers(&self) -> Result<Vec<LegacyCustomer>, LegacyError> {
        Ok(self.customers.clone())
    }

    async fn projects(&self) -> Result<Vec<LegacyProject>, LegacyError> {
        Ok(self.projects.clone())
    }

    async fn activities(&self) -> Result<Vec<LegacyActivity>, LegacyError> {
        Ok(self.activities.clone())
    }

    async fn project_activities(&self) -> Result<Vec<LegacyProjectActivity>, LegacyError> {
        Ok(self.projects_activities.clone())
    }

    async fn timesheets(&self) -> Result<Vec<LegacyTimesheet>, LegacyError> {
        Ok(self.timesheets.clone())
    }

    async fn fixed_rates(&self) -> Result<Vec<LegacyFixedRate>, LegacyError> {
        Ok(self.fixed_rates.clone())
    }

    async fn rates(&self) -> Result<Vec<LegacyRate>, LegacyError> {
        Ok(self.rates.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_parse_dump() {
        let source = DumpSource::from_json(
            r#"{
                "configuration": { "version": "1.0.1", "revision": "1388" },
                "users": [ { "user_id": 3, "name": "jane", "active": 1 } ],
                "timeSheet": [
                    { "time_entry_id": 1, "start": 100, "end": 3700, "user_id": 3,
                      "project_id": 1, "activity_id": 2, "rate": 50.5 }
                ],
                "fixedRates": [ { "project_id": 1, "activity_id": null, "rate": "120.00" } ]
            }"#,
        )
        .unwrap();

        assert_eq!(
            source.configuration("revision").await.unwrap().as_deref(),
            Some("1388")
        );
        let users = source.users().await.unwrap();
        assert_eq!(users[0].name, "jane");
        assert_eq!(users[0].global_role_id, None);

        let records = source.timesheets().await.unwrap();
        assert_eq!(records[0].end, Some(3700));
        assert_eq!(records[0].rate, Some(Decimal::new(505, 1)));

        let fixed = source.fixed_rates().await.unwrap();
        assert_eq!(fixed[0].rate, Decimal::new(12000, 2));
        assert!(source.rates().await.unwrap().is_empty());
    }

    #[test]
    fn test_malformed_dump() {
        assert!(matches!(
            DumpSource::from_json("{ \"users\": 5 }"),
            Err(LegacyError::Format(_))
        ));
    }
}
