use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, FromQueryResult,
    Statement, Value,
};
use tracing::debug;

use super::{
    LegacyActivity, LegacyCustomer, LegacyError, LegacyFixedRate, LegacyPreference,
    LegacyProject, LegacyProjectActivity, LegacyRate, LegacySource, LegacyTimesheet, LegacyUser,
};

/// A Kimai v1 database reached through SeaORM.
pub struct SqlSource {
    db: DatabaseConnection,
    prefix: String,
}

#[derive(Debug, FromQueryResult)]
struct ConfigurationRow {
    value: Option<String>,
}

impl SqlSource {
    pub fn new(db: DatabaseConnection, prefix: impl Into<String>) -> Self {
        Self {
            db,
            prefix: prefix.into(),
        }
    }

    pub async fn connect(url: &str, prefix: &str) -> Result<Self, LegacyError> {
        let mut opts = ConnectOptions::new(url.to_owned());
        opts.sqlx_logging(false);
        let db = Database::connect(opts)
            .await
            .map_err(|e| LegacyError::Connect(e.to_string()))?;
        Ok(Self::new(db, prefix))
    }

    fn backend(&self) -> DbBackend {
        self.db.get_database_backend()
    }

    fn quote(&self, ident: &str) -> String {
        match self.backend() {
            DbBackend::Postgres => format!("\"{}\"", ident.replace('"', "\"\"")),
            _ => format!("`{}`", ident.replace('`', "``")),
        }
    }

    fn table(&self, name: &str) -> String {
        self.quote(&format!("{}{}", self.prefix, name))
    }

    /// `SELECT col AS alias, ... FROM prefix_table`
    fn select(&self, table: &str, columns: &[(&str, &str)]) -> String {
        let columns = columns
            .iter()
            .map(|(column, alias)| format!("{} AS {}", self.quote(column), self.quote(alias)))
            .collect::<Vec<_>>()
            .join(", ");
        format!("SELECT {columns} FROM {}", self.table(table))
    }

    async fn fetch<T: FromQueryResult>(
        &self,
        table: &str,
        columns: &[(&str, &str)],
    ) -> Result<Vec<T>, LegacyError> {
        let sql = self.select(table, columns);
        debug!(table, sql = %sql, "Fetching legacy table");
        T::find_by_statement(Statement::from_string(self.backend(), sql))
            .all(&self.db)
            .await
            .map_err(|e| LegacyError::Query {
                table: format!("{}{}", self.prefix, table),
                message: e.to_string(),
            })
    }
}

#[async_trait::async_trait]
impl LegacySource for SqlSource {
    async fn configuration(&self, option: &str) -> Result<Option<String>, LegacyError> {
        let placeholder = match self.backend() {
            DbBackend::Postgres => "$1",
            _ => "?",
        };
        let sql = format!(
            "SELECT {} AS {} FROM {} WHERE {} = {placeholder}",
            self.quote("value"),
            self.quote("value"),
            self.table("configuration"),
            self.quote("option"),
        );
        let stmt = Statement::from_sql_and_values(
            self.backend(),
            sql,
            [Value::from(option.to_owned())],
        );
        let row = ConfigurationRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(|e| LegacyError::Query {
                table: format!("{}configuration", self.prefix),
                message: e.to_string(),
            })?;
        Ok(row.and_then(|r| r.value))
    }

    async fn users(&self) -> Result<Vec<LegacyUser>, LegacyError> {
        self.fetch(
            "users",
            &[
                ("userID", "user_id"),
                ("name", "name"),
                ("alias", "alias"),
                ("mail", "mail"),
                ("active", "active"),
                ("trash", "trash"),
                ("ban", "ban"),
                ("globalRoleID", "global_role_id"),
            ],
        )
        .await
    }

    async fn preferences(&self) -> Result<Vec<LegacyPreference>, LegacyError> {
        self.fetch(
            "preferences",
            &[("userID", "user_id"), ("option", "option"), ("value", "value")],
        )
        .await
    }

    async fn customers(&self) -> Result<Vec<LegacyCustomer>, LegacyError> {
        self.fetch(
            "customers",
            &[
                ("customerID", "customer_id"),
                ("name", "name"),
                ("comment", "comment"),
                ("visible", "visible"),
                ("company", "company"),
                ("contact", "contact"),
                ("street", "street"),
                ("zipcode", "zipcode"),
                ("city", "city"),
                ("phone", "phone"),
                ("fax", "fax"),
                ("mobile", "mobile"),
                ("mail", "mail"),
                ("homepage", "homepage"),
                ("trash", "trash"),
                ("timezone", "timezone"),
            ],
        )
        .await
    }

    async fn projects(&self) -> Result<Vec<LegacyProject>, LegacyError> {
        self.fetch(
            "projects",
            &[
                ("projectID", "project_id"),
                ("customerID", "customer_id"),
                ("name", "name"),
                ("comment", "comment"),
                ("visible", "visible"),
                ("trash", "trash"),
                ("budget", "budget"),
            ],
        )
        .await
    }

    async fn activities(&self) -> Result<Vec<LegacyActivity>, LegacyError> {
        self.fetch(
            "activities",
            &[
                ("activityID", "activity_id"),
                ("name", "name"),
                ("comment", "comment"),
                ("visible", "visible"),
                ("trash", "trash"),
            ],
        )
        .await
    }

    async fn project_activities(&self) -> Result<Vec<LegacyProjectActivity>, LegacyError> {
        self.fetch(
            "projects_activities",
            &[
                ("projectID", "project_id"),
                ("activityID", "activity_id"),
                ("budget", "budget"),
            ],
        )
        .await
    }

    async fn timesheets(&self) -> Result<Vec<LegacyTimesheet>, LegacyError> {
        self.fetch(
            "timeSheet",
            &[
                ("timeEntryID", "time_entry_id"),
                ("start", "start"),
                ("end", "end"),
                ("duration", "duration"),
                ("userID", "user_id"),
                ("projectID", "project_id"),
                ("activityID", "activity_id"),
                ("description", "description"),
                ("comment", "comment"),
                ("cleared", "cleared"),
                ("rate", "rate"),
                ("fixedRate", "fixed_rate"),
            ],
        )
        .await
    }

    async fn fixed_rates(&self) -> Result<Vec<LegacyFixedRate>, LegacyError> {
        self.fetch(
            "fixedRates",
            &[
                ("projectID", "project_id"),
                ("activityID", "activity_id"),
                ("rate", "rate"),
            ],
        )
        .await
    }

    async fn rates(&self) -> Result<Vec<LegacyRate>, LegacyError> {
        self.fetch(
            "rates",
            &[
                ("userID", "user_id"),
                ("projectID", "project_id"),
                ("activityID", "activity_id"),
                ("rate", "rate"),
            ],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> SqlSource {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.execute_unprepared(
            "CREATE TABLE kimai_configuration (`option` TEXT PRIMARY KEY, `value` TEXT);
             INSERT INTO kimai_configuration VALUES ('version', '1.0.1'), ('revision', '1388');
             CREATE TABLE kimai_users (
                 userID INTEGER PRIMARY KEY, name TEXT NOT NULL, alias TEXT, mail TEXT,
                 active INTEGER NOT NULL, trash INTEGER NOT NULL, ban INTEGER NOT NULL,
                 globalRoleID INTEGER
             );
             INSERT INTO kimai_users VALUES (1, 'admin', NULL, 'admin@example.com', 1, 0, 0, 1);
             INSERT INTO kimai_users VALUES (2, 'gone', 'Gone', NULL, 1, 1, 0, 2);
             CREATE TABLE kimai_customers (
                 customerID INTEGER PRIMARY KEY, name TEXT, comment TEXT, visible INTEGER NOT NULL,
                 company TEXT, contact TEXT, street TEXT, zipcode TEXT, city TEXT, phone TEXT,
                 fax TEXT, mobile TEXT, mail TEXT, homepage TEXT, trash INTEGER NOT NULL,
                 timezone TEXT
             );
             INSERT INTO kimai_customers (customerID, name, visible, street, zipcode, city, trash, timezone)
                 VALUES (7, 'Acme', 1, 'Main St 1', '12345', 'Springfield', 0, 'Europe/Berlin');",
        )
        .await
        .unwrap();
        SqlSource::new(db, "kimai_")
    }

    #[tokio::test]
    async fn test_configuration_lookup() {
        let source = setup().await;
        assert_eq!(
            source.configuration("version").await.unwrap().as_deref(),
            Some("1.0.1")
        );
        assert_eq!(source.configuration("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_fetch_users_with_aliased_columns() {
        let source = setup().await;
        let users = source.users().await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].user_id, 1);
        assert_eq!(users[0].global_role_id, Some(1));
        assert!(users[0].is_active());
        assert!(!users[1].is_active());
        assert_eq!(users[1].alias.as_deref(), Some("Gone"));
    }

    #[tokio::test]
    async fn test_fetch_customers() {
        let source = setup().await;
        let customers = source.customers().await.unwrap();
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].customer_id, 7);
        assert_eq!(customers[0].city.as_deref(), Some("Springfield"));
        assert_eq!(customers[0].company, None);
    }

    #[tokio::test]
    async fn test_missing_table_names_the_table() {
        let source = setup().await;
        let err = source.rates().await.unwrap_err();
        assert!(matches!(err, LegacyError::Query { ref table, .. } if table == "kimai_rates"));
    }
}
