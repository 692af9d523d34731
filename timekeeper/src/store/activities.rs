use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};
use uuid::Uuid;

use super::{StoreError, non_empty};
use crate::entity::activity;
use crate::validation::{Validate, Violations};

#[derive(Debug, Clone)]
pub struct NewActivity {
    /// `None` creates a global activity.
    pub project_id: Option<Uuid>,
    pub name: String,
    pub comment: Option<String>,
    pub visible: bool,
    pub budget: f64,
    pub fixed_rate: Option<f64>,
    pub hourly_rate: Option<f64>,
    pub synthesized: bool,
}

impl NewActivity {
    pub fn new(project_id: Option<Uuid>, name: impl Into<String>) -> Self {
        Self {
            project_id,
            name: name.into(),
            comment: None,
            visible: true,
            budget: 0.0,
            fixed_rate: None,
            hourly_rate: None,
            synthesized: false,
        }
    }

    pub async fn insert<C: ConnectionTrait>(self, conn: &C) -> Result<activity::Model, StoreError> {
        self.validate().map_err(|violations| StoreError::Invalid {
            entity: "activity",
            name: self.name.clone(),
            violations,
        })?;

        let model = activity::ActiveModel {
            id: Set(Uuid::now_v7()),
            project_id: Set(self.project_id),
            name: Set(self.name),
            comment: Set(non_empty(self.comment)),
            visible: Set(self.visible),
            budget: Set(self.budget),
            fixed_rate: Set(self.fixed_rate),
            hourly_rate: Set(self.hourly_rate),
            synthesized: Set(self.synthesized),
            created_at: Set(Utc::now().naive_utc()),
        }
        .insert(conn)
        .await?;
        Ok(model)
    }
}

impl Validate for NewActivity {
    fn validate(&self) -> Result<(), Violations> {
        let mut v = Violations::new();
        v.not_blank("name", &self.name)
            .length("name", &self.name, 1, 150)
            .non_negative("budget", Some(self.budget))
            .non_negative("fixed_rate", self.fixed_rate)
            .non_negative("hourly_rate", self.hourly_rate);
        v.into_result()
    }
}
