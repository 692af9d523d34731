use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::Utc;
use chrono_tz::Tz;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use super::{StoreError, non_empty};
use crate::entity::user::Role;
use crate::entity::{user, user_preference};
use crate::validation::{Validate, Violations};

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub alias: Option<String>,
    pub email: Option<String>,
    pub password_hash: String,
    pub role: Role,
    pub enabled: bool,
    pub synthesized: bool,
    /// name → value; one row per name.
    pub preferences: BTreeMap<String, String>,
}

impl NewUser {
    pub fn new(username: impl Into<String>, password_hash: String, role: Role) -> Self {
        Self {
            username: username.into(),
            alias: None,
            email: None,
            password_hash,
            role,
            enabled: true,
            synthesized: false,
            preferences: BTreeMap::new(),
        }
    }

    pub fn preference(mut self, name: &str, value: impl Into<String>) -> Self {
        self.preferences.insert(name.to_string(), value.into());
        self
    }

    pub async fn insert<C: ConnectionTrait>(self, conn: &C) -> Result<user::Model, StoreError> {
        self.validate().map_err(|violations| StoreError::Invalid {
            entity: "user",
            name: self.username.clone(),
            violations,
        })?;

        let model = user::ActiveModel {
            id: Set(Uuid::now_v7()),
            username: Set(self.username),
            alias: Set(non_empty(self.alias)),
            email: Set(non_empty(self.email)),
            password_hash: Set(self.password_hash),
            role: Set(self.role.as_str().to_string()),
            enabled: Set(self.enabled),
            synthesized: Set(self.synthesized),
            created_at: Set(Utc::now().naive_utc()),
        }
        .insert(conn)
        .await?;

        for (name, value) in self.preferences {
            user_preference::ActiveModel {
                id: Set(Uuid::now_v7()),
                user_id: Set(model.id),
                name: Set(name),
                value: Set(Some(value)),
            }
            .insert(conn)
            .await?;
        }

        Ok(model)
    }
}

impl Validate for NewUser {
    fn validate(&self) -> Result<(), Violations> {
        let mut v = Violations::new();
        v.not_blank("username", &self.username)
            .length("username", &self.username, 2, 60)
            .not_blank("password", &self.password_hash)
            .email("email", self.email.as_deref().filter(|e| !e.trim().is_empty()));

        if let Some(alias) = &self.alias
            && alias.chars().count() > 60
        {
            v.add("alias", "must not exceed 60 characters");
        }

        for (name, value) in &self.preferences {
            if name.trim().is_empty() {
                v.add("preferences", "preference name must not be blank");
            }
            if name == user_preference::TIMEZONE {
                v.timezone("preferences.timezone", value);
            }
            if name == user_preference::HOURLY_RATE {
                match value.trim().parse::<f64>() {
                    Ok(rate) => {
                        v.non_negative("preferences.hourly_rate", Some(rate));
                    }
                    Err(_) => v.add("preferences.hourly_rate", format!("'{value}' is not a number")),
                }
            }
        }

        v.into_result()
    }
}

pub async fn find_by_username<C: ConnectionTrait>(
    conn: &C,
    username: &str,
) -> Result<Option<user::Model>, DbErr> {
    user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(conn)
        .await
}

pub async fn preference<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    name: &str,
) -> Result<Option<user_preference::Model>, DbErr> {
    user_preference::Entity::find()
        .filter(user_preference::Column::UserId.eq(user_id))
        .filter(user_preference::Column::Name.eq(name))
        .one(conn)
        .await
}

/// The user's timezone preference, or `default` when unset or unknown.
pub async fn timezone<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    default: Tz,
) -> Result<Tz, DbErr> {
    let tz = preference(conn, user_id, user_preference::TIMEZONE)
        .await?
        .and_then(|p| p.value)
        .and_then(|v| Tz::from_str(&v).ok())
        .unwrap_or(default);
    Ok(tz)
}
