use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};
use uuid::Uuid;

use super::{StoreError, non_empty};
use crate::entity::customer;
use crate::validation::{Validate, Violations};

#[derive(Debug, Clone, Default)]
pub struct NewCustomer {
    pub name: String,
    pub company: Option<String>,
    pub contact: Option<String>,
    pub address: Option<String>,
    pub country: String,
    pub currency: String,
    pub timezone: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub fax: Option<String>,
    pub mobile: Option<String>,
    pub homepage: Option<String>,
    pub comment: Option<String>,
    pub visible: bool,
    pub synthesized: bool,
}

impl NewCustomer {
    pub async fn insert<C: ConnectionTrait>(self, conn: &C) -> Result<customer::Model, StoreError> {
        self.validate().map_err(|violations| StoreError::Invalid {
            entity: "customer",
            name: self.name.clone(),
            violations,
        })?;

        let model = customer::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(self.name),
            company: Set(non_empty(self.company)),
            contact: Set(non_empty(self.contact)),
            address: Set(non_empty(self.address)),
            country: Set(self.country),
            currency: Set(self.currency),
            timezone: Set(self.timezone),
            email: Set(non_empty(self.email)),
            phone: Set(non_empty(self.phone)),
            fax: Set(non_empty(self.fax)),
            mobile: Set(non_empty(self.mobile)),
            homepage: Set(non_empty(self.homepage)),
            comment: Set(non_empty(self.comment)),
            visible: Set(self.visible),
            synthesized: Set(self.synthesized),
            created_at: Set(Utc::now().naive_utc()),
        }
        .insert(conn)
        .await?;
        Ok(model)
    }
}

impl Validate for NewCustomer {
    fn validate(&self) -> Result<(), Violations> {
        let mut v = Violations::new();
        v.not_blank("name", &self.name)
            .length("name", &self.name, 1, 150)
            .country("country", &self.country)
            .currency("currency", &self.currency)
            .timezone("timezone", &self.timezone)
            .email("email", self.email.as_deref().filter(|e| !e.trim().is_empty()));
        v.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> NewCustomer {
        NewCustomer {
            name: "Acme".into(),
            country: "DE".into(),
            currency: "EUR".into(),
            timezone: "Europe/Berlin".into(),
            visible: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_customer() {
        assert!(draft().validate().is_ok());
    }

    #[test]
    fn test_customer_constraints() {
        let mut customer = draft();
        customer.name = " ".into();
        customer.country = "Deutschland".into();
        customer.currency = "eur".into();
        customer.timezone = "Nowhere/Town".into();
        customer.email = Some("nope".into());

        let violations = customer.validate().unwrap_err();
        for field in ["name", "country", "currency", "timezone", "email"] {
            assert!(violations.has_field(field), "missing violation for {field}");
        }
    }

    #[test]
    fn test_blank_email_is_ignored() {
        let mut customer = draft();
        customer.email = Some(String::new());
        assert!(customer.validate().is_ok());
    }
}
