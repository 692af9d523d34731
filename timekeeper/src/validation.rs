//! Constraint checks run on every draft before it is written to the store.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono_tz::Tz;
use regex::Regex;
use thiserror::Error;

pub trait Validate {
    fn validate(&self) -> Result<(), Violations>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// A non-empty list of constraint violations once returned as an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", join(.0))]
pub struct Violations(Vec<Violation>);

fn join(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(Violation {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|v| v.field == field)
    }

    pub fn into_result(self) -> Result<(), Violations> {
        if self.0.is_empty() { Ok(()) } else { Err(self) }
    }

    pub fn not_blank(&mut self, field: &'static str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.add(field, "must not be blank");
        }
        self
    }

    pub fn length(&mut self, field: &'static str, value: &str, min: usize, max: usize) -> &mut Self {
        let len = value.chars().count();
        if len < min || len > max {
            self.add(
                field,
                format!("length must be between {min} and {max} characters, got {len}"),
            );
        }
        self
    }

    pub fn country(&mut self, field: &'static str, value: &str) -> &mut Self {
        if !country_regex().is_match(value) {
            self.add(field, format!("'{value}' is not a two-letter country code"));
        }
        self
    }

    pub fn currency(&mut self, field: &'static str, value: &str) -> &mut Self {
        if !currency_regex().is_match(value) {
            self.add(field, format!("'{value}' is not a three-letter currency code"));
        }
        self
    }

    pub fn timezone(&mut self, field: &'static str, value: &str) -> &mut Self {
        if Tz::from_str(value).is_err() {
            self.add(field, format!("unknown timezone '{value}'"));
        }
        self
    }

    pub fn email(&mut self, field: &'static str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value
            && !email_regex().is_match(value)
        {
            self.add(field, format!("'{value}' is not a valid email address"));
        }
        self
    }

    pub fn non_negative(&mut self, field: &'static str, value: Option<f64>) -> &mut Self {
        if let Some(value) = value
            && (value.is_nan() || value < 0.0)
        {
            self.add(field, format!("must not be negative, got {value}"));
        }
        self
    }
}

fn country_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[A-Z]{2}$").unwrap())
}

fn currency_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[A-Z]{3}$").unwrap())
}

fn email_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_violations_are_ok() {
        assert!(Violations::new().into_result().is_ok());
    }

    #[test]
    fn test_not_blank() {
        let mut v = Violations::new();
        v.not_blank("name", "   ");
        assert!(v.has_field("name"));
        assert_eq!(v.len(), 1);
    }

    #[test]
    fn test_country_and_currency_codes() {
        let mut v = Violations::new();
        v.country("country", "DE").currency("currency", "EUR");
        assert!(v.is_empty());

        v.country("country", "de").currency("currency", "EURO");
        assert!(v.has_field("country"));
        assert!(v.has_field("currency"));
    }

    #[test]
    fn test_timezone() {
        let mut v = Violations::new();
        v.timezone("timezone", "Europe/Berlin");
        assert!(v.is_empty());
        v.timezone("timezone", "Mars/Olympus");
        assert!(v.has_field("timezone"));
    }

    #[test]
    fn test_email_is_optional() {
        let mut v = Violations::new();
        v.email("email", None).email("email", Some("foo@bar.com"));
        assert!(v.is_empty());
        v.email("email", Some("not-an-address"));
        assert!(v.has_field("email"));
    }

    #[test]
    fn test_display_joins_violations() {
        let mut v = Violations::new();
        v.add("name", "must not be blank");
        v.add("country", "bad");
        assert_eq!(v.to_string(), "name: must not be blank; country: bad");
    }
}
