//! Timekeeper - Kimai v1 migration and timesheet statistics
//!
//! This library provides the target store, the legacy importer and the
//! aggregation engine used by the `timekeeper` binary.

pub mod auth;
pub mod entity;
pub mod importer;
pub mod legacy;
pub mod rates;
pub mod rounding;
pub mod settings;
pub mod stats;
pub mod store;
pub mod validation;
