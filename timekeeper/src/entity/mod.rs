pub mod activity;
pub mod customer;
pub mod project;
pub mod timesheet;
pub mod user;
pub mod user_preference;
