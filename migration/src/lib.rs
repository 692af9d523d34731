pub use sea_orm_migration::prelude::*;

mod m20260901_000001_create_users;
mod m20260901_000002_create_customers;
mod m20260901_000003_create_projects;
mod m20260901_000004_create_activities;
mod m20260902_000005_create_timesheets;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260901_000001_create_users::Migration),
            Box::new(m20260901_000002_create_customers::Migration),
            Box::new(m20260901_000003_create_projects::Migration),
            Box::new(m20260901_000004_create_activities::Migration),
            Box::new(m20260902_000005_create_timesheets::Migration),
        ]
    }
}
