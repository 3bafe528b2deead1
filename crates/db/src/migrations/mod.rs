//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250301_000001_create_user_table;
mod m20250301_000002_create_event_table;
mod m20250301_000003_create_registration_table;
mod m20250301_000004_create_activity_log_table;
mod m20250301_000005_create_admin_role_table;
mod m20250301_000006_create_pending_deletion_table;
mod m20250301_000007_create_archived_user_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_user_table::Migration),
            Box::new(m20250301_000002_create_event_table::Migration),
            Box::new(m20250301_000003_create_registration_table::Migration),
            Box::new(m20250301_000004_create_activity_log_table::Migration),
            Box::new(m20250301_000005_create_admin_role_table::Migration),
            Box::new(m20250301_000006_create_pending_deletion_table::Migration),
            Box::new(m20250301_000007_create_archived_user_table::Migration),
        ]
    }
}
