pub use sea_orm_migration::prelude::*;

mod m20250901_000001_create_people;
mod m20250901_000002_create_attendance_and_transactions;
mod m20250905_000001_create_sessions_and_audit_trail;
mod m20251019_000001_create_membership_periods;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250901_000001_create_people::Migration),
            Box::new(m20250901_000002_create_attendance_and_transactions::Migration),
            Box::new(m20250905_000001_create_sessions_and_audit_trail::Migration),
            Box::new(m20251019_000001_create_membership_periods::Migration),
        ]
    }
}
