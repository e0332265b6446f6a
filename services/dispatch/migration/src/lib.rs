use sea_orm_migration::prelude::*;

mod m20250301_000001_create_tenants;
mod m20250301_000002_create_messages;
mod m20250301_000003_create_auto_reply_rules;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_tenants::Migration),
            Box::new(m20250301_000002_create_messages::Migration),
            Box::new(m20250301_000003_create_auto_reply_rules::Migration),
        ]
    }
}
