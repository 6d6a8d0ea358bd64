pub use sea_orm_migration::prelude::*;

mod m20251101_000001_create_catalog;
mod m20251101_000002_create_transactions;
mod m20251101_000003_create_refresh_tokens;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251101_000001_create_catalog::Migration),
            Box::new(m20251101_000002_create_transactions::Migration),
            Box::new(m20251101_000003_create_refresh_tokens::Migration),
        ]
    }
}
