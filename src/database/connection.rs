use std::sync::Arc;
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::error::AppResult;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

/// Shared handle to the connection pool. Services clone the `Arc`, not the
/// connection itself.
pub type DbPool = Arc<DatabaseConnection>;

pub async fn create_pool(config: &DatabaseConfig) -> AppResult<DbPool> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let pool = Database::connect(options).await?;
    Ok(Arc::new(pool))
}

pub async fn run_migrations(pool: &DatabaseConnection) -> AppResult<()> {
    Migrator::up(pool, None).await?;
    Ok(())
}

/// Transactions a mock pool has recorded. Every service holding the pool
/// must be dropped first.
#[cfg(test)]
pub(crate) fn statement_log(pool: DbPool) -> Vec<sea_orm::Transaction> {
    match Arc::try_unwrap(pool) {
        Ok(conn) => conn.into_transaction_log(),
        Err(_) => panic!("mock pool is still shared"),
    }
}

/// One entry per statement a mock pool ran, SQL followed by its bound
/// values, e.g. `INSERT INTO "users" (...) VALUES ($1, ...)", values:
/// Some(Values([String(Some("Rina")), ...]))`.
#[cfg(test)]
pub(crate) fn executed_statements(pool: DbPool) -> Vec<String> {
    statement_log(pool)
        .iter()
        .flat_map(|txn| {
            format!("{txn:?}")
                .replace("\\\"", "\"")
                .split("Statement { sql: \"")
                .skip(1)
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}
