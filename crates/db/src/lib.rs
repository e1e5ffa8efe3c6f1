//! Database bootstrap for Shelf: pooled SQLite connections through SeaORM and
//! the migration runner that applies module-contributed schema.

pub mod migrate;

use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use shelf_kernel::settings::DatabaseSettings;
use shelf_kernel::{InitCtx, Module};

pub use migrate::run_migrations;

/// Errors raised while preparing the database.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("failed to connect to database: {0}")]
    Connect(#[source] DbErr),

    #[error("migration {module}/{id} failed: {source}")]
    Migration {
        module: String,
        id: String,
        #[source]
        source: DbErr,
    },

    #[error(transparent)]
    Query(#[from] DbErr),
}

/// Lifetime for the single pinned connection of an in-memory database;
/// sqlx recycles connections after 30 minutes unless told otherwise.
const PINNED_CONNECTION_LIFETIME: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Open a connection pool for the configured database.
pub async fn connect(settings: &DatabaseSettings) -> Result<DatabaseConnection, DbError> {
    tracing::info!(target: "shelf-db", url = %settings.url, "connecting to database");

    Database::connect(connect_options(settings))
        .await
        .map_err(DbError::Connect)
}

fn connect_options(settings: &DatabaseSettings) -> ConnectOptions {
    let mut opt = ConnectOptions::new(settings.url.clone());

    opt.connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .sqlx_logging(true);

    if settings.is_in_memory() {
        // Every pooled connection to `:memory:` is a separate database, and
        // closing the last one drops it.
        opt.max_connections(1)
            .min_connections(1)
            .idle_timeout(PINNED_CONNECTION_LIFETIME)
            .max_lifetime(PINNED_CONNECTION_LIFETIME);
    } else {
        opt.max_connections(settings.max_connections)
            .min_connections(1)
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(1800));
    }

    opt
}

/// Core module owning the database connection health.
pub struct DbModule;

#[async_trait]
impl Module for DbModule {
    fn name(&self) -> &'static str {
        "db"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        ctx.db.ping().await?;
        tracing::info!(module = self.name(), "database reachable");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "db module stopped");
        Ok(())
    }
}

/// Create a new instance of the db module
pub fn create_module() -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(DbModule)
}
