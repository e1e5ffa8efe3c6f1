//! Application assembly: registry, database, migrations and the serve loop.

use anyhow::Context;
use shelf_kernel::settings::Settings;
use shelf_kernel::{AppState, ModuleRegistry};

use crate::modules;

/// Registry with the core modules followed by the application modules.
pub fn build_registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    registry.register_core(shelf_db::create_module());
    registry.register_core(shelf_authz::create_module());
    modules::register_all(&mut registry);
    registry
}

/// Apply pending migrations; returns how many ran.
pub async fn migrate(registry: &ModuleRegistry, state: &AppState) -> anyhow::Result<usize> {
    let migrations = registry.collect_migrations();
    let applied = shelf_db::run_migrations(&state.db, &migrations)
        .await
        .context("failed to apply migrations")?;
    tracing::info!(applied, total = migrations.len(), "migrations up to date");
    Ok(applied)
}

/// Connect, migrate and initialize every module.
pub async fn prepare(settings: Settings) -> anyhow::Result<(ModuleRegistry, AppState)> {
    let db = shelf_db::connect(&settings.database)
        .await
        .context("failed to connect to database")?;
    let state = AppState::new(settings, db);
    let registry = build_registry();

    migrate(&registry, &state).await?;

    let ctx = state.init_ctx();
    registry.init_core_modules(&ctx).await?;
    registry.init_custom_modules(&ctx).await?;

    Ok((registry, state))
}

/// Run the HTTP server until a shutdown signal arrives.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let (registry, state) = prepare(settings).await?;

    let ctx = state.init_ctx();
    registry.start_core_modules(&ctx).await?;
    registry.start_custom_modules(&ctx).await?;

    let served = shelf_http::start_server(&registry, &state).await;

    registry.stop_custom_modules().await?;
    registry.stop_core_modules().await?;
    served
}
