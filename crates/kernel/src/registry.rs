use anyhow::Context;
use std::sync::Arc;

use crate::module::{InitCtx, Migration, Module};

/// Core module initialization order (HTTP server is started separately)
const CORE_MODULE_ORDER: &[&str] = &[
    "db",    // Database connection and schema
    "authz", // Authentication and ownership guards
];

#[derive(Debug, Clone, Copy)]
enum Group {
    Core,
    Custom,
}

impl Group {
    fn as_str(self) -> &'static str {
        match self {
            Group::Core => "core",
            Group::Custom => "custom",
        }
    }
}

enum Phase<'c, 'a> {
    Init(&'c InitCtx<'a>),
    Start(&'c InitCtx<'a>),
    Stop,
}

impl Phase<'_, '_> {
    fn verb(&self) -> &'static str {
        match self {
            Phase::Init(_) => "initialize",
            Phase::Start(_) => "start",
            Phase::Stop => "stop",
        }
    }
}

/// Module registry for managing module lifecycle with core/custom separation
pub struct ModuleRegistry {
    core_modules: Vec<Arc<dyn Module>>,
    custom_modules: Vec<Arc<dyn Module>>,
}

impl ModuleRegistry {
    /// Create a new module registry
    pub fn new() -> Self {
        Self {
            core_modules: Vec::new(),
            custom_modules: Vec::new(),
        }
    }

    /// Register a core module with the registry
    pub fn register_core(&mut self, module: Arc<dyn Module>) {
        self.core_modules.push(module);
    }

    /// Register a custom module with the registry
    pub fn register_custom(&mut self, module: Arc<dyn Module>) {
        self.custom_modules.push(module);
    }

    /// Get all registered modules (core + custom)
    pub fn modules(&self) -> Vec<&Arc<dyn Module>> {
        let mut all_modules = Vec::new();
        all_modules.extend(self.core_modules.iter());
        all_modules.extend(self.custom_modules.iter());
        all_modules
    }

    /// Get a module by name (searches both core and custom modules)
    pub fn get_module(&self, name: &str) -> Option<&Arc<dyn Module>> {
        self.core_modules
            .iter()
            .find(|module| module.name() == name)
            .or_else(|| {
                self.custom_modules
                    .iter()
                    .find(|module| module.name() == name)
            })
    }

    /// Get the number of core modules
    pub fn core_module_count(&self) -> usize {
        self.core_modules.len()
    }

    /// Get the number of custom modules
    pub fn custom_module_count(&self) -> usize {
        self.custom_modules.len()
    }

    /// Initialize core modules in `CORE_MODULE_ORDER`
    pub async fn init_core_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        self.drive(Group::Core, Phase::Init(ctx)).await
    }

    /// Initialize custom modules in registration order
    pub async fn init_custom_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        self.drive(Group::Custom, Phase::Init(ctx)).await
    }

    pub async fn start_core_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        self.drive(Group::Core, Phase::Start(ctx)).await
    }

    pub async fn start_custom_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        self.drive(Group::Custom, Phase::Start(ctx)).await
    }

    /// Stop custom modules, last registered first
    pub async fn stop_custom_modules(&self) -> anyhow::Result<()> {
        self.drive(Group::Custom, Phase::Stop).await
    }

    /// Stop core modules in reverse `CORE_MODULE_ORDER`
    pub async fn stop_core_modules(&self) -> anyhow::Result<()> {
        self.drive(Group::Core, Phase::Stop).await
    }

    async fn drive(&self, group: Group, phase: Phase<'_, '_>) -> anyhow::Result<()> {
        let mut modules = match group {
            Group::Core => self.ordered_core_modules(),
            Group::Custom => self.custom_modules.iter().collect(),
        };
        if matches!(phase, Phase::Stop) {
            modules.reverse();
        }

        let verb = phase.verb();
        tracing::info!(
            group = group.as_str(),
            count = modules.len(),
            order = ?modules.iter().map(|m| m.name()).collect::<Vec<_>>(),
            "{verb} modules"
        );

        for module in modules {
            tracing::info!(module = module.name(), group = group.as_str(), "{verb} module");

            let result = match &phase {
                Phase::Init(ctx) => module.init(ctx).await,
                Phase::Start(ctx) => module.start(ctx).await,
                Phase::Stop => module.stop().await,
            };
            result.with_context(|| {
                format!("failed to {verb} {} module '{}'", group.as_str(), module.name())
            })?;
        }

        Ok(())
    }

    /// Collect all migrations from all modules (core + custom)
    ///
    /// Core modules come first in `CORE_MODULE_ORDER`, then custom modules in
    /// registration order, so a module may reference tables created by any
    /// module registered before it.
    pub fn collect_migrations(&self) -> Vec<(String, Migration)> {
        let mut migrations = Vec::new();

        let ordered = self
            .ordered_core_modules()
            .into_iter()
            .chain(self.custom_modules.iter());

        for module in ordered {
            for migration in module.migrations() {
                migrations.push((module.name().to_string(), migration));
            }
        }

        migrations
    }

    fn ordered_core_modules(&self) -> Vec<&Arc<dyn Module>> {
        CORE_MODULE_ORDER
            .iter()
            .filter_map(|&name| self.core_modules.iter().find(|m| m.name() == name))
            .collect()
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    struct TestModule {
        name: &'static str,
        migration_ids: &'static [&'static str],
    }

    #[async_trait::async_trait]
    impl Module for TestModule {
        fn name(&self) -> &'static str {
            self.name
        }

        fn migrations(&self) -> Vec<Migration> {
            self.migration_ids
                .iter()
                .map(|&id| Migration {
                    id,
                    up: "CREATE TABLE test (id INTEGER);",
                })
                .collect()
        }
    }

    #[test]
    fn test_module_registry_creation() {
        let registry = ModuleRegistry::new();
        assert!(registry.modules().is_empty()); // No modules registered yet
    }

    #[test]
    fn test_migration_collection_is_empty_without_modules() {
        let registry = ModuleRegistry::new();
        assert!(registry.collect_migrations().is_empty());
    }

    #[test]
    fn migrations_follow_core_order_then_registration_order() {
        let mut registry = ModuleRegistry::new();
        registry.register_custom(Arc::new(TestModule {
            name: "users",
            migration_ids: &["001_init"],
        }));
        registry.register_custom(Arc::new(TestModule {
            name: "books",
            migration_ids: &["001_init", "002_index"],
        }));
        registry.register_core(Arc::new(TestModule {
            name: "authz",
            migration_ids: &["001_init"],
        }));
        registry.register_core(Arc::new(TestModule {
            name: "db",
            migration_ids: &["001_init"],
        }));

        let order: Vec<(String, &str)> = registry
            .collect_migrations()
            .into_iter()
            .map(|(module, migration)| (module, migration.id))
            .collect();

        assert_eq!(
            order,
            vec![
                ("db".to_string(), "001_init"),
                ("authz".to_string(), "001_init"),
                ("users".to_string(), "001_init"),
                ("books".to_string(), "001_init"),
                ("books".to_string(), "002_index"),
            ]
        );
    }

    #[test]
    fn get_module_searches_core_and_custom() {
        let mut registry = ModuleRegistry::new();
        registry.register_core(Arc::new(TestModule {
            name: "db",
            migration_ids: &[],
        }));
        registry.register_custom(Arc::new(TestModule {
            name: "books",
            migration_ids: &[],
        }));

        assert!(registry.get_module("db").is_some());
        assert!(registry.get_module("books").is_some());
        assert!(registry.get_module("missing").is_none());
        assert_eq!(registry.core_module_count(), 1);
        assert_eq!(registry.custom_module_count(), 1);
    }

    #[tokio::test]
    async fn test_module_lifecycle() {
        let mut registry = ModuleRegistry::new();
        let settings = Settings::default();
        let db = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
        let ctx = InitCtx {
            settings: &settings,
            db: &db,
        };

        registry.register_custom(Arc::new(TestModule {
            name: "test",
            migration_ids: &[],
        }));

        registry.init_core_modules(&ctx).await.unwrap();
        registry.init_custom_modules(&ctx).await.unwrap();
        registry.start_core_modules(&ctx).await.unwrap();
        registry.start_custom_modules(&ctx).await.unwrap();
        registry.stop_custom_modules().await.unwrap();
        registry.stop_core_modules().await.unwrap();
    }

    struct Recorder {
        name: &'static str,
        log: Arc<std::sync::Mutex<Vec<String>>>,
    }

    #[async_trait::async_trait]
    impl Module for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
            self.log.lock().unwrap().push(format!("init {}", self.name));
            Ok(())
        }

        async fn stop(&self) -> anyhow::Result<()> {
            self.log.lock().unwrap().push(format!("stop {}", self.name));
            Ok(())
        }
    }

    #[tokio::test]
    async fn stop_runs_in_reverse_order() {
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut registry = ModuleRegistry::new();
        for name in ["users", "books", "reviews"] {
            registry.register_custom(Arc::new(Recorder {
                name,
                log: log.clone(),
            }));
        }

        let settings = Settings::default();
        let db = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
        let ctx = InitCtx {
            settings: &settings,
            db: &db,
        };

        registry.init_custom_modules(&ctx).await.unwrap();
        registry.stop_custom_modules().await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "init users",
                "init books",
                "init reviews",
                "stop reviews",
                "stop books",
                "stop users",
            ]
        );
    }
}
