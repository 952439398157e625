use std::sync::Arc;

use anyhow::Context;

use crate::module::{InitCtx, Module};

/// Core module initialization order. The HTTP server is started separately,
/// after every module has been initialized and started.
const CORE_MODULE_ORDER: &[&str] = &["telemetry", "db"];

/// Registry managing module lifecycle with core/custom separation. Core
/// modules run first in a fixed order; custom (project) modules run in
/// registration order and stop before core modules do.
pub struct ModuleRegistry {
    core_modules: Vec<Arc<dyn Module>>,
    custom_modules: Vec<Arc<dyn Module>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self {
            core_modules: Vec::new(),
            custom_modules: Vec::new(),
        }
    }

    pub fn register_core(&mut self, module: Arc<dyn Module>) {
        self.core_modules.push(module);
    }

    pub fn register_custom(&mut self, module: Arc<dyn Module>) {
        self.custom_modules.push(module);
    }

    /// All registered modules, core first.
    pub fn modules(&self) -> Vec<&Arc<dyn Module>> {
        self.core_modules
            .iter()
            .chain(self.custom_modules.iter())
            .collect()
    }

    pub fn get_module(&self, name: &str) -> Option<&Arc<dyn Module>> {
        self.modules().into_iter().find(|m| m.name() == name)
    }

    /// Core modules in `CORE_MODULE_ORDER`; names with no registered module
    /// are skipped.
    fn ordered_core(&self) -> impl Iterator<Item = &Arc<dyn Module>> {
        CORE_MODULE_ORDER
            .iter()
            .filter_map(|name| self.core_modules.iter().find(|m| m.name() == *name))
    }

    pub async fn init_core_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        for module in self.ordered_core() {
            tracing::info!(module = module.name(), "initializing core module");
            module
                .init(ctx)
                .await
                .with_context(|| format!("failed to initialize core module '{}'", module.name()))?;
        }
        Ok(())
    }

    pub async fn init_custom_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("initializing {} custom modules", self.custom_modules.len());
        for module in &self.custom_modules {
            tracing::info!(module = module.name(), "initializing custom module");
            module.init(ctx).await.with_context(|| {
                format!("failed to initialize custom module '{}'", module.name())
            })?;
        }
        Ok(())
    }

    pub async fn start_core_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        for module in self.ordered_core() {
            tracing::info!(module = module.name(), "starting core module");
            module
                .start(ctx)
                .await
                .with_context(|| format!("failed to start core module '{}'", module.name()))?;
        }
        Ok(())
    }

    pub async fn start_custom_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        for module in &self.custom_modules {
            tracing::info!(module = module.name(), "starting custom module");
            module
                .start(ctx)
                .await
                .with_context(|| format!("failed to start custom module '{}'", module.name()))?;
        }
        Ok(())
    }

    /// Custom modules stop first, in reverse registration order.
    pub async fn stop_custom_modules(&self) -> anyhow::Result<()> {
        for module in self.custom_modules.iter().rev() {
            tracing::info!(module = module.name(), "stopping custom module");
            module
                .stop()
                .await
                .with_context(|| format!("failed to stop custom module '{}'", module.name()))?;
        }
        Ok(())
    }

    pub async fn stop_core_modules(&self) -> anyhow::Result<()> {
        let mut ordered: Vec<_> = self.ordered_core().collect();
        ordered.reverse();
        for module in ordered {
            tracing::info!(module = module.name(), "stopping core module");
            module
                .stop()
                .await
                .with_context(|| format!("failed to stop core module '{}'", module.name()))?;
        }
        Ok(())
    }

    /// Collect all migrations from all modules, tagged with the contributing
    /// module's name and sorted by (module, id) for deterministic ordering.
    pub fn collect_migrations(&self) -> Vec<(String, libris_db::Migration)> {
        let mut migrations = Vec::new();
        for module in self.modules() {
            for migration in module.migrations() {
                migrations.push((module.name().to_string(), migration));
            }
        }
        migrations.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.id.cmp(b.1.id)));
        migrations
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
    use libris_db::{Database, Migration};

    struct ShelfModule {
        name: &'static str,
    }

    #[async_trait::async_trait]
    impl Module for ShelfModule {
        fn name(&self) -> &'static str {
            self.name
        }

        fn migrations(&self) -> Vec<Migration> {
            vec![Migration {
                id: "001_init",
                up: "CREATE TABLE shelf (id INTEGER PRIMARY KEY);",
            }]
        }
    }

    #[test]
    fn empty_registry_has_no_modules_or_migrations() {
        let registry = ModuleRegistry::new();
        assert!(registry.modules().is_empty());
        assert!(registry.collect_migrations().is_empty());
    }

    #[test]
    fn migrations_are_tagged_with_module_name() {
        let mut registry = ModuleRegistry::new();
        registry.register_custom(Arc::new(ShelfModule { name: "shelf" }));

        let migrations = registry.collect_migrations();
        assert_eq!(migrations.len(), 1);
        assert_eq!(migrations[0].0, "shelf");
        assert_eq!(migrations[0].1.id, "001_init");
    }

    #[test]
    fn lookup_by_name_spans_core_and_custom() {
        let mut registry = ModuleRegistry::new();
        registry.register_core(Arc::new(ShelfModule { name: "db" }));
        registry.register_custom(Arc::new(ShelfModule { name: "shelf" }));

        assert!(registry.get_module("db").is_some());
        assert!(registry.get_module("shelf").is_some());
        assert!(registry.get_module("missing").is_none());
    }

    #[tokio::test]
    async fn full_lifecycle_runs_without_error() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::connect(dir.path().join("test.db")).unwrap();
        let settings = Settings::default();
        let ctx = InitCtx {
            settings: &settings,
            db: &db,
        };

        let mut registry = ModuleRegistry::new();
        registry.register_custom(Arc::new(ShelfModule { name: "shelf" }));

        registry.init_core_modules(&ctx).await.unwrap();
        registry.init_custom_modules(&ctx).await.unwrap();
        registry.start_core_modules(&ctx).await.unwrap();
        registry.start_custom_modules(&ctx).await.unwrap();
        registry.stop_custom_modules().await.unwrap();
        registry.stop_core_modules().await.unwrap();
    }
}
