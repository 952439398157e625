use anyhow::Context;
use libris_app::modules;
use libris_db::Database;
use libris_kernel::{settings::Settings, InitCtx, ModuleRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load libris settings")?;
    libris_telemetry::init(&settings.telemetry);

    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.path,
        "libris-app bootstrap starting"
    );

    let db = Database::connect(&settings.database.path)
        .with_context(|| "failed to open the database")?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, db.clone());

    let ctx = InitCtx {
        settings: &settings,
        db: &db,
    };
    registry.init_core_modules(&ctx).await?;
    registry.init_custom_modules(&ctx).await?;

    {
        let conn = db
            .session()
            .with_context(|| "failed to open a migration session")?;
        libris_db::run_migrations(&conn, &registry.collect_migrations())
            .with_context(|| "failed to run migrations")?;
    }

    registry.start_core_modules(&ctx).await?;
    registry.start_custom_modules(&ctx).await?;

    tracing::info!("libris-app bootstrap complete");
    libris_http::start_server(&registry, &settings).await?;

    registry.stop_custom_modules().await?;
    registry.stop_core_modules().await?;
    Ok(())
}
