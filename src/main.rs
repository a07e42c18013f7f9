use std::time::Duration;

use anyhow::Context;
use shelf_app::modules;
use shelf_db::Database;
use shelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load shelf settings")?;
    shelf_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        database = ?settings.database,
        "shelf-app bootstrap starting"
    );

    let db = Database::connect(
        settings.database.url()?,
        Duration::from_millis(settings.database.statement_timeout_ms),
    )
    .await?;

    let ctx = InitCtx {
        settings: &settings,
        db: &db,
    };

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &ctx);
    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    tracing::info!("shelf-app bootstrap complete");

    let served = shelf_http::start_server(&registry, &settings, shutdown_signal()).await;

    registry.stop_all().await?;
    db.close().await;
    served
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
