use std::time::Duration;

use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, DatabaseConnection};

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "tally={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let db = match connect(&settings.database).await {
        Ok(db) => db,
        Err(err) => {
            tracing::error!("failed to initialize database: {err}");
            return Err(err);
        }
    };

    let engine = match engine::Engine::builder()
        .database(db.clone())
        .query_timeout(settings.database.query_timeout_ms.map(Duration::from_millis))
        .build()
        .await
    {
        Ok(engine) => engine,
        Err(err) => {
            tracing::error!("failed to build engine: {err}");
            return Err(err.into());
        }
    };

    let listener = tokio::net::TcpListener::bind(settings.server.address()).await?;
    server::run_with_listener(engine, db, listener).await?;

    Ok(())
}

async fn connect(
    config: &settings::Database,
) -> Result<DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let mut options = ConnectOptions::new(config.url());
    options
        .max_connections(config.effective_max_connections())
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs));
    tracing::debug!(
        kind = ?config.kind,
        max_connections = config.effective_max_connections(),
        "connecting to database"
    );

    let database = sea_orm::Database::connect(options).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
