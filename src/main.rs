mod civil_time;
mod db;
mod device;
mod error;
mod middleware;
mod notification;
mod plan;
mod push;
mod routes;
mod schedule;
mod settings;
mod state;

use anyhow::Context;
use db::{create_pool, run_migrations};
use notification::start_dispatcher_service;
use routes::create_router;
use state::{AppState, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,contribution_reminders=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Configuration problems abort before any data is touched
    let config = Config::from_env()?;
    tracing::info!(
        "Civil timezone offset: {}",
        config.civil_zone.offset()
    );

    tracing::info!("Connecting to database...");
    let db = create_pool(&config.database_url)
        .await
        .context("failed to connect to database")?;

    tracing::info!("Running migrations...");
    run_migrations(&db).await.context("failed to run migrations")?;

    let state = AppState::new(db, config)?;

    // The scheduler keeps running for as long as this handle lives
    let _dispatcher = start_dispatcher_service(state.clone()).await?;

    let app = create_router(state);

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
