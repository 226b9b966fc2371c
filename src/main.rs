use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wsrs::{
    message::repository::{InMemoryMessageRepository, MessageRepository, PostgresMessageRepository},
    room::repository::{InMemoryRoomRepository, PostgresRoomRepository, RoomRepository},
    AppConfig, AppState, EventDispatcher, RoomHub,
};

type Repositories = (
    Arc<dyn RoomRepository + Send + Sync>,
    Arc<dyn MessageRepository + Send + Sync>,
);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wsrs=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Q&A room server");

    let config = AppConfig::from_env()?;
    let (room_repository, message_repository) = repositories(&config).await?;

    let hub = RoomHub::new(config.write_timeout);
    let (publisher, dispatcher) = EventDispatcher::spawn(hub.clone());
    let shutdown = CancellationToken::new();

    let app_state = AppState::new(
        room_repository,
        message_repository,
        hub,
        publisher,
        shutdown.clone(),
    );
    let app = wsrs::build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    // Connection tasks release their publisher clones once cancelled
    match tokio::time::timeout(Duration::from_secs(5), dispatcher).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "Event dispatcher task failed"),
        Err(_) => warn!("Event dispatcher still running at shutdown"),
    }
    info!("Server stopped");
    Ok(())
}

async fn repositories(config: &AppConfig) -> Result<Repositories, Box<dyn std::error::Error>> {
    let Some(database_url) = &config.database_url else {
        info!("No database configured, using in-memory storage");
        return Ok((
            Arc::new(InMemoryRoomRepository::new()),
            Arc::new(InMemoryMessageRepository::new()),
        ));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!(max_connections = config.max_connections, "Connected to PostgreSQL");

    Ok((
        Arc::new(PostgresRoomRepository::new(pool.clone())),
        Arc::new(PostgresMessageRepository::new(pool)),
    ))
}

/// Resolves on Ctrl+C and cancels every live connection
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received, closing live connections");
    shutdown.cancel();
}
