use odonto::{AppState, create_router, database, load_config, services::users};
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("odonto=debug,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_config()?;
    tracing::info!("Loaded configuration:\n{}", config);

    let pool = database::connect(&config.database).await?;
    database::run_migrations(&pool).await?;

    {
        let mut conn = pool.acquire().await?;
        if users::seed_default_accounts(&mut conn, &config.seed).await? {
            tracing::warn!("default test accounts created; disable seeding in production");
        }
    }

    let bind_address = config.server.bind_address();
    let state = AppState::new(pool, config);
    state.uploads.init().await?;

    let app = create_router(state);

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!("listening on {}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
