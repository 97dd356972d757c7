use item_vault::{
    AppState, bootstrap_superuser,
    auth::{IdentityState, JwtCookieProvider},
    config::{AppConfig, Env},
    create_router,
    repository::{RepositoryState, SqliteRepository, connect_pool, run_migrations},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, initialises logging, opens and migrates the database, seeds the
/// optional first superuser, and serves HTTP until the process is stopped.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast on missing production secrets)
    dotenv::dotenv().ok();
    let config = AppConfig::load().expect("FATAL: invalid configuration");

    // 2. Logging: RUST_LOG wins, otherwise a development default.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "item_vault=debug,tower_http=info,sqlx=warn".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Storage
    let pool = connect_pool(&config.db_url, 5)
        .await
        .expect("FATAL: Failed to open the database. Check DATABASE_URL.");
    run_migrations(&pool)
        .await
        .expect("FATAL: Failed to apply database migrations.");

    let repo = Arc::new(SqliteRepository::new(pool)) as RepositoryState;

    // 4. Identity Provider, sharing the same repository handle.
    let identity = Arc::new(JwtCookieProvider::new(
        repo.clone(),
        &config.session_secret,
        config.session_lifetime_secs,
    )) as IdentityState;

    let app_state = AppState {
        repo,
        identity,
        config: config.clone(),
    };

    if let Some(seed) = &config.first_superuser {
        match bootstrap_superuser(&app_state, seed).await {
            Ok(true) => {}
            Ok(false) => tracing::info!("first superuser already present"),
            Err(e) => tracing::error!("failed to create first superuser: {}", e),
        }
    }

    // 5. Router and Server Startup
    let app = create_router(app_state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .expect("FATAL: Failed to bind listener. Check BIND_ADDR.");

    tracing::info!("Listening on {}", config.bind_addr);
    tracing::info!(
        "API Documentation (Swagger UI) available at: http://{}/swagger-ui",
        config.bind_addr
    );

    axum::serve(listener, app).await.expect("FATAL: server error");
}
