use shop_portal::{
    AppState, RateLimiter, ResponseCache,
    auth::SESSION_COOKIE_NAME,
    config::{AppConfig, Env},
    create_router,
    repository::{PostgresRepository, RepositoryState},
    storage::{LocalDiskStorage, StorageService, StorageState},
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_sessions::{Expiry, SessionManagerLayer, cookie};
use tower_sessions_sqlx_store::PostgresStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// The asynchronous entry point, responsible for initializing all core
/// components: configuration, logging, database, upload storage, sessions,
/// and the HTTP server.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (fail-fast).
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging filter setup. RUST_LOG wins; the default keeps the
    // application chatty and the HTTP plumbing quieter.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shop_portal=debug,tower_http=info,axum=trace".into());

    // 3. Log format selected by environment: pretty locally, JSON for
    // aggregators in production.
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

    // 4. Database initialization (Postgres).
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    let repo = Arc::new(PostgresRepository::new(pool.clone())) as RepositoryState;

    // 5. Upload storage: the configured directory must exist before the
    // first photo arrives.
    let disk = LocalDiskStorage::new(config.upload_dir.clone());
    disk.ensure_upload_dir()
        .await
        .expect("FATAL: Failed to create the upload directory.");
    let storage = Arc::new(disk) as StorageState;

    // 6. Sessions: Postgres-backed store, opaque cookie id only.
    let session_store = PostgresStore::new(pool);
    session_store
        .migrate()
        .await
        .expect("FATAL: Failed to prepare the session table.");

    let sessions = SessionManagerLayer::new(session_store)
        .with_name(SESSION_COOKIE_NAME)
        .with_secure(config.env == Env::Production)
        .with_http_only(true)
        .with_same_site(cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(cookie::time::Duration::days(1)));

    // 7. Unified state assembly. Limiter and cache are created here, once.
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState {
        repo,
        storage,
        config,
        limiter: RateLimiter::new(),
        cache: ResponseCache::new(),
    };

    // 8. Router and server startup. ConnectInfo supplies the peer address
    // the rate limiter falls back to when no proxy headers are present.
    let app = create_router(app_state, sessions);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind the listen address.");

    tracing::info!("HTTP server bound successfully.");
    tracing::info!("Listening on {bind_addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("FATAL: Server terminated unexpectedly.");
}
