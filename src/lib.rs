use axum::{Router, http::HeaderName, middleware};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::{DefaultOnResponse, TraceLayer},
};
use tower_sessions::{SessionManagerLayer, SessionStore};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod cache;
pub mod config;
pub mod csrf;
pub mod deletion;
pub mod error;
pub mod handlers;
pub mod limiter;
pub mod models;
pub mod pagination;
pub mod repository;
pub mod storage;

// Module for routing segregation (Public, Admin).
pub mod routes;
use routes::{admin, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the main application entry point (main.rs).
pub use cache::ResponseCache;
pub use config::AppConfig;
pub use limiter::RateLimiter;
pub use repository::{PostgresRepository, RepositoryState};
pub use storage::{LocalDiskStorage, MockStorageService, StorageState};

/// AppState
///
/// The single, thread-safe container holding all application services and
/// configuration, shared across all incoming requests. The rate limiter and
/// the response cache live here too: they are created once at startup and
/// injected, never reached through module-level globals, so tests can build
/// and tear down their own instances.
#[derive(Clone)]
pub struct AppState {
    /// Repository layer: abstracts database access.
    pub repo: RepositoryState,
    /// Storage layer: abstracts upload persistence.
    pub storage: StorageState,
    /// The loaded, immutable environment configuration.
    pub config: AppConfig,
    /// Fixed-window request counters, shared by the rate-limit middleware.
    pub limiter: RateLimiter,
    /// Long-lived page cache, shared by the caching middleware.
    pub cache: ResponseCache,
}

/// create_router
///
/// Assembles the application's routing structure and applies the uniform
/// cross-cutting stack around every handler. Request flow, outermost first:
/// observability → rate limiter → response cache → session layer → handler.
/// A 429 therefore costs no handler work, and a cache hit never reaches the
/// handler either.
///
/// The session layer is injected so the binary can use the Postgres-backed
/// store while tests run against the in-memory one.
pub fn create_router<Store>(state: AppState, sessions: SessionManagerLayer<Store>) -> Router
where
    Store: SessionStore + Clone,
{
    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        // Public pages.
        .merge(public::public_routes())
        // Admin area, gated per-handler via RequireAdmin.
        .nest("/admin", admin::admin_routes())
        // Stored photos served back from the upload directory.
        .nest_service("/uploads", ServeDir::new(state.config.upload_dir.clone()))
        // Every unmatched route renders the 404 page.
        .fallback(handlers::not_found)
        .with_state(state.clone());

    base_router
        // Innermost of the cross-cutting layers: handlers need the session.
        .layer(sessions)
        // Cache lookup; a fresh hit ends the request here.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            cache::response_cache,
        ))
        // Quota check; over-quota callers end the request here.
        .layer(middleware::from_fn_with_state(state, limiter::rate_limit))
        // Observability and correlation layers (applied outermost).
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
}

/// trace_span_logger
///
/// Helper used by `TraceLayer` to create the per-request span, carrying the
/// generated request id so every log line of one request correlates.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
