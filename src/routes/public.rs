use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Anonymous pages. The listing routes also take POST: each listing carries
/// per-record delete forms, and the deletion service decides internally
/// whether a submission does anything. Methods not registered here are
/// answered with 405 by the router itself.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // Landing page; shows admin affordances when a session is present.
        .route("/", get(handlers::home_page))
        // GET /about
        .route("/about", get(handlers::about_page))
        // GET/POST /catalog/{category}?page=N
        // Paginated catalog for one category code; POST carries a delete form.
        .route(
            "/catalog/{category}",
            get(handlers::catalog_page).post(handlers::catalog_page),
        )
        // GET/POST /news?page=N
        // Paginated news feed; POST carries a delete form.
        .route("/news", get(handlers::news_page).post(handlers::news_page))
}
