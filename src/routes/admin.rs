use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// The login pair is reachable anonymously; every other handler here starts
/// with the `RequireAdmin` extractor, so an unauthenticated request is
/// redirected to `/admin/login` before any handler logic runs.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET/POST /admin/login
        .route(
            "/login",
            get(handlers::login_page).post(handlers::login_submit),
        )
        // GET /admin/logout
        .route("/logout", get(handlers::logout))
        // GET /admin/menu
        .route("/menu", get(handlers::admin_menu))
        // GET/POST /admin/add-item (multipart)
        .route(
            "/add-item",
            get(handlers::add_item_form).post(handlers::add_item_submit),
        )
        // GET/POST /admin/add-article (multipart)
        .route(
            "/add-article",
            get(handlers::add_article_form).post(handlers::add_article_submit),
        )
}
