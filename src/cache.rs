use axum::{
    body::{Body, Bytes, to_bytes},
    extract::{Request, State},
    http::{HeaderValue, Method, StatusCode, Uri, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Duration;

use crate::AppState;

/// Time-to-live of a cached response.
pub const RESPONSE_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

const MAX_CACHED_RESPONSES: u64 = 10_000;

/// A stored response: status, content type and body only. Per-session
/// headers (Set-Cookie in particular) are never replayed from the cache.
#[derive(Clone)]
struct CachedPage {
    status: StatusCode,
    content_type: Option<HeaderValue>,
    body: Bytes,
}

/// ResponseCache
///
/// Long-lived page cache keyed by request identity. Created once at startup
/// and injected through the application state.
#[derive(Clone)]
pub struct ResponseCache {
    inner: moka::future::Cache<String, Arc<CachedPage>>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseCache {
    pub fn new() -> Self {
        Self {
            inner: moka::future::Cache::builder()
                .max_capacity(MAX_CACHED_RESPONSES)
                .time_to_live(RESPONSE_TTL)
                .build(),
        }
    }

    /// Drops every cached page. Handlers call this after any successful
    /// mutation so listings never serve a deleted or missing record for the
    /// rest of the TTL.
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}

/// Request identity the cache is keyed by.
fn cache_key(method: &Method, uri: &Uri) -> String {
    match uri.query() {
        Some(query) => format!("{method} {}?{query}", uri.path()),
        None => format!("{method} {}", uri.path()),
    }
}

/// Only idempotent GET responses outside the admin area are cached; admin
/// pages depend on the authenticated session and must always be computed.
fn cacheable_route(method: &Method, uri: &Uri) -> bool {
    method == Method::GET && !uri.path().starts_with("/admin")
}

fn cacheable_status(status: StatusCode) -> bool {
    status == StatusCode::OK || status == StatusCode::NOT_FOUND
}

/// response_cache
///
/// Middleware applied to every route. A fresh hit is served without invoking
/// the handler at all; a miss runs the handler and stores a sanitized copy
/// of the response.
pub async fn response_cache(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    if !cacheable_route(&method, &uri) {
        return next.run(request).await;
    }

    let key = cache_key(&method, &uri);

    if let Some(hit) = state.cache.inner.get(&key).await {
        tracing::debug!(%key, "cache hit");
        return rebuild(&hit);
    }

    let response = next.run(request).await;

    if !cacheable_status(response.status()) {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, "failed to buffer response body");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let page = Arc::new(CachedPage {
        status: parts.status,
        content_type: parts.headers.get(CONTENT_TYPE).cloned(),
        body: bytes.clone(),
    });
    state.cache.inner.insert(key, page).await;

    Response::from_parts(parts, Body::from(bytes))
}

fn rebuild(page: &CachedPage) -> Response {
    let mut response = Response::builder().status(page.status);
    if let Some(content_type) = &page.content_type {
        response = response.header(CONTENT_TYPE, content_type.clone());
    }
    response
        .body(Body::from(page.body.clone()))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
