#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use shop_portal::{
    AppConfig, AppState, MockStorageService, RateLimiter, ResponseCache, create_router,
    models::{AdminUser, Article, CatalogItem, NewArticle, NewCatalogItem},
    repository::{RepoError, Repository, RepositoryState},
    storage::StorageState,
};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicI64, AtomicUsize, Ordering},
};
use tower::ServiceExt;
use tower_sessions::{MemoryStore, SessionManagerLayer};

// --- MOCK REPOSITORY IMPLEMENTATION ---

// The central control point for handler tests. Handlers rely on the
// Repository trait, so the mock implements it over plain vectors and counts
// every read so cache behavior is observable.
pub struct MockRepository {
    items: Mutex<Vec<CatalogItem>>,
    articles: Mutex<Vec<Article>>,
    admins: Vec<AdminUser>,
    next_id: AtomicI64,
    /// Incremented by every list/count call; cache hits leave it unchanged.
    pub fetch_calls: AtomicUsize,
    /// When true, every mutation fails like a broken database would.
    pub fail_mutations: bool,
}

impl Default for MockRepository {
    fn default() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            articles: Mutex::new(Vec::new()),
            admins: Vec::new(),
            next_id: AtomicI64::new(1),
            fetch_calls: AtomicUsize::new(0),
            fail_mutations: false,
        }
    }
}

impl MockRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn take_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Registers an admin with an argon2 hash of `password`.
    pub fn with_admin(mut self, username: &str, password: &str) -> Self {
        let id = self.take_id();
        self.admins.push(AdminUser {
            id,
            username: username.to_string(),
            password_hash: shop_portal::auth::hash_password(password).expect("hashing"),
        });
        self
    }

    /// Seeds `count` catalog items in the given category.
    pub fn with_items(self, count: usize, category: i32) -> Self {
        for n in 0..count {
            let id = self.take_id();
            self.items.lock().unwrap().push(CatalogItem {
                id,
                name: format!("Item {n}"),
                description: format!("Description of item {n}"),
                price: 1000 + n as i64,
                category,
                photo: None,
            });
        }
        self
    }

    /// Seeds `count` articles.
    pub fn with_articles(self, count: usize) -> Self {
        for n in 0..count {
            let id = self.take_id();
            self.articles.lock().unwrap().push(Article {
                id,
                name: format!("Article {n}"),
                body: format!("Body of article {n}"),
                photo: None,
                published_at: chrono::Utc::now(),
            });
        }
        self
    }

    pub fn item_ids(&self) -> Vec<i64> {
        self.items.lock().unwrap().iter().map(|i| i.id).collect()
    }

    pub fn article_ids(&self) -> Vec<i64> {
        self.articles.lock().unwrap().iter().map(|a| a.id).collect()
    }

    pub fn item_count(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    pub fn article_count(&self) -> usize {
        self.articles.lock().unwrap().len()
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    fn mutation_guard(&self) -> Result<(), RepoError> {
        if self.fail_mutations {
            Err(RepoError::Database(sqlx::Error::PoolClosed))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Repository for MockRepository {
    async fn list_items(
        &self,
        category: Option<i32>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CatalogItem>, RepoError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let items = self.items.lock().unwrap();
        Ok(items
            .iter()
            .filter(|i| category.is_none_or(|c| i.category == c))
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count_items(&self, category: Option<i32>) -> Result<i64, RepoError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let items = self.items.lock().unwrap();
        Ok(items
            .iter()
            .filter(|i| category.is_none_or(|c| i.category == c))
            .count() as i64)
    }

    async fn insert_item(&self, new: NewCatalogItem) -> Result<CatalogItem, RepoError> {
        self.mutation_guard()?;
        let item = CatalogItem {
            id: self.take_id(),
            name: new.name,
            description: new.description,
            price: new.price,
            category: new.category,
            photo: new.photo,
        };
        self.items.lock().unwrap().push(item.clone());
        Ok(item)
    }

    async fn delete_item(&self, id: i64) -> Result<bool, RepoError> {
        self.mutation_guard()?;
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|i| i.id != id);
        Ok(items.len() < before)
    }

    async fn list_articles(&self, limit: i64, offset: i64) -> Result<Vec<Article>, RepoError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let articles = self.articles.lock().unwrap();
        Ok(articles
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count_articles(&self) -> Result<i64, RepoError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.articles.lock().unwrap().len() as i64)
    }

    async fn insert_article(&self, new: NewArticle) -> Result<Article, RepoError> {
        self.mutation_guard()?;
        let article = Article {
            id: self.take_id(),
            name: new.name,
            body: new.body,
            photo: new.photo,
            published_at: new.published_at,
        };
        self.articles.lock().unwrap().push(article.clone());
        Ok(article)
    }

    async fn delete_article(&self, id: i64) -> Result<bool, RepoError> {
        self.mutation_guard()?;
        let mut articles = self.articles.lock().unwrap();
        let before = articles.len();
        articles.retain(|a| a.id != id);
        Ok(articles.len() < before)
    }

    async fn find_admin(&self, username: &str) -> Result<Option<AdminUser>, RepoError> {
        Ok(self
            .admins
            .iter()
            .find(|a| a.username == username)
            .cloned())
    }
}

// --- TEST APP ASSEMBLY ---

/// Builds the application state around a mock repository, with a fresh
/// limiter and cache per test.
pub fn test_state(repo: Arc<MockRepository>) -> (AppState, Arc<MockStorageService>) {
    let storage = Arc::new(MockStorageService::new());
    let state = AppState {
        repo: repo as RepositoryState,
        storage: storage.clone() as StorageState,
        config: AppConfig::default(),
        limiter: RateLimiter::new(),
        cache: ResponseCache::new(),
    };
    (state, storage)
}

/// The real router over the in-memory session store.
pub fn test_app(state: AppState) -> Router {
    let sessions = SessionManagerLayer::new(MemoryStore::default()).with_secure(false);
    create_router(state, sessions)
}

// --- REQUEST HELPERS ---

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.expect("infallible")
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .expect("request")
}

/// An application/x-www-form-urlencoded POST, optionally within a session.
pub fn form_post(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(uri)
        .method("POST")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

const BOUNDARY: &str = "----shop-portal-test-boundary";

/// A multipart/form-data POST with text fields and an optional file part.
pub fn multipart_post(
    uri: &str,
    cookie: &str,
    fields: &[(&str, &str)],
    photo: Option<(&str, &str, &[u8])>,
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n")
                .as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    if let Some((name, filename, bytes)) = photo {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; \
                 filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .uri(uri)
        .method("POST")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::COOKIE, cookie)
        .body(Body::from(body))
        .expect("request")
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}

/// The session cookie pair from a Set-Cookie header, if any.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

/// Pulls the hidden csrf_token value out of a rendered form.
pub fn extract_csrf(html: &str) -> Option<String> {
    let marker = "name=\"csrf_token\" value=\"";
    let start = html.find(marker)? + marker.len();
    let end = html[start..].find('"')? + start;
    Some(html[start..end].to_string())
}

/// Logs in through the real login route and returns the session cookie.
pub async fn login(app: &Router, username: &str, password: &str) -> String {
    let response = send(
        app,
        form_post(
            "/admin/login",
            &format!("login={username}&password={password}"),
            None,
        ),
    )
    .await;
    assert_eq!(
        response.status(),
        axum::http::StatusCode::SEE_OTHER,
        "login should redirect to the admin menu"
    );
    session_cookie(&response).expect("login sets the session cookie")
}
