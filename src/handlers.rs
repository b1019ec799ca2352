use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use std::collections::HashMap;
use tower_sessions::Session;

use crate::{
    AppState,
    auth::{self, CurrentAdmin, OptionalAdmin, RequireAdmin},
    csrf,
    deletion::{DeleteOutcome, DeleteTarget, DeletionService},
    error::AppError,
    models::{Article, CatalogItem, DeleteForm, LoginForm, NewArticle, NewCatalogItem, PageQuery},
    pagination::{self, CatalogSource, NewsSource, PageLink, Paginator},
};

// Single generic message for failed logins; which check failed is never
// revealed, so usernames cannot be enumerated.
const INVALID_CREDENTIALS: &str = "Invalid username or password.";

// --- Templates ---

/// Landing page.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub is_admin: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "about.html")]
pub struct AboutTemplate {
    pub is_admin: bool,
}

/// Catalog listing: one category, one page of items, delete forms for admins.
#[derive(Template, WebTemplate)]
#[template(path = "catalog.html")]
pub struct CatalogTemplate {
    pub items: Vec<CatalogItem>,
    pub controls: Vec<PageLink>,
    pub total_pages: u32,
    pub category: i32,
    pub csrf_token: String,
    pub is_admin: bool,
    pub error: Option<String>,
}

/// News feed: one page of articles, delete forms for admins.
#[derive(Template, WebTemplate)]
#[template(path = "news.html")]
pub struct NewsTemplate {
    pub articles: Vec<Article>,
    pub controls: Vec<PageLink>,
    pub total_pages: u32,
    pub csrf_token: String,
    pub is_admin: bool,
    pub error: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/menu.html")]
pub struct MenuTemplate {
    pub username: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/add_item.html")]
pub struct AddItemTemplate {
    pub csrf_token: String,
    pub error: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/add_article.html")]
pub struct AddArticleTemplate {
    pub csrf_token: String,
    pub error: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "errors/not_found.html")]
pub struct NotFoundTemplate {}

// --- Home Pages ---

/// home_page
///
/// Plain page; the auth gate's boolean only switches admin affordances on.
pub async fn home_page(OptionalAdmin(admin): OptionalAdmin) -> HomeTemplate {
    HomeTemplate {
        is_admin: admin.is_some(),
    }
}

pub async fn about_page(OptionalAdmin(admin): OptionalAdmin) -> AboutTemplate {
    AboutTemplate {
        is_admin: admin.is_some(),
    }
}

// --- Listing Pages ---

/// catalog_page
///
/// Catalog listing for one category. Every request runs the same pipeline:
/// apply the deletion service (a no-op unless this is a valid POST), then
/// fetch the requested page and render it with the pagination controls, the
/// delete form token and the auth gate's boolean.
pub async fn catalog_page(
    State(state): State<AppState>,
    Path(category): Path<i32>,
    Query(query): Query<PageQuery>,
    method: Method,
    session: Session,
    OptionalAdmin(admin): OptionalAdmin,
    axum::Form(form): axum::Form<DeleteForm>,
) -> Result<Response, AppError> {
    tracing::info!(%method, category, "catalog page request");

    let deletion = DeletionService::new(state.repo.as_ref());
    let outcome = deletion
        .apply(
            &method,
            DeleteTarget::CatalogItem,
            &form,
            &session,
            &format!("/catalog/{category}"),
        )
        .await?;

    let error = match outcome {
        DeleteOutcome::Deleted(destination) => {
            state.cache.invalidate_all();
            return Ok(Redirect::to(&destination).into_response());
        }
        DeleteOutcome::InvalidForm(message) => Some(message),
        _ => None,
    };

    let paginator = Paginator::new(
        state.config.catalog_page_size,
        CatalogSource {
            repo: state.repo.as_ref(),
            category: Some(category),
        },
    );
    let page = paginator.page(query.page.unwrap_or(1)).await?;
    let controls = pagination::controls(&page, &format!("/catalog/{category}"));
    let csrf_token = csrf::issue(&session).await?;

    Ok(CatalogTemplate {
        total_pages: page.total_pages,
        items: page.items,
        controls,
        category,
        csrf_token,
        is_admin: admin.is_some(),
        error,
    }
    .into_response())
}

/// news_page
///
/// News feed; same pipeline as the catalog over the article collection.
pub async fn news_page(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
    method: Method,
    session: Session,
    OptionalAdmin(admin): OptionalAdmin,
    axum::Form(form): axum::Form<DeleteForm>,
) -> Result<Response, AppError> {
    tracing::info!(%method, "news page request");

    let deletion = DeletionService::new(state.repo.as_ref());
    let outcome = deletion
        .apply(&method, DeleteTarget::Article, &form, &session, "/news")
        .await?;

    let error = match outcome {
        DeleteOutcome::Deleted(destination) => {
            state.cache.invalidate_all();
            return Ok(Redirect::to(&destination).into_response());
        }
        DeleteOutcome::InvalidForm(message) => Some(message),
        _ => None,
    };

    let paginator = Paginator::new(
        state.config.news_page_size,
        NewsSource {
            repo: state.repo.as_ref(),
        },
    );
    let page = paginator.page(query.page.unwrap_or(1)).await?;
    let controls = pagination::controls(&page, "/news");
    let csrf_token = csrf::issue(&session).await?;

    Ok(NewsTemplate {
        total_pages: page.total_pages,
        articles: page.items,
        controls,
        csrf_token,
        is_admin: admin.is_some(),
        error,
    }
    .into_response())
}

// --- Admin: Login / Logout / Menu ---

pub async fn login_page() -> LoginTemplate {
    LoginTemplate { error: None }
}

/// login_submit
///
/// Looks the administrator up by the submitted username and verifies the
/// password hash. Unknown user and wrong password take the same path and
/// produce the same message.
pub async fn login_submit(
    State(state): State<AppState>,
    session: Session,
    axum::Form(form): axum::Form<LoginForm>,
) -> Result<Response, AppError> {
    tracing::info!("admin login attempt");

    match state.repo.find_admin(&form.login).await? {
        Some(user) if auth::verify_password(&form.password, &user.password_hash) => {
            auth::set_current_admin(
                &session,
                &CurrentAdmin {
                    id: user.id,
                    username: user.username,
                },
            )
            .await?;
            Ok(Redirect::to("/admin/menu").into_response())
        }
        _ => Ok(LoginTemplate {
            error: Some(INVALID_CREDENTIALS.to_string()),
        }
        .into_response()),
    }
}

/// logout
///
/// Removes the administrator from the session and returns to the landing
/// page. Gated: an anonymous caller is redirected to login instead.
pub async fn logout(
    RequireAdmin(admin): RequireAdmin,
    session: Session,
) -> Result<Redirect, AppError> {
    tracing::info!(admin = %admin.username, "admin logged out");
    auth::clear_current_admin(&session).await?;
    Ok(Redirect::to("/"))
}

pub async fn admin_menu(RequireAdmin(admin): RequireAdmin) -> MenuTemplate {
    MenuTemplate {
        username: admin.username,
    }
}

// --- Admin: Add Item / Add Article ---

pub async fn add_item_form(
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
) -> Result<AddItemTemplate, AppError> {
    Ok(AddItemTemplate {
        csrf_token: csrf::issue(&session).await?,
        error: None,
    })
}

/// add_item_submit
///
/// Multipart form: name, description, price, category, optional photo.
/// Validation failures re-render the form with a message; storage and
/// persistence failures are surfaced as error responses.
pub async fn add_item_submit(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Response, AppError> {
    tracing::info!("add-item submission");

    let form = UploadForm::read(multipart, "photo").await?;

    let retry = |message: &str, token: String| {
        AddItemTemplate {
            csrf_token: token,
            error: Some(message.to_string()),
        }
        .into_response()
    };

    if !csrf::verify(&session, form.value("csrf_token")).await? {
        let token = csrf::issue(&session).await?;
        return Ok(retry("The form could not be validated.", token));
    }

    let (Some(name), Some(description), Some(price), Some(category)) = (
        form.required("name"),
        form.required("description"),
        form.required("price"),
        form.required("category"),
    ) else {
        let token = csrf::issue(&session).await?;
        return Ok(retry("All item fields are required.", token));
    };

    let (Ok(price), Ok(category)) = (price.parse::<i64>(), category.parse::<i32>()) else {
        let token = csrf::issue(&session).await?;
        return Ok(retry("Price and category must be numbers.", token));
    };

    let photo = match &form.photo {
        Some((filename, bytes)) => Some(state.storage.save_photo(filename, bytes).await?),
        None => None,
    };

    let item = state
        .repo
        .insert_item(NewCatalogItem {
            name: name.to_string(),
            description: description.to_string(),
            price,
            category,
            photo,
        })
        .await?;

    tracing::info!(item_id = item.id, "catalog item added");
    state.cache.invalidate_all();
    Ok(Redirect::to("/admin/add-item").into_response())
}

pub async fn add_article_form(
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
) -> Result<AddArticleTemplate, AppError> {
    Ok(AddArticleTemplate {
        csrf_token: csrf::issue(&session).await?,
        error: None,
    })
}

/// add_article_submit
///
/// Multipart form: name_article, text_article, optional add_photo. The
/// publication timestamp is the creation time.
pub async fn add_article_submit(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Response, AppError> {
    tracing::info!("add-article submission");

    let form = UploadForm::read(multipart, "add_photo").await?;

    let retry = |message: &str, token: String| {
        AddArticleTemplate {
            csrf_token: token,
            error: Some(message.to_string()),
        }
        .into_response()
    };

    if !csrf::verify(&session, form.value("csrf_token")).await? {
        let token = csrf::issue(&session).await?;
        return Ok(retry("The form could not be validated.", token));
    }

    let (Some(name), Some(body)) = (form.required("name_article"), form.required("text_article"))
    else {
        let token = csrf::issue(&session).await?;
        return Ok(retry("A headline and body text are required.", token));
    };

    let photo = match &form.photo {
        Some((filename, bytes)) => Some(state.storage.save_photo(filename, bytes).await?),
        None => None,
    };

    let article = state
        .repo
        .insert_article(NewArticle {
            name: name.to_string(),
            body: body.to_string(),
            photo,
            published_at: Utc::now(),
        })
        .await?;

    tracing::info!(article_id = article.id, "article added");
    state.cache.invalidate_all();
    Ok(Redirect::to("/admin/add-article").into_response())
}

// --- Fallback ---

/// not_found
///
/// Fallback for every unmatched route. GET responses are cacheable like any
/// other page.
pub async fn not_found(uri: Uri) -> (StatusCode, NotFoundTemplate) {
    tracing::warn!(%uri, "page not found");
    (StatusCode::NOT_FOUND, NotFoundTemplate {})
}

// --- Multipart Support ---

/// Collected multipart submission: text fields by name, plus at most one
/// photo (the part under `photo_field` that actually carried a file).
struct UploadForm {
    values: HashMap<String, String>,
    photo: Option<(String, Vec<u8>)>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart, photo_field: &str) -> Result<Self, AppError> {
        let mut values = HashMap::new();
        let mut photo = None;

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            if name == photo_field {
                let filename = field.file_name().map(str::to_owned).unwrap_or_default();
                let bytes = field.bytes().await?;
                // An empty file input still submits a nameless, empty part.
                if !filename.is_empty() && !bytes.is_empty() {
                    photo = Some((filename, bytes.to_vec()));
                }
            } else {
                values.insert(name, field.text().await?);
            }
        }

        Ok(Self { values, photo })
    }

    fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// A field that must be present and non-blank.
    fn required(&self, name: &str) -> Option<&str> {
        self.value(name)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}
