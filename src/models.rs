use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// --- Core Application Schemas (Mapped to Database) ---

/// CatalogItem
///
/// A product record from the `items` table. Identifiers are assigned by the
/// storage layer and never change; records are created and deleted but never
/// edited.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct CatalogItem {
    pub id: i64,
    pub name: String,
    pub description: String,
    // Price in currency minor units.
    pub price: i64,
    // Numeric category code; catalog listings filter on it.
    pub category: i32,
    // Stored filename of the uploaded photo, if one was provided.
    pub photo: Option<String>,
}

/// Article
///
/// A news record from the `articles` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct Article {
    pub id: i64,
    // Headline.
    pub name: String,
    pub body: String,
    pub photo: Option<String>,
    // Set to the creation time when the article is added.
    pub published_at: DateTime<Utc>,
}

impl Article {
    /// Publication time in the site's display timezone.
    ///
    /// Storage stays UTC; pages render the fixed EET offset the site has
    /// always shown.
    pub fn published_local(&self) -> DateTime<FixedOffset> {
        self.published_at.with_timezone(&site_offset())
    }
}

/// Fixed display offset for timestamps (EET, UTC+2).
pub fn site_offset() -> FixedOffset {
    FixedOffset::east_opt(2 * 3600).expect("EET offset is in range")
}

/// AdminUser
///
/// An administrator row from the `admins` table. Rows are provisioned
/// out-of-band; the application only reads them to verify logins.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdminUser {
    pub id: i64,
    pub username: String,
    // PHC-format argon2 hash.
    pub password_hash: String,
}

// --- Insert Payloads ---

/// NewCatalogItem
///
/// Fields of a catalog item before the storage layer assigns its id.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NewCatalogItem {
    pub name: String,
    pub description: String,
    pub price: i64,
    pub category: i32,
    pub photo: Option<String>,
}

/// NewArticle
///
/// Fields of an article before the storage layer assigns its id.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NewArticle {
    pub name: String,
    pub body: String,
    pub photo: Option<String>,
    pub published_at: DateTime<Utc>,
}

// --- Form & Query Types ---

/// DeleteForm
///
/// Body of the per-record delete forms embedded in the listing pages.
/// Every field is optional so a malformed submission still deserializes and
/// can be surfaced as a validation failure instead of a bare rejection.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DeleteForm {
    pub item_id: Option<String>,
    pub article_id: Option<String>,
    pub csrf_token: Option<String>,
}

/// LoginForm
///
/// Body of the admin login form.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub login: String,
    pub password: String,
}

/// PageQuery
///
/// Accepted query parameters on the listing routes. The page number defaults
/// to 1 when absent.
#[derive(Debug, Deserialize, Default)]
pub struct PageQuery {
    pub page: Option<u32>,
}
