use crate::models::{AdminUser, Article, CatalogItem, NewArticle, NewCatalogItem};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;

/// RepoError
///
/// Failure type for all persistence operations. Callers receive these
/// explicitly; nothing is logged-and-defaulted inside the repository.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Repository Trait
///
/// The abstract contract for all persistence operations, shared as a trait
/// object so handlers and services never depend on the concrete driver.
///
/// Listing methods take a limit/offset pair and order by id, which is the
/// stable insertion order every page in the site relies on. Each method is a
/// single statement and therefore its own transaction boundary; the system
/// requires no multi-record transactions.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Catalog Items ---
    async fn list_items(
        &self,
        category: Option<i32>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CatalogItem>, RepoError>;
    async fn count_items(&self, category: Option<i32>) -> Result<i64, RepoError>;
    async fn insert_item(&self, new: NewCatalogItem) -> Result<CatalogItem, RepoError>;
    // Returns true if a row was removed; deleting an unknown id is not an error.
    async fn delete_item(&self, id: i64) -> Result<bool, RepoError>;

    // --- Articles ---
    async fn list_articles(&self, limit: i64, offset: i64) -> Result<Vec<Article>, RepoError>;
    async fn count_articles(&self) -> Result<i64, RepoError>;
    async fn insert_article(&self, new: NewArticle) -> Result<Article, RepoError>;
    async fn delete_article(&self, id: i64) -> Result<bool, RepoError>;

    // --- Admin ---
    async fn find_admin(&self, username: &str) -> Result<Option<AdminUser>, RepoError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the
/// PostgreSQL database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    /// list_items
    ///
    /// One page of catalog items in id order, optionally restricted to a
    /// category. A category with no matching rows yields an empty vec.
    async fn list_items(
        &self,
        category: Option<i32>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CatalogItem>, RepoError> {
        let items = sqlx::query_as::<_, CatalogItem>(
            r#"
            SELECT id, name, description, price, category, photo
            FROM items
            WHERE ($1::int4 IS NULL OR category = $1)
            ORDER BY id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(category)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    async fn count_items(&self, category: Option<i32>) -> Result<i64, RepoError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM items WHERE ($1::int4 IS NULL OR category = $1)",
        )
        .bind(category)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// insert_item
    ///
    /// Inserts a new catalog item and returns the stored row, id included.
    /// Repeated submissions with identical fields create distinct rows.
    async fn insert_item(&self, new: NewCatalogItem) -> Result<CatalogItem, RepoError> {
        let item = sqlx::query_as::<_, CatalogItem>(
            r#"
            INSERT INTO items (name, description, price, category, photo)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, description, price, category, photo
            "#,
        )
        .bind(new.name)
        .bind(new.description)
        .bind(new.price)
        .bind(new.category)
        .bind(new.photo)
        .fetch_one(&self.pool)
        .await?;
        Ok(item)
    }

    async fn delete_item(&self, id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// list_articles
    ///
    /// One page of news articles in id order.
    async fn list_articles(&self, limit: i64, offset: i64) -> Result<Vec<Article>, RepoError> {
        let articles = sqlx::query_as::<_, Article>(
            r#"
            SELECT id, name, body, photo, published_at
            FROM articles
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(articles)
    }

    async fn count_articles(&self) -> Result<i64, RepoError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM articles")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn insert_article(&self, new: NewArticle) -> Result<Article, RepoError> {
        let article = sqlx::query_as::<_, Article>(
            r#"
            INSERT INTO articles (name, body, photo, published_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, body, photo, published_at
            "#,
        )
        .bind(new.name)
        .bind(new.body)
        .bind(new.photo)
        .bind(new.published_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(article)
    }

    async fn delete_article(&self, id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// find_admin
    ///
    /// Looks an administrator up by username for login verification.
    async fn find_admin(&self, username: &str) -> Result<Option<AdminUser>, RepoError> {
        let admin = sqlx::query_as::<_, AdminUser>(
            "SELECT id, username, password_hash FROM admins WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(admin)
    }
}
