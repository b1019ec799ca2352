use axum::http::Method;
use tower_sessions::Session;

use crate::csrf;
use crate::error::AppError;
use crate::models::DeleteForm;
use crate::repository::Repository;

/// DeleteTarget
///
/// Which record collection a delete form operates on, and which form field
/// carries the target identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteTarget {
    CatalogItem,
    Article,
}

impl DeleteTarget {
    fn id_value<'f>(self, form: &'f DeleteForm) -> Option<&'f str> {
        match self {
            Self::CatalogItem => form.item_id.as_deref(),
            Self::Article => form.article_id.as_deref(),
        }
    }
}

/// DeleteOutcome
///
/// The observable contract of a delete submission. The asymmetry between
/// `InvalidForm` (surfaced to the user) and `Missing` (silent no-op) is
/// deliberate and load-bearing; callers must keep it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Not a POST submission; nothing was attempted.
    NotSubmitted,
    /// Bad token or unusable id field; storage untouched, message shown.
    InvalidForm(String),
    /// Valid submission, but no record carries that id any more.
    Missing,
    /// Exactly one record was removed; the caller should redirect here.
    Deleted(String),
}

const INVALID_DELETE: &str = "The delete request could not be validated.";

/// DeletionService
///
/// Validates a delete submission against the session's anti-forgery token
/// and removes at most one record from the target collection.
pub struct DeletionService<'a> {
    repo: &'a dyn Repository,
}

impl<'a> DeletionService<'a> {
    pub fn new(repo: &'a dyn Repository) -> Self {
        Self { repo }
    }

    /// apply
    ///
    /// Listing handlers call this unconditionally on every request; anything
    /// that is not a well-formed POST comes back as a no-op outcome. A
    /// storage failure during the delete propagates as an error instead of
    /// being swallowed.
    pub async fn apply(
        &self,
        method: &Method,
        target: DeleteTarget,
        form: &DeleteForm,
        session: &Session,
        redirect_to: &str,
    ) -> Result<DeleteOutcome, AppError> {
        if method != Method::POST {
            return Ok(DeleteOutcome::NotSubmitted);
        }

        if !csrf::verify(session, form.csrf_token.as_deref()).await? {
            return Ok(DeleteOutcome::InvalidForm(INVALID_DELETE.to_string()));
        }

        let Some(raw_id) = target.id_value(form) else {
            return Ok(DeleteOutcome::InvalidForm(INVALID_DELETE.to_string()));
        };
        let Ok(id) = raw_id.trim().parse::<i64>() else {
            return Ok(DeleteOutcome::InvalidForm(INVALID_DELETE.to_string()));
        };

        let removed = match target {
            DeleteTarget::CatalogItem => self.repo.delete_item(id).await?,
            DeleteTarget::Article => self.repo.delete_article(id).await?,
        };

        if removed {
            tracing::info!(id, ?target, "record deleted");
            Ok(DeleteOutcome::Deleted(redirect_to.to_string()))
        } else {
            // Already gone; idempotent and silent by contract.
            tracing::debug!(id, ?target, "delete target not found");
            Ok(DeleteOutcome::Missing)
        }
    }
}
