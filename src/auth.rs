use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::{Session, session::Error as SessionError};

/// Name of the session cookie. The cookie carries only the opaque session id.
pub const SESSION_COOKIE_NAME: &str = "shop_portal_session";

/// Session key the authenticated administrator record lives under.
pub const ADMIN_SESSION_KEY: &str = "current_admin";

/// CurrentAdmin
///
/// The resolved identity of an authenticated administrator session. There is
/// no role distinction beyond holding this record at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub id: i64,
    pub username: String,
}

/// RequireAdmin
///
/// Extractor enforcing the authentication requirement at the dispatch layer:
/// gated handlers (admin menu, add-item, add-article, logout) never run for
/// an unauthenticated caller, who is redirected to the login page instead.
pub struct RequireAdmin(pub CurrentAdmin);

/// Rejection for `RequireAdmin`.
pub struct RedirectToLogin;

impl IntoResponse for RedirectToLogin {
    fn into_response(self) -> Response {
        Redirect::to("/admin/login").into_response()
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = RedirectToLogin;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // The session is placed in extensions by the SessionManagerLayer.
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(RedirectToLogin)?;

        let admin: CurrentAdmin = session
            .get(ADMIN_SESSION_KEY)
            .await
            .ok()
            .flatten()
            .ok_or(RedirectToLogin)?;

        Ok(Self(admin))
    }
}

/// OptionalAdmin
///
/// The authentication gate: an infallible, stateless query of the ambient
/// session. Handlers pass the resulting boolean to their templates to decide
/// which admin affordances to show; it is never used to authorize mutations.
pub struct OptionalAdmin(pub Option<CurrentAdmin>);

impl<S> FromRequestParts<S> for OptionalAdmin
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentAdmin>(ADMIN_SESSION_KEY)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(admin))
    }
}

/// Establishes the authenticated administrator in the session.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), SessionError> {
    session.insert(ADMIN_SESSION_KEY, admin).await
}

/// Removes the administrator from the session (logout).
pub async fn clear_current_admin(session: &Session) -> Result<(), SessionError> {
    session.remove::<CurrentAdmin>(ADMIN_SESSION_KEY).await?;
    Ok(())
}

/// verify_password
///
/// Checks a submitted password against a stored PHC-format argon2 hash.
/// An unparsable stored hash fails verification like any wrong password;
/// the login surface never distinguishes why a check failed.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is malformed");
            false
        }
    }
}

/// hash_password
///
/// Produces a PHC-format argon2 hash. Admin rows are provisioned out-of-band;
/// this exists for provisioning tooling and tests.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}
