use tower_sessions::{Session, session::Error as SessionError};
use uuid::Uuid;

/// Session key the anti-forgery token lives under.
pub const SESSION_KEY: &str = "csrf_token";

/// issue
///
/// Returns the session's anti-forgery token, minting one on first use. Every
/// state-changing form embeds the token as a hidden field.
pub async fn issue(session: &Session) -> Result<String, SessionError> {
    if let Some(token) = session.get::<String>(SESSION_KEY).await? {
        return Ok(token);
    }
    let token = Uuid::new_v4().simple().to_string();
    session.insert(SESSION_KEY, &token).await?;
    Ok(token)
}

/// verify
///
/// Checks a submitted token against the session. A missing submission, a
/// session without a token, or a mismatch all fail verification.
pub async fn verify(session: &Session, submitted: Option<&str>) -> Result<bool, SessionError> {
    let Some(submitted) = submitted else {
        return Ok(false);
    };
    let stored = session.get::<String>(SESSION_KEY).await?;
    Ok(stored.is_some_and(|token| token == submitted))
}
