//! Session/identity contract and the authorization policy.
//!
//! Authentication state lives in the cookie-backed session and is read into
//! an explicit [`SessionIdentity`] at the top of each handler; nothing else
//! in the crate touches the session. `establish` runs exactly at successful
//! register/login, `clear` at logout and self-initiated account deletion.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use super::ApiError;

const SESSION_USER_KEY: &str = "user";

/// Identity snapshot carried between requests.
///
/// `is_admin` is captured once at establish time and stays frozen until the
/// next establish; revoking admin server-side does not take effect until the
/// user re-authenticates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub username: String,
    pub is_admin: bool,
}

pub async fn establish(session: &Session, identity: &SessionIdentity) -> Result<(), ApiError> {
    session
        .insert(SESSION_USER_KEY, identity)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))
}

pub async fn clear(session: &Session) {
    let _ = session.flush().await;
}

pub async fn peek(session: &Session) -> Result<Option<SessionIdentity>, ApiError> {
    session
        .get::<SessionIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))
}

/// Like [`peek`], but an anonymous session is an error.
pub async fn require_identity(session: &Session) -> Result<SessionIdentity, ApiError> {
    peek(session)
        .await?
        .ok_or_else(|| ApiError::unauthenticated("Not authenticated"))
}

/// Reject callers that already hold a session (register, login, and the
/// reset flow are for anonymous clients only).
pub async fn require_anonymous(session: &Session) -> Result<(), ApiError> {
    match peek(session).await? {
        Some(identity) => Err(ApiError::Conflict(format!(
            "Already authenticated as {}",
            identity.username
        ))),
        None => Ok(()),
    }
}

/// The single ownership/admin decision applied to every user- and
/// feedback-scoped operation.
///
/// Permit iff a session is present AND (it belongs to `owner` OR it carries
/// the admin snapshot). No session is `Unauthenticated`; present but
/// mismatched is `Forbidden`. The two are never merged.
pub fn may_act(identity: Option<&SessionIdentity>, owner: &str) -> Result<(), ApiError> {
    match identity {
        None => Err(ApiError::unauthenticated("Not authenticated")),
        Some(id) if id.username == owner || id.is_admin => Ok(()),
        Some(_) => Err(ApiError::forbidden("Not the owner of this resource")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(username: &str, is_admin: bool) -> SessionIdentity {
        SessionIdentity {
            username: username.to_string(),
            is_admin,
        }
    }

    #[test]
    fn test_may_act_truth_table() {
        // (no session, *) -> unauthenticated
        assert!(matches!(
            may_act(None, "alice"),
            Err(ApiError::Unauthenticated(_))
        ));

        // (session = owner, admin = false) -> permit
        assert!(may_act(Some(&identity("alice", false)), "alice").is_ok());

        // (session != owner, admin = false) -> forbidden
        assert!(matches!(
            may_act(Some(&identity("bob", false)), "alice"),
            Err(ApiError::Forbidden(_))
        ));

        // (session != owner, admin = true) -> permit
        assert!(may_act(Some(&identity("bob", true)), "alice").is_ok());

        // (session = owner, admin = true) -> permit
        assert!(may_act(Some(&identity("alice", true)), "alice").is_ok());
    }
}
