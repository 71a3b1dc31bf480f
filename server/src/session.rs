use std::sync::Arc;

use rand::RngCore;
use system::chrono::Duration;
use system::{now_millis, UserId};
use thiserror::Error;

use crate::error::{AppError, StoreError};
use crate::store::{Session, SessionStore, UserStore};

const TOKEN_BYTES: usize = 16;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthorized => AppError::Unauthorized("Invalid session".into()),
            AuthError::Store(err) => err.into(),
        }
    }
}

/// Resolves session tokens to users. Shared by the HTTP auth gate and the
/// push handshake so both apply the same validity rule.
#[derive(Clone)]
pub struct SessionValidator {
    sessions: Arc<dyn SessionStore>,
    users: Arc<dyn UserStore>,
    ttl: Duration,
}

impl SessionValidator {
    pub fn new(sessions: Arc<dyn SessionStore>, users: Arc<dyn UserStore>, ttl: Duration) -> Self {
        Self {
            sessions,
            users,
            ttl,
        }
    }

    pub async fn validate(&self, token: &str) -> Result<UserId, AuthError> {
        if !is_well_formed(token) {
            return Err(AuthError::Unauthorized);
        }
        let session = match self.sessions.find(token).await? {
            Some(session) if !session.is_expired(now_millis()) => session,
            _ => return Err(AuthError::Unauthorized),
        };
        match self.users.find_by_id(&session.user_id).await? {
            Some(user) => Ok(user.id),
            None => Err(AuthError::Unauthorized),
        }
    }

    pub async fn issue(&self, user_id: UserId) -> Result<String, StoreError> {
        let created_at = now_millis();
        let expires_at = created_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| StoreError(format!("session lifetime {} out of range", self.ttl)))?;
        let session = Session {
            token: generate_token(),
            user_id,
            created_at,
            expires_at,
        };
        let token = session.token.clone();
        self.sessions.insert(session).await?;
        Ok(token)
    }

    pub async fn revoke(&self, token: &str) -> Result<(), StoreError> {
        self.sessions.delete(token).await
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_BYTES * 2
        && token
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use system::uuid::Uuid;

    fn validator_with(store: &Arc<MemoryStore>, ttl: Duration) -> SessionValidator {
        SessionValidator::new(store.clone(), store.clone(), ttl)
    }

    async fn signed_up(store: &Arc<MemoryStore>) -> UserId {
        UserStore::create(store.as_ref(), "alice", "hash")
            .await
            .unwrap()
            .expect("fresh username")
            .id
    }

    #[test]
    fn it_generates_hex_tokens() {
        let token = generate_token();
        assert!(is_well_formed(&token));
        assert_ne!(token, generate_token());
    }

    #[test]
    fn it_rejects_malformed_tokens() {
        assert!(!is_well_formed(""));
        assert!(!is_well_formed("abc"));
        assert!(!is_well_formed(&"G".repeat(32)));
        assert!(!is_well_formed(&"A".repeat(32)));
    }

    #[actix_rt::test]
    async fn it_resolves_issued_token_to_its_user() {
        let store = Arc::new(MemoryStore::new());
        let validator = validator_with(&store, Duration::days(7));
        let user_id = signed_up(&store).await;

        let token = validator.issue(user_id).await.unwrap();
        assert_eq!(validator.validate(&token).await.unwrap(), user_id);
    }

    #[actix_rt::test]
    async fn it_rejects_unknown_and_revoked_tokens() {
        let store = Arc::new(MemoryStore::new());
        let validator = validator_with(&store, Duration::days(7));
        let user_id = signed_up(&store).await;

        assert!(matches!(
            validator.validate(&generate_token()).await,
            Err(AuthError::Unauthorized)
        ));

        let token = validator.issue(user_id).await.unwrap();
        validator.revoke(&token).await.unwrap();
        assert!(matches!(
            validator.validate(&token).await,
            Err(AuthError::Unauthorized)
        ));
    }

    #[actix_rt::test]
    async fn it_rejects_expired_sessions_still_in_store() {
        let store = Arc::new(MemoryStore::new());
        let validator = validator_with(&store, Duration::milliseconds(-1));
        let user_id = signed_up(&store).await;

        let token = validator.issue(user_id).await.unwrap();
        assert!(SessionStore::find(store.as_ref(), &token)
            .await
            .unwrap()
            .is_some());
        assert!(matches!(
            validator.validate(&token).await,
            Err(AuthError::Unauthorized)
        ));
    }

    #[actix_rt::test]
    async fn it_refuses_to_issue_past_the_calendar() {
        let store = Arc::new(MemoryStore::new());
        let validator = validator_with(&store, Duration::max_value());
        let user_id = signed_up(&store).await;

        assert!(validator.issue(user_id).await.is_err());
    }

    #[actix_rt::test]
    async fn it_rejects_sessions_of_missing_users() {
        let store = Arc::new(MemoryStore::new());
        let validator = validator_with(&store, Duration::days(7));

        let token = validator.issue(Uuid::new_v4()).await.unwrap();
        assert!(matches!(
            validator.validate(&token).await,
            Err(AuthError::Unauthorized)
        ));
    }
}
