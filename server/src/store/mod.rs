use async_trait::async_trait;
use system::chrono::{DateTime, Utc};
use system::{Timer, TimerId, UserId};

use crate::error::StoreError;

mod memory;

pub use memory::MemoryStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[async_trait]
pub trait TimerStore: Send + Sync {
    async fn find_active(&self, user_id: &UserId) -> StoreResult<Vec<Timer>>;
    async fn find_completed(&self, user_id: &UserId) -> StoreResult<Vec<Timer>>;
    async fn find_by_id(&self, timer_id: &TimerId, user_id: &UserId) -> StoreResult<Option<Timer>>;
    async fn create(&self, user_id: &UserId, description: &str) -> StoreResult<Timer>;
    /// Stops a timer that belongs to `user_id` and is still running.
    async fn stop(&self, timer_id: &TimerId, user_id: &UserId) -> StoreResult<Option<Timer>>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, session: Session) -> StoreResult<()>;
    /// Returns the stored record as is; expiry is checked by the caller.
    async fn find(&self, token: &str) -> StoreResult<Option<Session>>;
    async fn delete(&self, token: &str) -> StoreResult<()>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// `None` when the username is already taken.
    async fn create(&self, username: &str, password_hash: &str) -> StoreResult<Option<User>>;
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn find_by_id(&self, user_id: &UserId) -> StoreResult<Option<User>>;
}
