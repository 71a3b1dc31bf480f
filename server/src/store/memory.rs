use std::collections::HashMap;

use async_trait::async_trait;
use system::uuid::Uuid;
use system::{now_millis, Timer, TimerId, UserId};
use tokio::sync::RwLock;

use super::{Session, SessionStore, StoreResult, TimerStore, User, UserStore};

/// Process-local rendition of the record, session and user stores.
pub struct MemoryStore {
    timers: RwLock<HashMap<TimerId, Timer>>,
    sessions: RwLock<HashMap<String, Session>>,
    users: RwLock<HashMap<UserId, User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            timers: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashMap::new()),
            users: RwLock::new(HashMap::new()),
        }
    }

    async fn timers_of(&self, user_id: &UserId, active: bool) -> Vec<Timer> {
        let timers = self.timers.read().await;
        let mut result: Vec<Timer> = timers
            .values()
            .filter(|t| &t.user_id == user_id && t.is_active == active)
            .cloned()
            .collect();
        result.sort_by_key(|t| t.start);
        result
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TimerStore for MemoryStore {
    async fn find_active(&self, user_id: &UserId) -> StoreResult<Vec<Timer>> {
        Ok(self.timers_of(user_id, true).await)
    }

    async fn find_completed(&self, user_id: &UserId) -> StoreResult<Vec<Timer>> {
        Ok(self.timers_of(user_id, false).await)
    }

    async fn find_by_id(&self, timer_id: &TimerId, user_id: &UserId) -> StoreResult<Option<Timer>> {
        let timers = self.timers.read().await;
        Ok(timers
            .get(timer_id)
            .filter(|t| &t.user_id == user_id)
            .cloned())
    }

    async fn create(&self, user_id: &UserId, description: &str) -> StoreResult<Timer> {
        let timer = Timer::start(*user_id, description.to_string(), now_millis());
        self.timers.write().await.insert(timer.id, timer.clone());
        Ok(timer)
    }

    async fn stop(&self, timer_id: &TimerId, user_id: &UserId) -> StoreResult<Option<Timer>> {
        let mut timers = self.timers.write().await;
        let stopped = timers
            .get_mut(timer_id)
            .filter(|t| &t.user_id == user_id)
            .and_then(|t| if t.stop(now_millis()) { Some(t.clone()) } else { None });
        Ok(stopped)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert(&self, session: Session) -> StoreResult<()> {
        self.sessions
            .write()
            .await
            .insert(session.token.clone(), session);
        Ok(())
    }

    async fn find(&self, token: &str) -> StoreResult<Option<Session>> {
        Ok(self.sessions.read().await.get(token).cloned())
    }

    async fn delete(&self, token: &str) -> StoreResult<()> {
        self.sessions.write().await.remove(token);
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, username: &str, password_hash: &str) -> StoreResult<Option<User>> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == username) {
            return Ok(None);
        }
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };
        users.insert(user.id, user.clone());
        Ok(Some(user))
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, user_id: &UserId) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_rt::test]
    async fn it_splits_active_and_completed_timers_per_user() {
        let store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let running = TimerStore::create(&store, &alice, "write spec").await.unwrap();
        let finished = TimerStore::create(&store, &alice, "review").await.unwrap();
        TimerStore::create(&store, &bob, "other").await.unwrap();
        store.stop(&finished.id, &alice).await.unwrap().expect("must stop");

        let active = store.find_active(&alice).await.unwrap();
        let completed = store.find_completed(&alice).await.unwrap();
        assert_eq!(active.iter().map(|t| t.id).collect::<Vec<_>>(), vec![running.id]);
        assert_eq!(completed.iter().map(|t| t.id).collect::<Vec<_>>(), vec![finished.id]);
    }

    #[actix_rt::test]
    async fn it_only_stops_own_running_timers() {
        let store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let timer = TimerStore::create(&store, &alice, "write spec").await.unwrap();

        assert!(store.stop(&timer.id, &bob).await.unwrap().is_none());
        let stopped = store.stop(&timer.id, &alice).await.unwrap().expect("must stop");
        assert_eq!(
            stopped.duration,
            Some((stopped.end.unwrap() - stopped.start).num_milliseconds())
        );
        assert!(store.stop(&timer.id, &alice).await.unwrap().is_none());
        assert!(store.stop(&Uuid::new_v4(), &alice).await.unwrap().is_none());
    }

    #[actix_rt::test]
    async fn it_rejects_duplicate_usernames() {
        let store = MemoryStore::new();
        assert!(UserStore::create(&store, "alice", "hash").await.unwrap().is_some());
        assert!(UserStore::create(&store, "alice", "other").await.unwrap().is_none());
    }
}
