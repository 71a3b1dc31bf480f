use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use system::chrono::{DateTime, Duration, Utc};
use system::{ConnectionId, UserId};

use crate::connection::ConnectionEvent;

pub type ConnectionTx = tokio::sync::mpsc::Sender<ConnectionEvent>;

#[derive(Debug)]
pub struct Connection {
    pub id: ConnectionId,
    pub user_id: UserId,
    pub tx: ConnectionTx,
    pub connected_at: DateTime<Utc>,
    /// Set while a tick snapshot for this connection is being loaded.
    pub tick_in_flight: Arc<AtomicBool>,
}

impl Connection {
    pub fn new(id: ConnectionId, user_id: UserId, tx: ConnectionTx) -> Self {
        Self {
            id,
            user_id,
            tx,
            connected_at: Utc::now(),
            tick_in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn lifetime(&self, now: DateTime<Utc>) -> Duration {
        now - self.connected_at
    }
}

/// At most one addressable connection per user. The most recently
/// registered connection wins.
pub struct ConnectionRegistry {
    connections: HashMap<UserId, Connection>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
        }
    }

    /// Returns the replaced connection; closing it is up to the caller.
    pub fn register(&mut self, connection: Connection) -> Option<Connection> {
        self.connections.insert(connection.user_id, connection)
    }

    /// No-op unless `connection_id` is the one currently registered, so a
    /// late close from a replaced connection can't evict its successor.
    pub fn unregister(
        &mut self,
        user_id: &UserId,
        connection_id: ConnectionId,
    ) -> Option<Connection> {
        match self.connections.get(user_id) {
            Some(current) if current.id == connection_id => self.connections.remove(user_id),
            _ => None,
        }
    }

    pub fn lookup(&self, user_id: &UserId) -> Option<&Connection> {
        self.connections.get(user_id)
    }

    pub fn for_each<F>(&self, f: F)
    where
        F: FnMut(&Connection),
    {
        self.connections.values().for_each(f)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use system::uuid::Uuid;
    use tokio::sync::mpsc::{channel, Receiver};

    fn connection(id: ConnectionId, user_id: UserId) -> (Connection, Receiver<ConnectionEvent>) {
        let (tx, rx) = channel(1);
        (Connection::new(id, user_id, tx), rx)
    }

    #[test]
    fn it_replaces_existing_connection_of_same_user() {
        let mut registry = ConnectionRegistry::new();
        let user_id = Uuid::new_v4();
        let (first, _rx1) = connection(1, user_id);
        let (second, _rx2) = connection(2, user_id);

        assert!(registry.register(first).is_none());
        let replaced = registry.register(second).expect("first must be replaced");

        assert_eq!(replaced.id, 1);
        assert_eq!(registry.lookup(&user_id).map(|c| c.id), Some(2));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn it_ignores_unregister_from_stale_connection() {
        let mut registry = ConnectionRegistry::new();
        let user_id = Uuid::new_v4();
        let (first, _rx1) = connection(1, user_id);
        let (second, _rx2) = connection(2, user_id);
        registry.register(first);
        registry.register(second);

        assert!(registry.unregister(&user_id, 1).is_none());
        assert_eq!(registry.lookup(&user_id).map(|c| c.id), Some(2));

        assert!(registry.unregister(&user_id, 2).is_some());
        assert!(registry.lookup(&user_id).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn it_visits_every_user_once() {
        let mut registry = ConnectionRegistry::new();
        let (a, _rx_a) = connection(1, Uuid::new_v4());
        let (b, _rx_b) = connection(2, Uuid::new_v4());
        registry.register(a);
        registry.register(b);

        let mut ids = Vec::new();
        registry.for_each(|c| ids.push(c.id));
        ids.sort();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn it_measures_lifetime_from_registration() {
        let mut registry = ConnectionRegistry::new();
        let user_id = Uuid::new_v4();
        let before = Utc::now();
        let (conn, _rx) = connection(1, user_id);
        registry.register(conn);

        let registered = registry.lookup(&user_id).expect("connection must be registered");
        assert!(registered.connected_at >= before);
        assert!(registered.connected_at <= Utc::now());

        let later = registered.connected_at + Duration::seconds(90);
        assert_eq!(registered.lifetime(later).num_seconds(), 90);
        assert_eq!(registered.lifetime(registered.connected_at), Duration::zero());
    }
}
