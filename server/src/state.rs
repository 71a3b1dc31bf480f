use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use system::ConnectionId;

use crate::config::Config;
use crate::notifier::Notifier;
use crate::server::ServerTx;
use crate::session::SessionValidator;
use crate::store::{SessionStore, TimerStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub timers: Arc<dyn TimerStore>,
    pub users: Arc<dyn UserStore>,
    pub sessions: SessionValidator,
    pub notifier: Notifier,
    pub srv_tx: ServerTx,
    connection_ids: Arc<AtomicU64>,
}

impl AppState {
    pub fn new<S>(config: &Config, store: Arc<S>, srv_tx: ServerTx) -> Self
    where
        S: TimerStore + UserStore + SessionStore + 'static,
    {
        Self {
            timers: store.clone(),
            users: store.clone(),
            sessions: SessionValidator::new(store.clone(), store, config.session_ttl()),
            notifier: Notifier::new(srv_tx.clone()),
            srv_tx,
            connection_ids: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn next_connection_id(&self) -> ConnectionId {
        self.connection_ids.fetch_add(1, Ordering::SeqCst)
    }
}
