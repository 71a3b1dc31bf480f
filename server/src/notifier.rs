use system::UserId;

use crate::server::{ServerCommand, ServerTx};

/// Handed to mutating HTTP handlers. Never blocks and never fails the
/// request: delivery is the hub's business.
#[derive(Clone)]
pub struct Notifier {
    srv_tx: ServerTx,
}

impl Notifier {
    pub fn new(srv_tx: ServerTx) -> Self {
        Self { srv_tx }
    }

    pub fn notify(&self, user_id: UserId) {
        if self.srv_tx.send(ServerCommand::Notify { user_id }).is_err() {
            log::warn!("Server loop is gone, dropping notification for {}", user_id);
        }
    }
}
