use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use system::chrono::Utc;
use system::{ActiveTimerView, AllTimers, ConnectionId, PushMessage, UserId};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

use crate::connection::ConnectionEvent;
use crate::error::StoreError;
use crate::registry::{Connection, ConnectionRegistry, ConnectionTx};
use crate::store::TimerStore;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

pub type ServerTx = UnboundedSender<ServerCommand>;

#[derive(Debug)]
pub enum ServerCommand {
    Connect {
        connection: Connection,
    },
    Disconnect {
        user_id: UserId,
        connection_id: ConnectionId,
    },
    Notify {
        user_id: UserId,
    },
}

/// Owns the registry. Every command and every tick runs as one step of a
/// single loop; store reads for a push happen in a task of their own.
struct Server {
    registry: ConnectionRegistry,
    timers: Arc<dyn TimerStore>,
}

impl Server {
    fn new(timers: Arc<dyn TimerStore>) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            timers,
        }
    }

    fn handle_command(&mut self, command: ServerCommand) {
        match command {
            ServerCommand::Connect { connection } => {
                let user_id = connection.user_id;
                let tx = connection.tx.clone();
                log::info!("Connection {} registered for user {}", connection.id, user_id);
                if let Some(mut replaced) = self.registry.register(connection) {
                    log::info!(
                        "Connection {} of user {} superseded after {}s",
                        replaced.id,
                        user_id,
                        replaced.lifetime(Utc::now()).num_seconds()
                    );
                    // Dropping `replaced` closes its queue, which stops the
                    // actor even when this notice doesn't fit.
                    if replaced.tx.try_send(ConnectionEvent::Superseded).is_err() {
                        log::debug!("Supersede notice for connection {} not queued", replaced.id);
                    }
                }
                self.push_all_timers(user_id, tx);
            }
            ServerCommand::Disconnect {
                user_id,
                connection_id,
            } => {
                if let Some(closed) = self.registry.unregister(&user_id, connection_id) {
                    log::info!(
                        "Connection {} of user {} closed after {}s",
                        connection_id,
                        user_id,
                        closed.lifetime(Utc::now()).num_seconds()
                    );
                } else {
                    log::debug!("Ignoring close of stale connection {}", connection_id);
                }
            }
            ServerCommand::Notify { user_id } => {
                if let Some(connection) = self.registry.lookup(&user_id) {
                    self.push_all_timers(user_id, connection.tx.clone());
                }
            }
        }
    }

    fn push_all_timers(&self, user_id: UserId, tx: ConnectionTx) {
        let timers = self.timers.clone();
        tokio::spawn(async move {
            match all_timers(timers.as_ref(), &user_id).await {
                Ok(message) => deliver(tx, &user_id, message),
                Err(err) => log::error!("Failed to load timers of user {}: {}", user_id, err),
            }
        });
    }

    /// A user whose previous tick is still loading is skipped, so a slow
    /// store holds at most one tick task per connection.
    fn broadcast_tick(&self) {
        let mut targets = Vec::with_capacity(self.registry.len());
        self.registry.for_each(|c| {
            if c.tick_in_flight.swap(true, Ordering::SeqCst) {
                log::debug!("Previous tick of user {} still in flight, skipping", c.user_id);
            } else {
                targets.push((c.user_id, c.tx.clone(), c.tick_in_flight.clone()));
            }
        });

        for (user_id, tx, in_flight) in targets {
            let timers = self.timers.clone();
            tokio::spawn(async move {
                match active_timers(timers.as_ref(), &user_id).await {
                    Ok(message) => deliver(tx, &user_id, message),
                    Err(err) => {
                        log::error!("Failed to load active timers of user {}: {}", user_id, err)
                    }
                }
                in_flight.store(false, Ordering::SeqCst);
            });
        }
    }
}

pub async fn all_timers(
    timers: &dyn TimerStore,
    user_id: &UserId,
) -> Result<PushMessage, StoreError> {
    let active_timers = timers.find_active(user_id).await?;
    let completed_timers = timers.find_completed(user_id).await?;
    Ok(PushMessage::AllTimers(AllTimers {
        active_timers,
        completed_timers,
    }))
}

pub async fn active_timers(
    timers: &dyn TimerStore,
    user_id: &UserId,
) -> Result<PushMessage, StoreError> {
    let active = timers.find_active(user_id).await?;
    let now = Utc::now();
    Ok(PushMessage::ActiveTimers(
        active
            .into_iter()
            .map(|timer| ActiveTimerView::at(timer, now))
            .collect(),
    ))
}

fn deliver(mut tx: ConnectionTx, user_id: &UserId, message: PushMessage) {
    match tx.try_send(ConnectionEvent::Push(message)) {
        Ok(()) => (),
        Err(TrySendError::Full(_)) => {
            log::warn!("Egress queue of user {} is full, dropping push", user_id)
        }
        Err(TrySendError::Closed(_)) => {
            log::debug!("Connection of user {} already closed, dropping push", user_id)
        }
    }
}

pub fn spawn_server(timers: Arc<dyn TimerStore>) -> ServerTx {
    let (srv_tx, mut srv_rx) = unbounded_channel::<ServerCommand>();

    tokio::spawn(async move {
        let mut server = Server::new(timers);
        let mut ticks = tokio::time::interval(TICK_PERIOD);

        loop {
            tokio::select! {
                command = srv_rx.recv() => match command {
                    Some(command) => server.handle_command(command),
                    None => break,
                },
                _ = ticks.tick() => server.broadcast_tick(),
            }
        }
        log::info!("Server loop terminated");
    });

    srv_tx
}
