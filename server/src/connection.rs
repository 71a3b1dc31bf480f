use actix::{
    Actor, ActorContext, ActorFuture, AsyncContext, Handler, Message, Running, StreamHandler,
    WrapFuture,
};
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use actix_web_actors::ws::{CloseCode, CloseReason};
use serde::{Deserialize, Serialize};
use system::{serde_json, ConnectionId, ErrorFrame, PushMessage, UserId};

use crate::registry::Connection;
use crate::server::{ServerCommand, ServerTx};
use crate::session::{AuthError, SessionValidator};
use crate::state::AppState;

const EGRESS_BUFFER: usize = 32;

#[derive(Debug)]
pub enum ConnectionEvent {
    Push(PushMessage),
    /// A newer connection of the same user took over.
    Superseded,
    /// The hub dropped this connection's sender.
    Released,
}

#[derive(Message)]
#[rtype(result = "()")]
struct ConnectionActorMessage(ConnectionEvent);

#[derive(Debug, Clone, Copy, PartialEq)]
enum ConnectionState {
    Pending,
    Active(UserId),
    Rejected,
    Closed,
}

struct ConnectionActor {
    id: ConnectionId,
    token: Option<String>,
    state: ConnectionState,
    srv_tx: ServerTx,
    sessions: SessionValidator,
}

impl ConnectionActor {
    fn activate(&mut self, user_id: UserId, ctx: &mut ws::WebsocketContext<Self>) {
        let (tx, mut rx) = tokio::sync::mpsc::channel::<ConnectionEvent>(EGRESS_BUFFER);

        let connection = Connection::new(self.id, user_id, tx);
        if self
            .srv_tx
            .send(ServerCommand::Connect { connection })
            .is_err()
        {
            log::error!("Server loop is gone, closing connection {}", self.id);
            self.state = ConnectionState::Closed;
            ctx.close(Some(CloseCode::Error.into()));
            ctx.stop();
            return;
        }
        self.state = ConnectionState::Active(user_id);

        let addr = ctx.address().recipient();
        let connection_id = self.id;
        tokio::spawn(async move {
            log::debug!("connection {} egress - started", connection_id);
            while let Some(event) = rx.recv().await {
                if addr.do_send(ConnectionActorMessage(event)).is_err() {
                    break;
                }
            }
            // The sender is gone once the registry lets go of this connection.
            let _ = addr.do_send(ConnectionActorMessage(ConnectionEvent::Released));
            log::debug!("connection {} egress - terminated", connection_id);
        });
    }

    fn reject(&mut self, reason: &str, ctx: &mut ws::WebsocketContext<Self>) {
        log::warn!("Rejecting connection {}: {}", self.id, reason);
        send_json(ctx, &ErrorFrame::new(reason));
        ctx.close(Some(CloseReason {
            code: CloseCode::Policy,
            description: Some(reason.to_string()),
        }));
        self.state = ConnectionState::Rejected;
        ctx.stop();
    }
}

impl Actor for ConnectionActor {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let token = match self.token.take().filter(|t| !t.is_empty()) {
            Some(token) => token,
            None => return self.reject("Unauthorized: No sessionId provided", ctx),
        };

        let sessions = self.sessions.clone();
        let validation = async move { sessions.validate(&token).await };
        ctx.wait(
            validation
                .into_actor(self)
                .map(|result, act, ctx| match result {
                    Ok(user_id) => act.activate(user_id, ctx),
                    Err(AuthError::Unauthorized) => {
                        act.reject("Unauthorized: Invalid sessionId", ctx)
                    }
                    Err(AuthError::Store(err)) => {
                        log::error!("Session lookup failed for connection {}: {}", act.id, err);
                        act.reject("Internal server error", ctx)
                    }
                }),
        );
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        if let ConnectionState::Active(user_id) = self.state {
            let disconnect = ServerCommand::Disconnect {
                user_id,
                connection_id: self.id,
            };
            if self.srv_tx.send(disconnect).is_err() {
                log::warn!("Server loop is gone, connection {} not unregistered", self.id);
            }
        }
        self.state = ConnectionState::Closed;

        Running::Stop
    }
}

/// Ingress
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ConnectionActor {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => ctx.pong(&msg),
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Err(err) => {
                log::warn!("Protocol error on connection {}: {}", self.id, err);
                ctx.stop();
            }
            // the channel is push-only
            _ => (),
        }
    }
}

/// Egress
impl Handler<ConnectionActorMessage> for ConnectionActor {
    type Result = ();

    fn handle(
        &mut self,
        msg: ConnectionActorMessage,
        ctx: &mut ws::WebsocketContext<Self>,
    ) -> Self::Result {
        if let ConnectionState::Active(_) = self.state {
            match msg.0 {
                ConnectionEvent::Push(message) => {
                    log::debug!("Egress to connection {}", self.id);
                    send_json(ctx, &message);
                }
                ConnectionEvent::Superseded => {
                    ctx.close(Some(CloseReason {
                        code: CloseCode::Policy,
                        description: Some("superseded by a newer connection".into()),
                    }));
                    ctx.stop();
                }
                ConnectionEvent::Released => {
                    log::info!("Connection {} released by the hub", self.id);
                    ctx.close(Some(CloseReason {
                        code: CloseCode::Policy,
                        description: Some("released by the server".into()),
                    }));
                    ctx.stop();
                }
            }
        }
    }
}

fn send_json<T: Serialize>(ctx: &mut ws::WebsocketContext<ConnectionActor>, value: &T) {
    match serde_json::to_string(value) {
        Ok(text) => ctx.text(text),
        Err(err) => log::error!("Failed to encode frame: {}", err),
    }
}

#[derive(Deserialize)]
struct HandshakeQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    app: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let token = web::Query::<HandshakeQuery>::from_query(req.query_string())
        .ok()
        .and_then(|q| q.into_inner().session_id);

    ws::start(
        ConnectionActor {
            id: app.next_connection_id(),
            token,
            state: ConnectionState::Pending,
            srv_tx: app.srv_tx.clone(),
            sessions: app.sessions.clone(),
        },
        &req,
        stream,
    )
}
