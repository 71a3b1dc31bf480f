use crate::connection::ws_index;
use crate::handlers::auth::configure_auth_handlers;
use crate::handlers::timers::configure_timer_handlers;
use actix_web::web;

mod auth;
mod timers;

pub fn root(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(ws_index)));

    configure_auth_handlers(cfg);
    configure_timer_handlers(cfg);
}
