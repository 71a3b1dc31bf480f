use std::sync::Arc;

use actix_web::{App, HttpServer};

use timer_sync_server::config::Config;
use timer_sync_server::handlers::root;
use timer_sync_server::server::spawn_server;
use timer_sync_server::state::AppState;
use timer_sync_server::store::MemoryStore;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let store = Arc::new(MemoryStore::new());
    let srv_tx = spawn_server(store.clone());
    let state = AppState::new(&config, store, srv_tx);

    log::info!("Server started on http://{}:{}", config.host, config.port);
    HttpServer::new(move || App::new().data(state.clone()).configure(root))
        .bind(config.bind_address())?
        .run()
        .await
}
