//! main file for the server

pub mod model;
pub(crate) mod cache;
mod controller;
mod routes;
mod state;

use std::io;
use actix_web::{middleware::Logger, web, App, HttpServer};
use log::{error, info};
use crate::server::cache::holder::cache_client;
use crate::server::model::config::ServerConfig;
use crate::server::routes::cache::{ping, stats};
use crate::server::state::AppState;

/// Run the server
pub(crate) async fn run(ServerConfig{ addr, context, cache }: ServerConfig) -> io::Result<()> {
    let client = cache_client(context, &cache).map_err(|e| {
        error!("invalid cache configuration, {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;
    if let Some(client) = &client {
        info!("cache client registered for {:?}", client.connection_info().addr);
    }
    let state = client.clone().map(|client| web::Data::new(AppState::new(client)));

    info!("listening on {}", addr);
    let res = HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(Logger::default())
            .configure(|cfg| configure_cache(cfg, state))
    })
        .bind(addr)?
        .run()
        .await;

    if let Some(client) = client {
        client.close();
    }
    res
}

/// cache routes are only mounted when a client was registered
fn configure_cache(cfg: &mut web::ServiceConfig, state: Option<web::Data<AppState>>) {
    if let Some(state) = state {
        cfg.app_data(state)
            .service(ping)
            .service(stats);
    }
}
