//! application entry point

use crate::server::cache::holder::ApplicationContext;
use crate::server::model::config::{ConnectionConfig, ServerConfig};
use log::{error, info};
use std::env;
use std::io;
use std::net::SocketAddrV4;
use std::path::Path;
use std::str::FromStr;
use derive_more::Display;

mod server;

const DOTENV_LOADING_FAILED_MSG: &str = "failed to load envs from dotenv files, aborting";
const HOST_PARSING_FAILED_MSG: &str = "failed to parse HOST, aborting";
const DEFAULT_HOST_ADDR: &str = "127.0.0.1:8080";

#[actix_web::main()]
async fn main() -> io::Result<()> {
    // bootstrap
    // a. env
    let env = env::var("APP_ENV")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(Env::Dev); // default dev env if absent

    match env {
        Env::Prod | Env::Stg => {} // load in CI
        Env::Dev => dotenvy::from_path(Path::new(".env.dev"))
            .expect(DOTENV_LOADING_FAILED_MSG),
    };

    // b. logging
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // c. run app
    let cache = ConnectionConfig::from_env().map_err(|e| {
        error!("failed to load cache properties, {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;
    let addr = SocketAddrV4::from_str(
        env::var("HOST")
            .unwrap_or(DEFAULT_HOST_ADDR.to_string())
            .as_str(),
    )
    .map_err(|e| {
        error!("{}, {}", HOST_PARSING_FAILED_MSG, e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;
    // only a web application gets the cache client
    let context = env::var("APP_CONTEXT")
        .unwrap_or("web".to_string())
        .parse::<ApplicationContext>()
        .map_err(|e| {
            error!("{}", e);
            io::Error::new(io::ErrorKind::InvalidInput, e)
        })?;
    let config = ServerConfig::new(addr, context, cache);

    info!("App is starting in env={} context={:?}", env, config.context);

    server::run(config).await
}

#[derive(Debug, Display)]
#[non_exhaustive]
enum Env {
    Dev,
    Stg,
    Prod,
}

impl FromStr for Env {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dev" => Ok(Self::Dev),
            "stg" => Ok(Self::Stg),
            "prod" => Ok(Self::Prod),
            s => Err(format!("Invalid Env: {s}")),
        }
    }
}
