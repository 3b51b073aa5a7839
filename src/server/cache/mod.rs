//! pooled cache client, built from [`ConnectionConfig`](crate::server::model::config::ConnectionConfig)

pub(crate) mod client;
pub(crate) mod connection;
pub(crate) mod error;
pub(crate) mod factory;
pub(crate) mod holder;
