use serde::{Deserialize, Serialize};
use crate::server::cache::client::{AuthMode, PooledClient};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub(crate) struct PingResponse {
    pub reply: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub(crate) struct StatsResponse {
    pub max_total: u32,
    pub max_idle: u32,
    pub max_wait_millis: Option<u64>, // absent when borrowers wait indefinitely
    pub test_on_borrow: bool,
    pub authenticated: bool,
    pub closed: bool,
    pub connections: u32,
    pub idle_connections: u32,
}

impl From<&PooledClient> for StatsResponse {
    fn from(client: &PooledClient) -> Self {
        let tuning = client.tuning();
        let state = client.state();
        Self {
            max_total: tuning.max_total,
            max_idle: tuning.max_idle,
            max_wait_millis: tuning.max_wait.map(|wait| u64::try_from(wait.as_millis()).unwrap_or(u64::MAX)),
            test_on_borrow: tuning.test_on_borrow,
            authenticated: client.auth_mode() == AuthMode::Password,
            closed: client.is_closed(),
            connections: state.connections,
            idle_connections: state.idle_connections,
        }
    }
}
