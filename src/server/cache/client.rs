use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use log::info;
use redis::ConnectionInfo;

use crate::server::cache::connection::{CacheConnectionManager, ConnectFailures, Connection};
use crate::server::cache::error::ConnectionError;

/// Pool sizing and borrow behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PoolTuning {
    /// maximum concurrent connections, 0 means unbounded
    pub max_total: u32,
    /// maximum idle connections retained
    pub max_idle: u32,
    /// how long a borrower waits, `None` waits indefinitely
    pub max_wait: Option<Duration>,
    /// validate a connection with PING before handing it out
    pub test_on_borrow: bool,
}

/// Which construction path produced the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AuthMode {
    Anonymous,
    Password,
}

struct Inner {
    pool: RwLock<Option<bb8::Pool<CacheConnectionManager>>>,
    failures: ConnectFailures,
    info: ConnectionInfo,
    tuning: PoolTuning,
    auth: AuthMode,
}

/// Shared handle over a cache connection pool. Clones point at the same pool.
#[derive(Clone)]
pub(crate) struct PooledClient(Arc<Inner>);

/// Live pool counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PoolState {
    pub connections: u32,
    pub idle_connections: u32,
}

impl PooledClient {
    pub(crate) fn new(
        pool: bb8::Pool<CacheConnectionManager>,
        failures: ConnectFailures,
        info: ConnectionInfo,
        tuning: PoolTuning,
        auth: AuthMode,
    ) -> Self {
        Self(Arc::new(Inner {
            pool: RwLock::new(Some(pool)),
            failures,
            info,
            tuning,
            auth,
        }))
    }

    pub fn tuning(&self) -> &PoolTuning {
        &self.0.tuning
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.0.auth
    }

    pub fn connection_info(&self) -> &ConnectionInfo {
        &self.0.info
    }

    fn pool(&self) -> Option<bb8::Pool<CacheConnectionManager>> {
        self.0
            .pool
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// borrow a connection, waiting at most `max_wait`. The first borrow opens the first connection.
    ///
    /// A connect attempt failing while this borrow waits ends it with
    /// [`ConnectionError::Backend`], even when `max_wait` is indefinite.
    pub async fn borrow(&self) -> Result<Connection, ConnectionError> {
        let pool = self.pool().ok_or(ConnectionError::Closed)?;
        let mut failures = self.0.failures.subscribe();
        let get = pool.get_owned();
        tokio::pin!(get);
        loop {
            tokio::select! {
                res = &mut get => return Ok(res?),
                changed = failures.changed() => {
                    changed.map_err(|_| ConnectionError::Closed)?;
                    let failure = failures.borrow_and_update().clone();
                    if let Some(failure) = failure {
                        return Err(ConnectionError::from(redis::RedisError::from(failure)));
                    }
                }
            }
        }
    }

    /// hand a connection back to the pool, same as dropping it.
    pub fn release(&self, conn: Connection) {
        drop(conn);
    }

    /// detach the pool, later borrows fail. Idle connections go away once borrowed ones are returned.
    pub fn close(&self) {
        let pool = self
            .0
            .pool
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if pool.is_some() {
            info!("cache pool closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.pool().is_none()
    }

    pub fn state(&self) -> PoolState {
        match self.pool() {
            Some(pool) => {
                let state = pool.state();
                PoolState {
                    connections: state.connections,
                    idle_connections: state.idle_connections,
                }
            }
            None => PoolState {
                connections: 0,
                idle_connections: 0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::server::cache::factory::build;
    use crate::server::model::config::ConnectionConfig;
    use super::*;

    fn unreachable_config() -> ConnectionConfig {
        ConnectionConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            password: None,
            max_active: 2,
            max_idle: 2,
            max_wait_millis: 200,
            test_on_borrow: false,
        }
    }

    #[actix_web::test]
    async fn test_new_pool_is_empty() {
        let client = build(&unreachable_config()).unwrap();
        assert_eq!(client.state(), PoolState { connections: 0, idle_connections: 0 });
        assert!(!client.is_closed());
    }

    #[actix_web::test]
    async fn test_clones_share_pool() {
        let client = build(&unreachable_config()).unwrap();
        let other = client.clone();
        other.close();
        assert!(client.is_closed());
    }

    #[actix_web::test]
    async fn test_borrow_after_close() {
        let client = build(&unreachable_config()).unwrap();
        client.close();
        client.close(); // second close is a no-op
        assert!(matches!(client.borrow().await, Err(ConnectionError::Closed)));
        assert_eq!(client.state(), PoolState { connections: 0, idle_connections: 0 });
    }

    #[actix_web::test]
    async fn test_borrow_unreachable_backend() {
        let client = build(&unreachable_config()).unwrap();
        assert!(matches!(client.borrow().await, Err(ConnectionError::Backend { .. })));
        assert_eq!(client.state(), PoolState { connections: 0, idle_connections: 0 });
    }

    #[actix_web::test]
    async fn test_borrow_unreachable_backend_waiting_indefinitely() {
        let client = build(&ConnectionConfig {
            max_wait_millis: -1,
            ..unreachable_config()
        })
        .unwrap();
        assert_eq!(client.tuning().max_wait, None);
        let res = tokio::time::timeout(Duration::from_secs(5), client.borrow())
            .await
            .expect("borrow should fail once the connect attempt fails");
        assert!(matches!(res, Err(ConnectionError::Backend { .. })));

        // a second borrow reports its own failure, not a stale one
        let res = tokio::time::timeout(Duration::from_secs(5), client.borrow())
            .await
            .expect("borrow should fail once the connect attempt fails");
        assert!(matches!(res, Err(ConnectionError::Backend { .. })));
    }

    #[actix_web::test]
    async fn test_borrow_timeout_maps_to_timeout() {
        let e = ConnectionError::from(bb8::RunError::<redis::RedisError>::TimedOut);
        assert!(matches!(e, ConnectionError::Timeout));
    }
}
