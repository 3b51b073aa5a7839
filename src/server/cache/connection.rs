use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use redis::aio::MultiplexedConnection;
use redis::{Client, ConnectionInfo, ErrorKind, RedisError};
use tokio::sync::watch;
use tokio::time;

/// Connect timeout for a new connection, matches the usual redis client default.
/// Commands on an open connection are not bounded by it.
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2000);
/// Database selected on every new connection.
pub(crate) const DEFAULT_DATABASE: i64 = 0;

/// Connection handed out by the pool. Goes back to the pool when dropped.
pub(crate) type Connection = bb8::PooledConnection<'static, CacheConnectionManager>;

/// Last failed connect attempt, enough to rebuild the error for a waiting borrower.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ConnectFailure {
    pub kind: ErrorKind,
    pub detail: String,
}

impl From<&RedisError> for ConnectFailure {
    fn from(e: &RedisError) -> Self {
        Self {
            kind: e.kind(),
            detail: e.to_string(),
        }
    }
}

impl From<ConnectFailure> for RedisError {
    fn from(f: ConnectFailure) -> Self {
        (f.kind, "failed to connect to cache", f.detail).into()
    }
}

/// Broadcasts every failed connect attempt. The pool itself only waits out its
/// timeout on a failed connect, borrowers subscribe here to fail early.
pub(crate) type ConnectFailures = Arc<watch::Sender<Option<ConnectFailure>>>;

/// Tells the pool how to open and validate a single cache connection.
pub(crate) struct CacheConnectionManager {
    client: Client,
    timeout: Duration,
    failures: ConnectFailures,
}

impl CacheConnectionManager {
    pub fn new(info: ConnectionInfo, timeout: Duration) -> Result<Self, RedisError> {
        // opening a client only parses the address, no I/O happens here
        let client = Client::open(info)?;
        let (failures, _) = watch::channel(None);
        Ok(Self { client, timeout, failures: Arc::new(failures) })
    }

    pub fn connection_info(&self) -> &ConnectionInfo {
        self.client.get_connection_info()
    }

    pub fn failures(&self) -> ConnectFailures {
        self.failures.clone()
    }

    async fn open(&self) -> Result<MultiplexedConnection, RedisError> {
        match time::timeout(self.timeout, self.client.get_multiplexed_async_connection()).await {
            Ok(res) => res,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("connect timed out after {}ms", self.timeout.as_millis()),
            )
            .into()),
        }
    }
}

#[async_trait]
impl bb8::ManageConnection for CacheConnectionManager {
    type Connection = MultiplexedConnection;
    type Error = RedisError;

    async fn connect(&self) -> Result<Self::Connection, Self::Error> {
        let res = self.open().await;
        match &res {
            Ok(_) => debug!("cache connection created"),
            Err(e) => {
                // send_replace works with no borrower subscribed
                self.failures.send_replace(Some(ConnectFailure::from(e)));
            }
        }
        res
    }

    async fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        let pong: String = redis::cmd("PING").query_async(conn).await?;
        match pong.as_str() {
            "PONG" => Ok(()),
            _ => Err((ErrorKind::ResponseError, "ping request").into()),
        }
    }

    fn has_broken(&self, _: &mut Self::Connection) -> bool {
        false
    }
}

/// Logs errors the pool would otherwise drop.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LogErrorSink;

impl bb8::ErrorSink<RedisError> for LogErrorSink {
    fn sink(&self, e: RedisError) {
        warn!("cache pool error, {}", e);
    }

    fn boxed_clone(&self) -> Box<dyn bb8::ErrorSink<RedisError>> {
        Box::new(*self)
    }
}
