use derive_more::{Display, Error};
use redis::RedisError;

/// Raised while turning properties into a pooled client. Fatal to startup.
#[derive(Debug, Display, Error)]
pub(crate) enum ConfigurationError {
    #[display("cache host must not be empty")]
    EmptyHost,
    #[display("cache port {port} is outside 1..=65535")]
    InvalidPort { port: i32 },
    #[display("max wait of {millis}ms is invalid, use -1 to wait indefinitely")]
    InvalidMaxWait { millis: i64 },
    #[display("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
    #[display("cache address rejected by client: {source}")]
    InvalidAddress { source: RedisError },
}

/// Raised at use time, when a connection is borrowed from the pool.
#[derive(Debug, Display, Error)]
pub(crate) enum ConnectionError {
    #[display("cache pool is closed")]
    Closed,
    #[display("timed out waiting for a cache connection")]
    Timeout,
    #[display("cache backend error: {source}")]
    Backend { source: RedisError },
}

impl From<bb8::RunError<RedisError>> for ConnectionError {
    fn from(e: bb8::RunError<RedisError>) -> Self {
        match e {
            bb8::RunError::User(source) => ConnectionError::Backend { source },
            bb8::RunError::TimedOut => ConnectionError::Timeout,
        }
    }
}

impl From<RedisError> for ConnectionError {
    fn from(source: RedisError) -> Self {
        ConnectionError::Backend { source }
    }
}
