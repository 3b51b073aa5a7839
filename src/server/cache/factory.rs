use std::time::Duration;

use log::info;
use redis::IntoConnectionInfo;

use crate::server::cache::client::{AuthMode, PoolTuning, PooledClient};
use crate::server::cache::connection::{CacheConnectionManager, LogErrorSink, DEFAULT_DATABASE, DEFAULT_TIMEOUT};
use crate::server::cache::error::ConfigurationError;
use crate::server::model::config::ConnectionConfig;

/// the pool rejects a zero wait, a borrower that must not wait gets this instead
const MIN_WAIT: Duration = Duration::from_millis(1);

/// Build a pooled cache client from `config`.
///
/// Nothing is connected yet: the pool opens connections on first borrow.
/// A non-empty password selects the authenticated path, anything else
/// connects anonymously. Must be called within a tokio runtime.
pub(crate) fn build(config: &ConnectionConfig) -> Result<PooledClient, ConfigurationError> {
    let port = validate(config)?;
    let tuning = PoolTuning {
        max_total: config.max_active,
        max_idle: config.max_idle,
        max_wait: u64::try_from(config.max_wait_millis)
            .ok()
            .map(Duration::from_millis),
        test_on_borrow: config.test_on_borrow,
    };

    let mut info = (config.host.as_str(), port)
        .into_connection_info()
        .map_err(|source| ConfigurationError::InvalidAddress { source })?;
    info.redis.db = DEFAULT_DATABASE;
    let auth = match config.password.as_deref() {
        Some(password) if !password.is_empty() => {
            info.redis.password = Some(password.to_string());
            AuthMode::Password
        }
        _ => {
            info.redis.password = None;
            AuthMode::Anonymous
        }
    };

    let manager = CacheConnectionManager::new(info, DEFAULT_TIMEOUT)
        .map_err(|source| ConfigurationError::InvalidAddress { source })?;
    let info = manager.connection_info().clone();
    let failures = manager.failures();
    let pool = bb8::Pool::builder()
        .max_size(match tuning.max_total {
            0 => u32::MAX,
            n => n,
        })
        .min_idle(None)
        .connection_timeout(tuning.max_wait.map_or(Duration::MAX, |wait| wait.max(MIN_WAIT)))
        .test_on_check_out(tuning.test_on_borrow)
        // a failed connect ends the borrow instead of being retried until max_wait
        .retry_connection(false)
        .error_sink(Box::new(LogErrorSink))
        .build_unchecked(manager);

    info!(
        "cache pool created for {}:{} auth={:?} max_total={} max_idle={} max_wait={:?}",
        config.host, port, auth, tuning.max_total, tuning.max_idle, tuning.max_wait
    );
    Ok(PooledClient::new(pool, failures, info, tuning, auth))
}

fn validate(config: &ConnectionConfig) -> Result<u16, ConfigurationError> {
    if config.host.trim().is_empty() {
        return Err(ConfigurationError::EmptyHost);
    }
    let port = match u16::try_from(config.port) {
        Ok(port) if port != 0 => port,
        _ => return Err(ConfigurationError::InvalidPort { port: config.port }),
    };
    if config.max_wait_millis < -1 {
        return Err(ConfigurationError::InvalidMaxWait {
            millis: config.max_wait_millis,
        });
    }
    Ok(port)
}
