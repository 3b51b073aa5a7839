use std::fmt;
use std::net::SocketAddrV4;
use std::str::FromStr;

use crate::server::cache::error::ConfigurationError;
use crate::server::cache::holder::ApplicationContext;

/// Server configs
#[derive(Debug)]
pub(crate) struct ServerConfig {
    pub addr: SocketAddrV4,
    /// decides whether the cache client gets registered
    pub context: ApplicationContext,
    pub cache: ConnectionConfig,
}

impl ServerConfig {
    pub fn new(addr: SocketAddrV4, context: ApplicationContext, cache: ConnectionConfig) -> Self {
        Self {
            addr,
            context,
            cache,
        }
    }
}

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: i32 = 6379;
const DEFAULT_MAX_ACTIVE: u32 = 8;
const DEFAULT_MAX_IDLE: u32 = 8;
const DEFAULT_MAX_WAIT_MILLIS: i64 = -1;

/// Cache connection properties, read once at startup.
#[derive(Clone, PartialEq, Eq, Hash)]
pub(crate) struct ConnectionConfig {
    pub host: String,
    pub port: i32,
    /// empty or absent means no authentication
    pub password: Option<String>,
    /// 0 means unbounded
    pub max_active: u32,
    pub max_idle: u32,
    /// -1 waits indefinitely
    pub max_wait_millis: i64,
    pub test_on_borrow: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            password: None,
            max_active: DEFAULT_MAX_ACTIVE,
            max_idle: DEFAULT_MAX_IDLE,
            max_wait_millis: DEFAULT_MAX_WAIT_MILLIS,
            test_on_borrow: false,
        }
    }
}

// keep the password out of logs
impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("max_active", &self.max_active)
            .field("max_idle", &self.max_idle)
            .field("max_wait_millis", &self.max_wait_millis)
            .field("test_on_borrow", &self.test_on_borrow)
            .finish()
    }
}

impl ConnectionConfig {
    /// read `REDIS_*` variables from the process environment
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// read properties through `lookup`, unset keys fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            host: lookup("REDIS_HOST").unwrap_or(defaults.host),
            port: parse(&lookup, "REDIS_PORT")?.unwrap_or(defaults.port),
            password: lookup("REDIS_PASSWORD"),
            max_active: parse(&lookup, "REDIS_MAX_ACTIVE")?.unwrap_or(defaults.max_active),
            max_idle: parse(&lookup, "REDIS_MAX_IDLE")?.unwrap_or(defaults.max_idle),
            max_wait_millis: parse(&lookup, "REDIS_MAX_WAIT")?.unwrap_or(defaults.max_wait_millis),
            test_on_borrow: parse(&lookup, "REDIS_TEST_ON_BORROW")?.unwrap_or(defaults.test_on_borrow),
        })
    }
}

fn parse<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigurationError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => match value.trim().parse() {
            Ok(v) => Ok(Some(v)),
            Err(_) => Err(ConfigurationError::InvalidValue { key, value }),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ConnectionConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ConnectionConfig::default());
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 6379);
        assert_eq!(config.max_wait_millis, -1);
    }

    #[test]
    fn test_overrides() {
        let config = ConnectionConfig::from_lookup(lookup_from(&[
            ("REDIS_HOST", "cache.local"),
            ("REDIS_PORT", "6380"),
            ("REDIS_PASSWORD", "secret"),
            ("REDIS_MAX_ACTIVE", "16"),
            ("REDIS_MAX_IDLE", "4"),
            ("REDIS_MAX_WAIT", " 2000 "),
            ("REDIS_TEST_ON_BORROW", "true"),
        ]))
        .unwrap();
        assert_eq!(
            config,
            ConnectionConfig {
                host: "cache.local".to_string(),
                port: 6380,
                password: Some("secret".to_string()),
                max_active: 16,
                max_idle: 4,
                max_wait_millis: 2000,
                test_on_borrow: true,
            }
        );
    }

    #[test]
    fn test_malformed_value() {
        let res = ConnectionConfig::from_lookup(lookup_from(&[("REDIS_MAX_IDLE", "-3")]));
        match res {
            Err(ConfigurationError::InvalidValue { key, value }) => {
                assert_eq!(key, "REDIS_MAX_IDLE");
                assert_eq!(value, "-3");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(ConnectionConfig::from_lookup(lookup_from(&[("REDIS_TEST_ON_BORROW", "yes")])).is_err());
    }

    #[test]
    fn test_debug_hides_password() {
        let config = ConnectionConfig {
            password: Some("secret".to_string()),
            ..Default::default()
        };
        let out = format!("{:?}", config);
        assert!(!out.contains("secret"));
        assert!(out.contains("***"));
    }
}
