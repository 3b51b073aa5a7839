use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use log::info;

use crate::server::cache::client::PooledClient;
use crate::server::cache::error::ConfigurationError;
use crate::server::cache::factory::build;
use crate::server::model::config::ConnectionConfig;

/// Kind of application the client is being wired into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ApplicationContext {
    Web,
    NonWeb,
}

impl FromStr for ApplicationContext {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "web" => Ok(Self::Web),
            "non-web" => Ok(Self::NonWeb),
            s => Err(format!("Invalid application context: {s}")),
        }
    }
}

/// Lazily builds one client per distinct config and hands out clones of it.
pub(crate) struct ClientHolder {
    clients: Mutex<Vec<(ConnectionConfig, PooledClient)>>,
}

impl ClientHolder {
    pub const fn new() -> Self {
        Self {
            clients: Mutex::new(Vec::new()),
        }
    }

    pub fn get_or_build(&self, config: &ConnectionConfig) -> Result<PooledClient, ConfigurationError> {
        // held across build so concurrent callers never construct twice
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((_, client)) = clients.iter().find(|(c, _)| c == config) {
            return Ok(client.clone());
        }
        let client = build(config)?;
        clients.push((config.clone(), client.clone()));
        Ok(client)
    }
}

static CACHE_CLIENT: ClientHolder = ClientHolder::new();

/// Process-wide cache client, only available to web applications.
pub(crate) fn cache_client(
    context: ApplicationContext,
    config: &ConnectionConfig,
) -> Result<Option<PooledClient>, ConfigurationError> {
    match context {
        ApplicationContext::Web => CACHE_CLIENT.get_or_build(config).map(Some),
        ApplicationContext::NonWeb => {
            info!("not a web application, cache client is not registered");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ConnectionConfig {
        ConnectionConfig {
            host: "cache.local".to_string(),
            max_wait_millis: 2000,
            ..Default::default()
        }
    }

    #[actix_web::test]
    async fn test_same_config_same_client() {
        let holder = ClientHolder::new();
        let a = holder.get_or_build(&config()).unwrap();
        let b = holder.get_or_build(&config()).unwrap();
        a.close();
        assert!(b.is_closed()); // both point at one pool
    }

    #[actix_web::test]
    async fn test_distinct_configs_distinct_clients() {
        let holder = ClientHolder::new();
        let a = holder.get_or_build(&config()).unwrap();
        let b = holder
            .get_or_build(&ConnectionConfig { port: 6380, ..config() })
            .unwrap();
        a.close();
        assert!(!b.is_closed());
    }

    #[actix_web::test]
    async fn test_failed_build_is_not_cached() {
        let holder = ClientHolder::new();
        let bad = ConnectionConfig { host: String::new(), ..config() };
        assert!(holder.get_or_build(&bad).is_err());
        assert!(holder.get_or_build(&bad).is_err());
        assert!(holder.clients.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_concurrent_callers_share_one_client() {
        let holder = ClientHolder::new();
        let runtime = tokio::runtime::Handle::current();
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    let _guard = runtime.enter();
                    holder.get_or_build(&config()).unwrap();
                });
            }
        });
        assert_eq!(holder.clients.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_context_from_str() {
        assert_eq!("web".parse::<ApplicationContext>(), Ok(ApplicationContext::Web));
        assert_eq!("non-web".parse::<ApplicationContext>(), Ok(ApplicationContext::NonWeb));
        assert!("worker".parse::<ApplicationContext>().is_err());
    }

    #[actix_web::test]
    async fn test_activation() {
        let config = ConnectionConfig { port: 6390, ..config() };
        assert!(cache_client(ApplicationContext::NonWeb, &config).unwrap().is_none());
        let client = cache_client(ApplicationContext::Web, &config).unwrap().unwrap();
        assert_eq!(client.tuning().max_wait, Some(std::time::Duration::from_millis(2000)));
        assert!(cache_client(ApplicationContext::Web, &ConnectionConfig { port: 0, ..config }).is_err());
    }
}
