use crate::server::cache::client::PooledClient;

#[derive(Clone)]
pub(crate) struct AppState {
    cache: PooledClient,
}

impl AppState {
    pub fn new(cache: PooledClient) -> Self {
        Self {
            cache,
        }
    }

    pub fn get_cache(&self) -> PooledClient {
        self.cache.clone()
    }
}
