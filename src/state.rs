use std::sync::Arc;

use crate::config::Config;
use crate::mail::TransportFactory;
use crate::store::AccessStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub access_store: Arc<dyn AccessStore>,
    pub transports: Arc<dyn TransportFactory>,
}

impl AppState {
    pub fn new(
        config: Config,
        access_store: Arc<dyn AccessStore>,
        transports: Arc<dyn TransportFactory>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            access_store,
            transports,
        }
    }
}
