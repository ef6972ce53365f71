use std::sync::Arc;

use crate::config::StoreConfig;
use crate::functions::FunctionsClient;
use crate::identity::{IdentityProvider, RestIdentityProvider};
use crate::session_context::SessionContext;
use crate::store::{DataStore, RestStore};

/// The configured handle to the hosted backend: data store, identity
/// provider and functions client sharing one HTTP client and one session
/// context. Construct once at startup.
#[derive(Clone)]
pub struct Backend {
    pub config: StoreConfig,
    pub store: Arc<dyn DataStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub functions: FunctionsClient,
    pub session: SessionContext,
}

impl Backend {
    pub fn connect(config: StoreConfig) -> Self {
        let http = reqwest::Client::new();
        let session = SessionContext::new();
        let store = RestStore::new(http.clone(), &config, session.clone());
        let identity = RestIdentityProvider::new(http.clone(), &config, session.clone());
        let functions = FunctionsClient::new(http, &config);
        tracing::info!(url = %config.url, privileged = config.service_key.is_some(), "backend configured");
        Self {
            config,
            store: Arc::new(store),
            identity: Arc::new(identity),
            functions,
            session,
        }
    }
}
