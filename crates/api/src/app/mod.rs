//! Router and shared state.
//!
//! - `routes/`: handlers, one file per area
//! - `errors.rs`: JSON error bodies

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use auditdesk_infra::{DataStore, IdentityProvider, StoreConfig};

use crate::middleware;

pub mod errors;
pub mod routes;

/// Backends the functions act on, with privileged credentials.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DataStore>,
    pub identity: Arc<dyn IdentityProvider>,
    keys: Arc<Vec<String>>,
}

impl AppState {
    pub fn new(store: Arc<dyn DataStore>, identity: Arc<dyn IdentityProvider>, keys: Vec<String>) -> Self {
        Self {
            store,
            identity,
            keys: Arc::new(keys),
        }
    }

    /// The public key, plus the service key when configured.
    pub fn keys_from(config: &StoreConfig) -> Vec<String> {
        std::iter::once(config.public_key.clone())
            .chain(config.service_key.clone())
            .collect()
    }
}

/// Build the full HTTP router (used by `main.rs` and the black-box tests).
pub fn build_app(state: AppState) -> Router {
    let auth_state = middleware::AuthState {
        accepted: state.keys.clone(),
    };

    let protected = routes::router()
        .layer(Extension(state))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn(middleware::cors_middleware)))
}
