use std::sync::Arc;

use anyhow::Context;
use auditdesk_api::app::{AppState, build_app};
use auditdesk_infra::{RestIdentityProvider, RestStore, SessionContext, StoreConfig};

const BIND_ADDR: &str = "BIND_ADDR";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    auditdesk_observability::init();

    let config = StoreConfig::from_env().context("loading store configuration")?;
    let http = reqwest::Client::new();
    let store = RestStore::privileged(http.clone(), &config).context("demo seeding needs the service key")?;
    let identity = RestIdentityProvider::new(http, &config, SessionContext::new());

    let state = AppState::new(Arc::new(store), Arc::new(identity), AppState::keys_from(&config));
    let app = build_app(state);

    let addr = std::env::var(BIND_ADDR).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
