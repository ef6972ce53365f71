use axum::{
    Json,
    extract::Extension,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::instrument;

use auditdesk_infra::functions::DEMO_SEED_OK;
use auditdesk_infra::{DemoSeedResponse, seed_demo_data};

use crate::app::AppState;
use crate::app::errors::seed_error_to_response;

/// Create the demo admin and upsert the fixed dataset. Safe to repeat.
#[instrument(skip(state))]
pub async fn demo_seed(Extension(state): Extension<AppState>) -> Response {
    match seed_demo_data(state.store.as_ref(), state.identity.as_ref(), Utc::now()).await {
        Ok(user) => Json(DemoSeedResponse {
            success: true,
            message: DEMO_SEED_OK.to_string(),
            user,
        })
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "demo seed failed");
            seed_error_to_response(&e)
        }
    }
}
