use axum::{Router, routing::post};

use auditdesk_infra::functions::DEMO_SEED_PATH;

pub mod functions;
pub mod system;

/// Router for the bearer-protected function endpoints.
pub fn router() -> Router {
    Router::new().route(DEMO_SEED_PATH, post(functions::demo_seed))
}
