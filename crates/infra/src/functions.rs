//! Serverless function invocation and the demo-seed wire types.

use serde::{Deserialize, Serialize};

use crate::config::StoreConfig;
use crate::store::{DataAccessError, DataResult};

pub const DEMO_SEED_PATH: &str = "/functions/demo-seed";
pub const DEMO_SEED_OK: &str = "Demo user and data created successfully";
pub const DEMO_SEED_FAILED: &str = "Failed to create demo data";

/// Credentials of the seeded demo account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoUser {
    pub email: String,
    pub password: String,
}

/// `200` body of the demo-seed function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoSeedResponse {
    pub success: bool,
    pub message: String,
    pub user: DemoUser,
}

/// Non-`200` body of the demo-seed function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionErrorBody {
    pub error: Option<String>,
}

/// Invokes serverless functions with the public key as bearer credential.
#[derive(Debug, Clone)]
pub struct FunctionsClient {
    http: reqwest::Client,
    base: String,
    public_key: String,
}

impl FunctionsClient {
    pub fn new(http: reqwest::Client, config: &StoreConfig) -> Self {
        Self {
            http,
            base: config.functions_base(),
            public_key: config.public_key.clone(),
        }
    }

    /// Ask the backend to (re)create the demo account and dataset.
    #[tracing::instrument(skip(self), err)]
    pub async fn invoke_demo_seed(&self) -> DataResult<DemoUser> {
        let url = format!("{}/demo-seed", self.base);
        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.public_key)
            .header("apikey", &self.public_key)
            .send()
            .await
            .map_err(|e| DataAccessError::Network(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            let message = serde_json::from_str::<FunctionErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEMO_SEED_FAILED.to_string());
            return Err(DataAccessError::api(status.as_u16(), message));
        }
        let parsed: DemoSeedResponse =
            serde_json::from_str(&body).map_err(|e| DataAccessError::decode(e.to_string()))?;
        tracing::info!(email = %parsed.user.email, "demo data ready");
        Ok(parsed.user)
    }
}
