use auditdesk_auth::SessionChange;
use auditdesk_core::Table;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;
use uuid::Uuid;

use crate::config::{ConfigError, STORE_SERVICE_KEY, StoreConfig};
use crate::query::Query;
use crate::session_context::SessionContext;
use crate::store::{DataAccessError, DataResult, DataStore, Row};

const PREFER: &str = "Prefer";

#[derive(Debug, Clone)]
enum Bearer {
    /// Signed-in user's access token, falling back to the public key.
    Session(SessionContext),
    /// Fixed privileged key (server-side use only).
    Service(String),
}

/// PostgREST-backed store (`{url}/rest/v1/{table}`).
#[derive(Debug, Clone)]
pub struct RestStore {
    http: reqwest::Client,
    base: String,
    api_key: String,
    bearer: Bearer,
}

impl RestStore {
    /// Client-side store acting as the signed-in user.
    pub fn new(http: reqwest::Client, config: &StoreConfig, session: SessionContext) -> Self {
        Self {
            http,
            base: config.rest_base(),
            api_key: config.public_key.clone(),
            bearer: Bearer::Session(session),
        }
    }

    /// Store acting with the service key; bypasses row-level policies.
    pub fn privileged(http: reqwest::Client, config: &StoreConfig) -> Result<Self, ConfigError> {
        let key = config
            .service_key
            .clone()
            .ok_or(ConfigError::Missing(STORE_SERVICE_KEY))?;
        Ok(Self {
            http,
            base: config.rest_base(),
            api_key: key.clone(),
            bearer: Bearer::Service(key),
        })
    }

    fn request(&self, method: Method, table: Table) -> RequestBuilder {
        let token = match &self.bearer {
            Bearer::Session(ctx) => ctx.access_token().unwrap_or_else(|| self.api_key.clone()),
            Bearer::Service(key) => key.clone(),
        };
        self.http
            .request(method, format!("{}/{}", self.base, table.as_str()))
            .header("apikey", &self.api_key)
            .bearer_auth(token)
    }

    async fn send(&self, req: RequestBuilder) -> DataResult<Response> {
        let resp = req
            .send()
            .await
            .map_err(|e| DataAccessError::Network(e.to_string()))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status == StatusCode::UNAUTHORIZED {
            if let Bearer::Session(ctx) = &self.bearer {
                if ctx.access_token().is_some() {
                    tracing::warn!("store rejected the session token; announcing expiry");
                    ctx.notify(SessionChange::Expired);
                }
            }
        }
        let body = resp.text().await.unwrap_or_default();
        Err(DataAccessError::api(status.as_u16(), error_message(status, &body)))
    }

    async fn rows(resp: Response) -> DataResult<Vec<Row>> {
        let value: Value = resp
            .json()
            .await
            .map_err(|e| DataAccessError::decode(e.to_string()))?;
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(row) => Ok(row),
                    other => Err(DataAccessError::decode(format!("expected a row object, got {other}"))),
                })
                .collect(),
            Value::Object(row) => Ok(vec![row]),
            other => Err(DataAccessError::decode(format!("expected rows, got {other}"))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PostgrestError {
    message: Option<String>,
    details: Option<String>,
}

fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<PostgrestError>(body) {
        Ok(PostgrestError {
            message: Some(message),
            details,
        }) => match details {
            Some(d) if !d.is_empty() => format!("{message} ({d})"),
            _ => message,
        },
        _ if !body.trim().is_empty() => body.trim().to_string(),
        _ => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    }
}

/// Total from a `Content-Range` header: `0-24/25` or `*/0`.
pub fn parse_content_range(header: &str) -> Option<u64> {
    let (_, total) = header.rsplit_once('/')?;
    total.trim().parse().ok()
}

fn id_filter(id: Uuid) -> [(&'static str, String); 1] {
    [("id", format!("eq.{id}"))]
}

#[async_trait::async_trait]
impl DataStore for RestStore {
    #[instrument(skip(self, query), fields(table = %query.target()), err)]
    async fn select(&self, query: &Query) -> DataResult<Vec<Row>> {
        query.relations()?;
        let req = self.request(Method::GET, query.target()).query(&query.to_params());
        let resp = self.send(req).await?;
        Self::rows(resp).await
    }

    #[instrument(skip(self, query), fields(table = %query.target()), err)]
    async fn count(&self, query: &Query) -> DataResult<u64> {
        let req = self
            .request(Method::HEAD, query.target())
            .query(&query.filter_params())
            .header(PREFER, "count=exact");
        let resp = self.send(req).await?;
        resp.headers()
            .get(reqwest::header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| DataAccessError::decode("missing or malformed Content-Range header"))
    }

    #[instrument(skip(self, row), fields(table = %table), err)]
    async fn insert(&self, table: Table, row: Row) -> DataResult<Row> {
        let req = self
            .request(Method::POST, table)
            .header(PREFER, "return=representation")
            .json(&row);
        let resp = self.send(req).await?;
        Self::rows(resp)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DataAccessError::decode("insert returned no row"))
    }

    #[instrument(skip(self, rows), fields(table = %table, count = rows.len()), err)]
    async fn upsert(&self, table: Table, rows: Vec<Row>, on_conflict: &str) -> DataResult<Vec<Row>> {
        let req = self
            .request(Method::POST, table)
            .query(&[("on_conflict", on_conflict)])
            .header(PREFER, "resolution=merge-duplicates,return=representation")
            .json(&rows);
        let resp = self.send(req).await?;
        Self::rows(resp).await
    }

    #[instrument(skip(self, patch), fields(table = %table, id = %id), err)]
    async fn update(&self, table: Table, id: Uuid, patch: Row) -> DataResult<Row> {
        let req = self
            .request(Method::PATCH, table)
            .query(&id_filter(id))
            .header(PREFER, "return=representation")
            .json(&patch);
        let resp = self.send(req).await?;
        Self::rows(resp)
            .await?
            .into_iter()
            .next()
            .ok_or(DataAccessError::NotFound { table, id })
    }

    #[instrument(skip(self), fields(table = %table, id = %id), err)]
    async fn delete(&self, table: Table, id: Uuid) -> DataResult<()> {
        let req = self.request(Method::DELETE, table).query(&id_filter(id));
        self.send(req).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_range_totals() {
        assert_eq!(parse_content_range("0-24/25"), Some(25));
        assert_eq!(parse_content_range("*/0"), Some(0));
        assert_eq!(parse_content_range("*/*"), None);
        assert_eq!(parse_content_range("garbage"), None);
    }

    #[test]
    fn error_messages_prefer_postgrest_message() {
        let body = r#"{"code":"23505","message":"duplicate key","details":"Key (id) exists"}"#;
        assert_eq!(
            error_message(StatusCode::CONFLICT, body),
            "duplicate key (Key (id) exists)"
        );
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, ""), "Bad Gateway");
        assert_eq!(error_message(StatusCode::BAD_REQUEST, "oops"), "oops");
    }
}
