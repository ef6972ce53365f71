//! REST backends against a fake PostgREST / GoTrue server.

use std::sync::{Arc, Mutex};

use auditdesk_auth::{AuthError, Credentials, SessionChange};
use auditdesk_core::Table;
use auditdesk_infra::{
    DataAccessError, DataStore, IdentityProvider, Query, RestIdentityProvider, RestStore, SessionContext,
    StoreConfig,
};
use axum::extract::{Path, Query as QueryParams, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

#[derive(Debug, Clone)]
struct Recorded {
    method: &'static str,
    table: String,
    params: Vec<(String, String)>,
    prefer: Option<String>,
    apikey: Option<String>,
    bearer: Option<String>,
}

type Log = Arc<Mutex<Vec<Recorded>>>;

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
}

fn record(log: &Log, method: &'static str, table: String, params: Vec<(String, String)>, headers: &HeaderMap) {
    log.lock().unwrap().push(Recorded {
        method,
        table,
        params,
        prefer: header(headers, "prefer"),
        apikey: header(headers, "apikey"),
        bearer: header(headers, "authorization").and_then(|h| h.strip_prefix("Bearer ").map(str::to_string)),
    });
}

async fn list(
    State(log): State<Log>,
    Path(table): Path<String>,
    QueryParams(params): QueryParams<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Response {
    record(&log, "GET", table.clone(), params, &headers);
    if table == "audits" {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "JWT expired"}))).into_response();
    }
    (
        [("content-range", "0-1/2")],
        Json(json!([
            {"id": "10000000-0000-0000-0000-000000000001", "name": "ABC"},
            {"id": "10000000-0000-0000-0000-000000000002", "name": "XYZ"}
        ])),
    )
        .into_response()
}

async fn create(
    State(log): State<Log>,
    Path(table): Path<String>,
    QueryParams(params): QueryParams<Vec<(String, String)>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record(&log, "POST", table, params, &headers);
    let rows = match body {
        Value::Array(rows) => rows,
        row => vec![row],
    };
    Json(Value::Array(rows)).into_response()
}

async fn patch(
    State(log): State<Log>,
    Path(table): Path<String>,
    QueryParams(params): QueryParams<Vec<(String, String)>>,
    headers: HeaderMap,
    Json(_body): Json<Value>,
) -> Response {
    record(&log, "PATCH", table, params, &headers);
    Json(json!([])).into_response()
}

async fn remove(
    State(log): State<Log>,
    Path(table): Path<String>,
    QueryParams(params): QueryParams<Vec<(String, String)>>,
    headers: HeaderMap,
) -> StatusCode {
    record(&log, "DELETE", table, params, &headers);
    StatusCode::NO_CONTENT
}

async fn token(Json(body): Json<Value>) -> Response {
    if body["password"] == "right" {
        Json(json!({
            "access_token": "user-token",
            "refresh_token": "refresh",
            "expires_in": 3600,
            "user": {"id": "00000000-0000-0000-0000-0000000000aa", "email": body["email"]}
        }))
        .into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid_grant", "error_description": "Invalid login credentials"})),
        )
            .into_response()
    }
}

async fn admin_users() -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({"code": 422, "msg": "User already registered"})),
    )
        .into_response()
}

struct TestServer {
    base_url: String,
    log: Log,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let log: Log = Arc::default();
        let app = Router::new()
            .route("/rest/v1/:table", get(list).post(create).patch(patch).delete(remove))
            .route("/auth/v1/token", post(token))
            .route("/auth/v1/admin/users", post(admin_users))
            .with_state(log.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { base_url, log, handle }
    }

    fn config(&self) -> StoreConfig {
        StoreConfig::new(self.base_url.parse().unwrap(), "public-key").with_service_key("service-key")
    }

    fn last(&self) -> Recorded {
        self.log.lock().unwrap().last().cloned().expect("no request recorded")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn select_renders_query_and_uses_public_key_until_signed_in() {
    let srv = TestServer::spawn().await;
    let ctx = SessionContext::new();
    let store = RestStore::new(reqwest::Client::new(), &srv.config(), ctx.clone());

    let rows = store
        .select(&Query::table(Table::Tasks).embed(Table::Clients).eq("status", "pending").newest_first())
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);

    let req = srv.last();
    assert_eq!(req.table, "tasks");
    assert_eq!(req.apikey.as_deref(), Some("public-key"));
    assert_eq!(req.bearer.as_deref(), Some("public-key"));
    assert!(req.params.contains(&("select".into(), "*,clients(*)".into())));
    assert!(req.params.contains(&("status".into(), "eq.pending".into())));
    assert!(req.params.contains(&("order".into(), "created_at.desc".into())));

    ctx.set_access_token("user-token");
    store.select(&Query::table(Table::Clients)).await.unwrap();
    assert_eq!(srv.last().bearer.as_deref(), Some("user-token"));
}

#[tokio::test]
async fn count_reads_content_range() {
    let srv = TestServer::spawn().await;
    let store = RestStore::new(reqwest::Client::new(), &srv.config(), SessionContext::new());
    let n = store.count(&Query::table(Table::Clients)).await.unwrap();
    assert_eq!(n, 2);
    assert_eq!(srv.last().prefer.as_deref(), Some("count=exact"));
}

#[tokio::test]
async fn upsert_sends_merge_preference_and_conflict_column() {
    let srv = TestServer::spawn().await;
    let store = RestStore::privileged(reqwest::Client::new(), &srv.config()).unwrap();
    let row = auditdesk_infra::store::to_row(&json!({"id": "10000000-0000-0000-0000-000000000001"})).unwrap();
    let out = store.upsert(Table::Clients, vec![row], "id").await.unwrap();
    assert_eq!(out.len(), 1);

    let req = srv.last();
    assert_eq!(req.method, "POST");
    assert_eq!(req.bearer.as_deref(), Some("service-key"));
    assert_eq!(req.prefer.as_deref(), Some("resolution=merge-duplicates,return=representation"));
    assert!(req.params.contains(&("on_conflict".into(), "id".into())));
}

#[tokio::test]
async fn update_with_no_matching_row_is_not_found() {
    let srv = TestServer::spawn().await;
    let store = RestStore::new(reqwest::Client::new(), &srv.config(), SessionContext::new());
    let id = uuid::Uuid::now_v7();
    let err = store.update(Table::Tasks, id, Default::default()).await.unwrap_err();
    assert_eq!(err, DataAccessError::NotFound { table: Table::Tasks, id });
    assert!(srv.last().params.contains(&("id".into(), format!("eq.{id}"))));
}

#[tokio::test]
async fn unauthorized_response_announces_expiry() {
    let srv = TestServer::spawn().await;
    let ctx = SessionContext::new();
    let mut changes = ctx.subscribe();
    ctx.set_access_token("stale");
    let store = RestStore::new(reqwest::Client::new(), &srv.config(), ctx);

    let err = store.select(&Query::table(Table::Audits)).await.unwrap_err();
    assert!(matches!(err, DataAccessError::Api { status: 401, ref message } if message == "JWT expired"));
    assert_eq!(changes.recv().await.unwrap(), SessionChange::Expired);
}

#[tokio::test]
async fn password_sign_in_adopts_token_and_maps_failures() {
    let srv = TestServer::spawn().await;
    let ctx = SessionContext::new();
    let idp = RestIdentityProvider::new(reqwest::Client::new(), &srv.config(), ctx.clone());

    let session = idp
        .sign_in_with_password(&Credentials::new("a@b.co", "right"))
        .await
        .unwrap();
    assert_eq!(session.identity.email, "a@b.co");
    assert_eq!(ctx.access_token().as_deref(), Some("user-token"));

    let err = idp
        .sign_in_with_password(&Credentials::new("a@b.co", "wrong"))
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::InvalidCredentials);
}

#[tokio::test]
async fn admin_calls_need_service_key_and_map_duplicates() {
    let srv = TestServer::spawn().await;
    let idp = RestIdentityProvider::new(reqwest::Client::new(), &srv.config(), SessionContext::new());
    let err = idp
        .admin_create_user(&Credentials::new("yunus@demo.com", "123"))
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::DuplicateEmail);

    let unprivileged = StoreConfig::new(srv.base_url.parse().unwrap(), "public-key");
    let idp = RestIdentityProvider::new(reqwest::Client::new(), &unprivileged, SessionContext::new());
    let err = idp
        .admin_delete_user(auditdesk_core::UserId::new())
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::PrivilegedKeyMissing);
}
