use auditdesk_auth::{AuthError, Credentials, Identity, Session, SessionChange};
use auditdesk_core::UserId;
use chrono::{DateTime, Duration, Utc};
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tracing::instrument;
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::identity::{IdentityProvider, SignedUp};
use crate::session_context::SessionContext;

/// GoTrue-compatible identity provider (`{url}/auth/v1`).
#[derive(Debug, Clone)]
pub struct RestIdentityProvider {
    http: reqwest::Client,
    base: String,
    public_key: String,
    service_key: Option<String>,
    context: SessionContext,
}

#[derive(Debug, Deserialize)]
struct UserRecord {
    id: Uuid,
    email: Option<String>,
}

impl UserRecord {
    fn into_identity(self, fallback_email: &str) -> Identity {
        Identity {
            id: UserId::from_uuid(self.id),
            email: self.email.unwrap_or_else(|| fallback_email.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    user: UserRecord,
}

impl TokenResponse {
    fn into_session(self, fallback_email: &str) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
            .unwrap_or_else(|| Utc::now() + Duration::seconds(self.expires_in.unwrap_or(3600)));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            identity: self.user.into_identity(fallback_email),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserList {
    #[serde(default)]
    users: Vec<UserRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct GoTrueError {
    error: Option<String>,
    error_description: Option<String>,
    error_code: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

/// Map a GoTrue error response onto the auth taxonomy.
fn map_error(status: StatusCode, body: &str) -> AuthError {
    let e: GoTrueError = serde_json::from_str(body).unwrap_or_default();
    let message = e
        .error_description
        .clone()
        .or(e.msg.clone())
        .or(e.message.clone())
        .unwrap_or_else(|| body.trim().to_string());
    let lower = message.to_lowercase();

    match (e.error_code.as_deref(), e.error.as_deref()) {
        (Some("invalid_credentials"), _) => AuthError::InvalidCredentials,
        (Some("user_already_exists" | "email_exists"), _) => AuthError::DuplicateEmail,
        (Some("weak_password"), _) => AuthError::registration(message),
        (Some("refresh_token_not_found" | "session_expired" | "session_not_found"), _) => {
            AuthError::SessionExpired
        }
        (_, Some("invalid_grant")) if lower.contains("refresh token") => AuthError::SessionExpired,
        (_, Some("invalid_grant")) => AuthError::InvalidCredentials,
        _ if lower.contains("already registered") || lower.contains("already been registered") => {
            AuthError::DuplicateEmail
        }
        _ if status == StatusCode::UNPROCESSABLE_ENTITY && lower.contains("password") => {
            AuthError::registration(message)
        }
        _ => AuthError::provider(format!("{}: {message}", status.as_u16())),
    }
}

impl RestIdentityProvider {
    pub fn new(http: reqwest::Client, config: &StoreConfig, context: SessionContext) -> Self {
        Self {
            http,
            base: config.auth_base(),
            public_key: config.public_key.clone(),
            service_key: config.service_key.clone(),
            context,
        }
    }

    fn public(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.public_key)
    }

    fn admin(&self, req: RequestBuilder) -> Result<RequestBuilder, AuthError> {
        let key = self.service_key.as_deref().ok_or(AuthError::PrivilegedKeyMissing)?;
        Ok(req.header("apikey", key).bearer_auth(key))
    }

    async fn send(req: RequestBuilder) -> Result<Value, AuthError> {
        let resp = req
            .send()
            .await
            .map_err(|e| AuthError::provider(format!("network error: {e}")))?;
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(map_error(status, &body));
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| AuthError::provider(format!("unexpected response: {e}")))
    }

    fn decode<T: for<'de> Deserialize<'de>>(value: Value) -> Result<T, AuthError> {
        serde_json::from_value(value).map_err(|e| AuthError::provider(format!("unexpected response: {e}")))
    }

    fn adopt(&self, session: &Session) {
        self.context.set_access_token(session.access_token.clone());
    }
}

#[async_trait::async_trait]
impl IdentityProvider for RestIdentityProvider {
    #[instrument(skip(self, credentials), fields(email = %credentials.email), err)]
    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let req = self
            .public(self.http.post(format!("{}/token", self.base)))
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": credentials.email, "password": credentials.password }));
        let token: TokenResponse = Self::decode(Self::send(req).await?)?;
        let session = token.into_session(&credentials.email);
        self.adopt(&session);
        Ok(session)
    }

    #[instrument(skip(self, credentials, metadata), fields(email = %credentials.email), err)]
    async fn sign_up(&self, credentials: &Credentials, metadata: Value) -> Result<SignedUp, AuthError> {
        let req = self.public(self.http.post(format!("{}/signup", self.base))).json(&json!({
            "email": credentials.email,
            "password": credentials.password,
            "data": metadata,
        }));
        let value = Self::send(req).await?;
        if value.get("access_token").is_some() {
            let token: TokenResponse = Self::decode(value)?;
            let session = token.into_session(&credentials.email);
            self.adopt(&session);
            return Ok(SignedUp {
                identity: session.identity.clone(),
                session: Some(session),
            });
        }
        let user: UserRecord = Self::decode(value)?;
        Ok(SignedUp {
            identity: user.into_identity(&credentials.email),
            session: None,
        })
    }

    #[instrument(skip(self, session), err)]
    async fn sign_out(&self, session: &Session) -> Result<(), AuthError> {
        let req = self
            .public(self.http.post(format!("{}/logout", self.base)))
            .bearer_auth(&session.access_token);
        let result = Self::send(req).await.map(|_| ());
        self.context.clear_access_token();
        result
    }

    #[instrument(skip(self, session), err)]
    async fn refresh_session(&self, session: &Session) -> Result<Session, AuthError> {
        let req = self
            .public(self.http.post(format!("{}/token", self.base)))
            .query(&[("grant_type", "refresh_token")])
            .json(&json!({ "refresh_token": session.refresh_token }));
        let value = Self::send(req).await.map_err(|e| match e {
            AuthError::InvalidCredentials => AuthError::SessionExpired,
            other => other,
        })?;
        let token: TokenResponse = Self::decode(value)?;
        let refreshed = token.into_session(&session.identity.email);
        self.adopt(&refreshed);
        Ok(refreshed)
    }

    fn adopt_session(&self, session: &Session) {
        self.adopt(session);
    }

    fn clear_session(&self) {
        self.context.clear_access_token();
    }

    #[instrument(skip(self, credentials), fields(email = %credentials.email), err)]
    async fn admin_create_user(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        let req = self.admin(self.http.post(format!("{}/admin/users", self.base)))?.json(&json!({
            "email": credentials.email,
            "password": credentials.password,
            "email_confirm": true,
        }));
        let user: UserRecord = Self::decode(Self::send(req).await?)?;
        Ok(user.into_identity(&credentials.email))
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn admin_delete_user(&self, id: UserId) -> Result<(), AuthError> {
        let req = self.admin(self.http.delete(format!("{}/admin/users/{id}", self.base)))?;
        Self::send(req).await.map(|_| ())
    }

    #[instrument(skip(self), err)]
    async fn admin_find_user(&self, email: &str) -> Result<Option<Identity>, AuthError> {
        let req = self
            .admin(self.http.get(format!("{}/admin/users", self.base)))?
            .query(&[("page", "1"), ("per_page", "1000")]);
        let list: UserList = Self::decode(Self::send(req).await?)?;
        let wanted = email.trim().to_lowercase();
        Ok(list
            .users
            .into_iter()
            .find(|u| u.email.as_deref().is_some_and(|e| e.to_lowercase() == wanted))
            .map(|u| u.into_identity(email)))
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.context.subscribe()
    }
}
