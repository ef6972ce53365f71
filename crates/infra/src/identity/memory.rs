use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use auditdesk_auth::{AuthError, Credentials, Identity, Session, SessionChange};
use auditdesk_core::UserId;
use chrono::{Duration, Utc};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::identity::{IdentityProvider, SignedUp};
use crate::session_context::SessionContext;

/// Provider operation, used to target injected failures.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum IdentityOp {
    SignIn,
    SignUp,
    SignOut,
    Refresh,
    AdminCreate,
    AdminDelete,
    AdminFind,
}

#[derive(Debug, Clone)]
struct Account {
    id: UserId,
    email: String,
    password: String,
}

/// In-memory identity provider for tests/dev. Accounts are auto-confirmed.
#[derive(Debug)]
pub struct InMemoryIdentityProvider {
    accounts: Mutex<HashMap<String, Account>>,
    refresh_tokens: Mutex<HashMap<String, UserId>>,
    failures: Mutex<Vec<IdentityOp>>,
    ttl: Duration,
    context: SessionContext,
}

fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>, AuthError> {
    m.lock().map_err(|_| AuthError::provider("identity store lock poisoned"))
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::with_context(SessionContext::new())
    }

    pub fn with_context(context: SessionContext) -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            refresh_tokens: Mutex::new(HashMap::new()),
            failures: Mutex::new(Vec::new()),
            ttl: Duration::hours(1),
            context,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn context(&self) -> SessionContext {
        self.context.clone()
    }

    /// Make the next `op` fail with a provider error.
    pub fn fail_next(&self, op: IdentityOp) {
        if let Ok(mut f) = self.failures.lock() {
            f.push(op);
        }
    }

    pub fn has_account(&self, email: &str) -> bool {
        self.accounts
            .lock()
            .map(|a| a.contains_key(&normalize(email)))
            .unwrap_or(false)
    }

    pub fn account_count(&self) -> usize {
        self.accounts.lock().map(|a| a.len()).unwrap_or(0)
    }

    /// Revoke every issued session and announce the expiry.
    pub fn expire_sessions(&self) {
        if let Ok(mut tokens) = self.refresh_tokens.lock() {
            tokens.clear();
        }
        self.context.clear_access_token();
        self.context.notify(SessionChange::Expired);
    }

    /// Announce a change as if it happened in another context.
    pub fn simulate(&self, change: SessionChange) {
        self.context.notify(change);
    }

    fn check_failure(&self, op: IdentityOp) -> Result<(), AuthError> {
        let mut failures = lock(&self.failures)?;
        match failures.iter().position(|o| *o == op) {
            Some(i) => {
                failures.remove(i);
                Err(AuthError::provider(format!("injected {op:?} failure")))
            }
            None => Ok(()),
        }
    }

    fn issue(&self, account: &Account) -> Result<Session, AuthError> {
        let session = Session {
            access_token: Uuid::now_v7().to_string(),
            refresh_token: Uuid::now_v7().to_string(),
            expires_at: Utc::now() + self.ttl,
            identity: Identity {
                id: account.id,
                email: account.email.clone(),
            },
        };
        lock(&self.refresh_tokens)?.insert(session.refresh_token.clone(), account.id);
        self.context.set_access_token(session.access_token.clone());
        Ok(session)
    }

    fn create(&self, credentials: &Credentials) -> Result<Account, AuthError> {
        let email = normalize(&credentials.email);
        let mut accounts = lock(&self.accounts)?;
        if accounts.contains_key(&email) {
            return Err(AuthError::DuplicateEmail);
        }
        let account = Account {
            id: UserId::new(),
            email: email.clone(),
            password: credentials.password.clone(),
        };
        accounts.insert(email, account.clone());
        Ok(account)
    }
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        self.check_failure(IdentityOp::SignIn)?;
        let account = lock(&self.accounts)?
            .get(&normalize(&credentials.email))
            .cloned()
            .ok_or(AuthError::UnknownAccount)?;
        if account.password != credentials.password {
            return Err(AuthError::InvalidCredentials);
        }
        self.issue(&account)
    }

    async fn sign_up(
        &self,
        credentials: &Credentials,
        _metadata: serde_json::Value,
    ) -> Result<SignedUp, AuthError> {
        self.check_failure(IdentityOp::SignUp)?;
        let account = self.create(credentials)?;
        let session = self.issue(&account)?;
        Ok(SignedUp {
            identity: session.identity.clone(),
            session: Some(session),
        })
    }

    async fn sign_out(&self, session: &Session) -> Result<(), AuthError> {
        self.check_failure(IdentityOp::SignOut)?;
        lock(&self.refresh_tokens)?.remove(&session.refresh_token);
        self.context.clear_access_token();
        Ok(())
    }

    async fn refresh_session(&self, session: &Session) -> Result<Session, AuthError> {
        self.check_failure(IdentityOp::Refresh)?;
        let id = lock(&self.refresh_tokens)?
            .remove(&session.refresh_token)
            .ok_or(AuthError::SessionExpired)?;
        let account = lock(&self.accounts)?
            .values()
            .find(|a| a.id == id)
            .cloned()
            .ok_or(AuthError::SessionExpired)?;
        self.issue(&account)
    }

    fn adopt_session(&self, session: &Session) {
        self.context.set_access_token(session.access_token.clone());
    }

    fn clear_session(&self) {
        self.context.clear_access_token();
    }

    async fn admin_create_user(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        self.check_failure(IdentityOp::AdminCreate)?;
        let account = self.create(credentials)?;
        Ok(Identity {
            id: account.id,
            email: account.email,
        })
    }

    async fn admin_delete_user(&self, id: UserId) -> Result<(), AuthError> {
        self.check_failure(IdentityOp::AdminDelete)?;
        let mut accounts = lock(&self.accounts)?;
        let before = accounts.len();
        accounts.retain(|_, a| a.id != id);
        if accounts.len() == before {
            return Err(AuthError::provider(format!("user {id} not found")));
        }
        lock(&self.refresh_tokens)?.retain(|_, owner| *owner != id);
        Ok(())
    }

    async fn admin_find_user(&self, email: &str) -> Result<Option<Identity>, AuthError> {
        self.check_failure(IdentityOp::AdminFind)?;
        Ok(lock(&self.accounts)?.get(&normalize(email)).map(|a| Identity {
            id: a.id,
            email: a.email.clone(),
        }))
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.context.subscribe()
    }
}
