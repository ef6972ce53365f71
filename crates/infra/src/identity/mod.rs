//! Identity provider boundary: password sign-in, sign-up, token refresh and
//! the privileged user administration used for rollback and seeding.

pub mod memory;
pub mod rest;

use std::sync::Arc;

use auditdesk_auth::{AuthError, Credentials, Identity, Session, SessionChange};
use auditdesk_core::UserId;
use tokio::sync::broadcast;

pub use memory::{IdentityOp, InMemoryIdentityProvider};
pub use rest::RestIdentityProvider;

/// Result of creating an account. `session` is absent when the provider
/// requires email confirmation before the first sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUp {
    pub identity: Identity,
    pub session: Option<Session>,
}

#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session, AuthError>;

    /// Create an identity. `metadata` is stored on the identity record.
    async fn sign_up(
        &self,
        credentials: &Credentials,
        metadata: serde_json::Value,
    ) -> Result<SignedUp, AuthError>;

    async fn sign_out(&self, session: &Session) -> Result<(), AuthError>;

    async fn refresh_session(&self, session: &Session) -> Result<Session, AuthError>;

    /// Use a session restored from storage for subsequent data calls.
    fn adopt_session(&self, session: &Session);

    /// Stop sending any session token on data calls.
    fn clear_session(&self);

    /// Privileged: create a confirmed identity without signing in.
    async fn admin_create_user(&self, credentials: &Credentials) -> Result<Identity, AuthError>;

    /// Privileged: delete an identity.
    async fn admin_delete_user(&self, id: UserId) -> Result<(), AuthError>;

    /// Privileged: look an identity up by email.
    async fn admin_find_user(&self, email: &str) -> Result<Option<Identity>, AuthError>;

    /// Session changes that happen outside explicit calls (expiry detected by
    /// the store, refresh elsewhere).
    fn subscribe(&self) -> broadcast::Receiver<SessionChange>;
}

#[async_trait::async_trait]
impl<P> IdentityProvider for Arc<P>
where
    P: IdentityProvider + ?Sized,
{
    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        (**self).sign_in_with_password(credentials).await
    }

    async fn sign_up(
        &self,
        credentials: &Credentials,
        metadata: serde_json::Value,
    ) -> Result<SignedUp, AuthError> {
        (**self).sign_up(credentials, metadata).await
    }

    async fn sign_out(&self, session: &Session) -> Result<(), AuthError> {
        (**self).sign_out(session).await
    }

    async fn refresh_session(&self, session: &Session) -> Result<Session, AuthError> {
        (**self).refresh_session(session).await
    }

    fn adopt_session(&self, session: &Session) {
        (**self).adopt_session(session)
    }

    fn clear_session(&self) {
        (**self).clear_session()
    }

    async fn admin_create_user(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        (**self).admin_create_user(credentials).await
    }

    async fn admin_delete_user(&self, id: UserId) -> Result<(), AuthError> {
        (**self).admin_delete_user(id).await
    }

    async fn admin_find_user(&self, email: &str) -> Result<Option<Identity>, AuthError> {
        (**self).admin_find_user(email).await
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        (**self).subscribe()
    }
}
