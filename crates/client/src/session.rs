//! Session/auth manager.
//!
//! The manager is the only writer of the process-wide [`AuthState`]; every
//! other component reads it through [`SessionManager::subscribe`]. Mutating
//! operations are serialized by an async mutex so a sign-in cannot interleave
//! with a refresh or an externally announced expiry.

use std::sync::Arc;

use auditdesk_auth::{
    Action, AuthError, AuthPhase, AuthState, Credentials, NewProfile, Profile, RegistrationForm, Role, Session,
    SessionChange, SessionValidationError, SignUpRequest, authorize, explain, validate_session,
};
use auditdesk_core::UserId;
use auditdesk_infra::{DataStore, IdentityProvider, Repository, SessionStorage};
use chrono::Utc;
use serde_json::json;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::error::AppResult;
use crate::outbox::ProfileOutbox;
use crate::provision::{deliver, insert_profile_or_compensate};

pub struct SessionManager {
    identity: Arc<dyn IdentityProvider>,
    profiles: Repository<Profile>,
    storage: Arc<dyn SessionStorage>,
    outbox: Arc<ProfileOutbox>,
    state: watch::Sender<AuthState>,
    op: Mutex<()>,
}

impl SessionManager {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn DataStore>,
        storage: Arc<dyn SessionStorage>,
    ) -> Self {
        let (state, _) = watch::channel(AuthState::Uninitialized);
        Self {
            identity,
            profiles: Repository::new(store),
            storage,
            outbox: Arc::new(ProfileOutbox::new()),
            state,
            op: Mutex::new(()),
        }
    }

    pub fn identity(&self) -> &Arc<dyn IdentityProvider> {
        &self.identity
    }

    pub fn outbox(&self) -> &Arc<ProfileOutbox> {
        &self.outbox
    }

    /// Typed subscription to the current user.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn profile(&self) -> Option<Profile> {
        self.state.borrow().profile().cloned()
    }

    pub fn role(&self) -> Option<Role> {
        self.state.borrow().role()
    }

    pub fn can(&self, action: Action) -> bool {
        self.state.borrow().can(action)
    }

    /// Check `action` against the loaded profile and return the acting user.
    pub fn require(&self, action: Action) -> AppResult<UserId> {
        let state = self.state.borrow();
        let session = state.session().ok_or(AuthError::NotSignedIn)?;
        if let Err(e) = authorize(state.role(), action) {
            tracing::debug!(reason = %explain(state.role(), action).reason, "action refused");
            return Err(e.into());
        }
        Ok(session.user_id())
    }

    /// Apply a checked transition. Illegal ones are refused and logged.
    fn transition(&self, next: AuthState) -> bool {
        self.state.send_if_modified(|current| {
            if current.can_transition_to(&next) {
                tracing::debug!(from = ?current.phase(), to = ?next.phase(), "auth state");
                *current = next;
                true
            } else {
                tracing::warn!(from = ?current.phase(), to = ?next.phase(), "refused auth state transition");
                false
            }
        })
    }

    /// Look the profile up by identity id. Failures degrade to `None`.
    async fn load_profile(&self, id: UserId) -> Option<Profile> {
        match self.profiles.get(id).await {
            Ok(Some(profile)) => Some(profile),
            Ok(None) => {
                tracing::warn!(identity = %id, "no profile row for signed-in identity");
                None
            }
            Err(e) => {
                tracing::warn!(identity = %id, error = %e, "profile lookup failed");
                None
            }
        }
    }

    async fn authenticated(&self, session: Session) -> AuthState {
        let profile = self.load_profile(session.user_id()).await;
        AuthState::Authenticated { session, profile }
    }

    async fn persist(&self, session: &Session) {
        if let Err(e) = self.storage.save(session).await {
            tracing::warn!(error = %e, "could not persist session");
        }
    }

    /// End the local session: drop the persisted copy and the bearer token.
    async fn teardown(&self) {
        if let Err(e) = self.storage.clear().await {
            tracing::warn!(error = %e, "could not clear persisted session");
        }
        self.identity.clear_session();
    }

    /// Move to `Loading` from wherever a new authentication may start.
    fn begin(&self) {
        if self.state.borrow().phase() != AuthPhase::Loading {
            self.transition(AuthState::Loading);
        }
    }

    /// Restore any persisted session. Until this resolves the root view is
    /// `Loading`.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> AuthState {
        let _guard = self.op.lock().await;
        if self.state.borrow().phase() != AuthPhase::Uninitialized {
            return self.current();
        }
        self.transition(AuthState::Loading);

        let stored = match self.storage.load().await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "persisted session unreadable; starting signed out");
                None
            }
        };

        let next = match stored {
            Some(session) => match validate_session(&session, Utc::now()) {
                Ok(()) => {
                    self.identity.adopt_session(&session);
                    self.retry_pending_for(session.user_id()).await;
                    self.authenticated(session).await
                }
                Err(SessionValidationError::Expired) => match self.identity.refresh_session(&session).await {
                    Ok(fresh) => {
                        self.persist(&fresh).await;
                        self.retry_pending_for(fresh.user_id()).await;
                        self.authenticated(fresh).await
                    }
                    Err(e) => {
                        tracing::info!(error = %e, "persisted session could not be renewed");
                        self.teardown().await;
                        AuthState::Anonymous
                    }
                },
                Err(e) => {
                    tracing::warn!(error = %e, "discarding persisted session");
                    self.teardown().await;
                    AuthState::Anonymous
                }
            },
            None => AuthState::Anonymous,
        };
        self.transition(next);
        self.current()
    }

    /// Password sign-in. Failure leaves the state `Anonymous` with any
    /// previous session torn down.
    #[instrument(skip(self, password), err)]
    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session> {
        let _guard = self.op.lock().await;
        self.begin();
        let credentials = Credentials::new(email, password);
        match self.identity.sign_in_with_password(&credentials).await {
            Ok(session) => {
                self.persist(&session).await;
                self.retry_pending_for(session.user_id()).await;
                let next = self.authenticated(session.clone()).await;
                self.transition(next);
                tracing::info!(identity = %session.user_id(), "signed in");
                Ok(session)
            }
            Err(e) => {
                self.teardown().await;
                self.transition(AuthState::Anonymous);
                Err(e.into())
            }
        }
    }

    /// Create an identity and its profile, then sign in as it.
    #[instrument(skip(self, request), fields(email = %request.email()), err)]
    pub async fn sign_up(&self, request: SignUpRequest) -> AppResult<Session> {
        let _guard = self.op.lock().await;
        self.begin();
        match self.register(&request).await {
            Ok(session) => {
                self.persist(&session).await;
                let next = self.authenticated(session.clone()).await;
                self.transition(next);
                tracing::info!(identity = %session.user_id(), role = %request.role, "signed up");
                Ok(session)
            }
            Err(e) => {
                self.teardown().await;
                self.transition(AuthState::Anonymous);
                Err(e)
            }
        }
    }

    /// Self-registration from the raw form; always requests the team role.
    pub async fn sign_up_form(&self, form: RegistrationForm) -> AppResult<Session> {
        let request = form.validate()?;
        self.sign_up(request).await
    }

    async fn register(&self, request: &SignUpRequest) -> AppResult<Session> {
        let metadata = json!({ "full_name": request.full_name, "role": request.role });
        let signed_up = self.identity.sign_up(&request.credentials, metadata).await?;
        let draft = NewProfile {
            id: signed_up.identity.id,
            email: request.email().to_string(),
            full_name: request.full_name.clone(),
            role: request.role,
        };
        insert_profile_or_compensate(self.identity.as_ref(), &self.profiles, &self.outbox, draft).await?;
        match signed_up.session {
            Some(session) => Ok(session),
            None => Ok(self.identity.sign_in_with_password(&request.credentials).await?),
        }
    }

    /// Best-effort sign-out: provider failures are logged, local state is
    /// cleared regardless.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) {
        let _guard = self.op.lock().await;
        let session = self.state.borrow().session().cloned();
        if let Some(session) = session {
            if let Err(e) = self.identity.sign_out(&session).await {
                tracing::error!(error = %e, "sign-out failed at the provider; clearing local session");
            }
            self.teardown().await;
            self.transition(AuthState::Anonymous);
            tracing::info!(identity = %session.user_id(), "signed out");
        }
    }

    /// Refresh the session once it is within `margin` of expiry. Returns
    /// whether a refresh happened.
    pub async fn refresh_if_needed(&self, margin: chrono::Duration) -> AppResult<bool> {
        let _guard = self.op.lock().await;
        let Some(session) = self.state.borrow().session().cloned() else {
            return Ok(false);
        };
        let now = Utc::now();
        if !session.needs_refresh(now, margin) {
            return Ok(false);
        }
        if session.is_expired(now) {
            tracing::info!(identity = %session.user_id(), "session expired");
            self.teardown().await;
            self.transition(AuthState::Anonymous);
            return Err(AuthError::SessionExpired.into());
        }
        match self.identity.refresh_session(&session).await {
            Ok(fresh) => {
                self.persist(&fresh).await;
                let next = self.authenticated(fresh).await;
                self.transition(next);
                tracing::debug!("session refreshed");
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(error = %e, "session refresh failed; signing out locally");
                self.teardown().await;
                self.transition(AuthState::Anonymous);
                Err(e.into())
            }
        }
    }

    /// Periodic refresh on a task owned by the caller.
    pub fn spawn_refresh_loop(self: &Arc<Self>, every: std::time::Duration, margin: chrono::Duration) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                if let Err(e) = manager.refresh_if_needed(margin).await {
                    tracing::debug!(error = %e, "refresh tick");
                }
            }
        })
    }

    /// Re-derive state after a session change announced by the provider.
    #[instrument(skip(self, change))]
    pub async fn apply(&self, change: SessionChange) {
        let _guard = self.op.lock().await;
        match change {
            SessionChange::SignedIn(session) => {
                self.persist(&session).await;
                self.begin_unless_authenticated();
                let next = self.authenticated(session).await;
                self.transition(next);
            }
            SessionChange::TokenRefreshed(session) => {
                let current = self.state.borrow().session().map(|s| s.user_id());
                if current != Some(session.user_id()) {
                    tracing::debug!("ignoring refresh for another identity");
                    return;
                }
                self.persist(&session).await;
                let next = self.authenticated(session).await;
                self.transition(next);
            }
            SessionChange::SignedOut | SessionChange::Expired => {
                if self.state.borrow().is_authenticated() {
                    self.teardown().await;
                    self.transition(AuthState::Anonymous);
                    tracing::info!("session ended outside the application");
                }
            }
        }
    }

    fn begin_unless_authenticated(&self) {
        if !self.state.borrow().is_authenticated() {
            self.begin();
        }
    }

    /// Forward provider-announced session changes into [`Self::apply`].
    pub fn spawn_change_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        let mut changes = self.identity.subscribe();
        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) => manager.apply(change).await,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "session change listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Reload the signed-in user's profile (after editing it).
    pub async fn reload_profile(&self) {
        let _guard = self.op.lock().await;
        let Some(session) = self.state.borrow().session().cloned() else {
            return;
        };
        let next = self.authenticated(session).await;
        self.transition(next);
    }

    /// Retry every queued profile draft. Returns how many were delivered.
    pub async fn retry_pending_profiles(&self) -> usize {
        let mut delivered = 0;
        for entry in self.outbox.pending() {
            if deliver(&self.profiles, &self.outbox, entry.draft).await {
                delivered += 1;
            }
        }
        delivered
    }

    async fn retry_pending_for(&self, id: UserId) {
        if let Some(entry) = self.outbox.for_identity(id) {
            deliver(&self.profiles, &self.outbox, entry.draft).await;
        }
    }

    /// Create another user's identity and profile (user management).
    pub(crate) async fn provision_user(&self, request: &SignUpRequest) -> AppResult<Profile> {
        let identity = self.identity.admin_create_user(&request.credentials).await?;
        let draft = NewProfile {
            id: identity.id,
            email: request.email().to_string(),
            full_name: request.full_name.clone(),
            role: request.role,
        };
        insert_profile_or_compensate(self.identity.as_ref(), &self.profiles, &self.outbox, draft).await
    }
}
