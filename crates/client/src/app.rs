//! Application wiring: one session manager, one set of services, and the
//! background tasks that keep the session current.

use std::sync::Arc;
use std::time::Duration;

use auditdesk_auth::{AuthState, Session};
use auditdesk_infra::{
    Backend, DataStore, FileSessionStorage, FunctionsClient, IdentityProvider, SessionStorage, StoreConfig,
};
use tokio::task::JoinHandle;

use crate::error::AppResult;
use crate::services::Services;
use crate::session::SessionManager;

const REFRESH_EVERY: Duration = Duration::from_secs(60);

pub struct App {
    pub session: Arc<SessionManager>,
    pub services: Services,
    functions: Option<FunctionsClient>,
    background: Vec<JoinHandle<()>>,
}

impl App {
    /// Wire the hosted backend and the on-disk session file.
    pub fn connect(config: StoreConfig) -> AppResult<Self> {
        let storage = FileSessionStorage::at_or_default(config.session_file.clone())?;
        tracing::debug!(path = ?storage.path(), "session file");
        let backend = Backend::connect(config);
        Ok(Self::from_parts(
            backend.store,
            backend.identity,
            Arc::new(storage),
            Some(backend.functions),
        ))
    }

    pub fn from_parts(
        store: Arc<dyn DataStore>,
        identity: Arc<dyn IdentityProvider>,
        storage: Arc<dyn SessionStorage>,
        functions: Option<FunctionsClient>,
    ) -> Self {
        let session = Arc::new(SessionManager::new(identity, store.clone(), storage));
        let services = Services::new(store, session.clone());
        Self {
            session,
            services,
            functions,
            background: Vec::new(),
        }
    }

    /// Restore the persisted session and start listening for session
    /// changes and refreshing tokens.
    pub async fn start(&mut self) -> AuthState {
        let state = self.session.initialize().await;
        self.background.push(self.session.spawn_change_listener());
        self.background.push(
            self.session
                .spawn_refresh_loop(REFRESH_EVERY, chrono::Duration::minutes(5)),
        );
        state
    }

    /// Seed the demo account through the backend function, then sign in.
    pub async fn sign_in_demo(&self) -> AppResult<Session> {
        let functions = self
            .functions
            .as_ref()
            .ok_or(auditdesk_auth::AuthError::provider("functions endpoint not configured"))?;
        let user = functions.invoke_demo_seed().await?;
        self.session.sign_in(&user.email, &user.password).await
    }
}

impl Drop for App {
    fn drop(&mut self) {
        for task in &self.background {
            task.abort();
        }
    }
}
