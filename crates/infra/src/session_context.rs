use std::sync::{Arc, RwLock};

use auditdesk_auth::SessionChange;
use tokio::sync::broadcast;

/// State shared by the REST backends of one client: the bearer token for
/// data calls and the channel on which session changes are announced.
///
/// The identity provider writes the token; the data store reads it and
/// reports an expired token back through [`SessionContext::notify`].
#[derive(Debug, Clone)]
pub struct SessionContext {
    access_token: Arc<RwLock<Option<String>>>,
    changes: broadcast::Sender<SessionChange>,
}

impl SessionContext {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            access_token: Arc::new(RwLock::new(None)),
            changes,
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.access_token.read().ok().and_then(|t| t.clone())
    }

    pub fn set_access_token(&self, token: impl Into<String>) {
        if let Ok(mut slot) = self.access_token.write() {
            *slot = Some(token.into());
        }
    }

    pub fn clear_access_token(&self) {
        if let Ok(mut slot) = self.access_token.write() {
            *slot = None;
        }
    }

    /// Announce a change. Having no subscriber is not an error.
    pub fn notify(&self, change: SessionChange) {
        let _ = self.changes.send(change);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.changes.subscribe()
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_share_token_and_channel() {
        let ctx = SessionContext::new();
        let other = ctx.clone();
        let mut rx = ctx.subscribe();

        other.set_access_token("abc");
        assert_eq!(ctx.access_token().as_deref(), Some("abc"));

        other.notify(SessionChange::Expired);
        assert_eq!(rx.recv().await.unwrap(), SessionChange::Expired);

        ctx.clear_access_token();
        assert!(other.access_token().is_none());
    }
}
