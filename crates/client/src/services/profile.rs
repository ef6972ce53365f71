use std::sync::Arc;

use auditdesk_auth::{Action, Profile, ProfileNamePatch};
use auditdesk_core::{DomainError, blank_to_none};
use auditdesk_infra::{DataStore, Repository};
use chrono::Utc;

use crate::error::AppResult;
use crate::session::SessionManager;

/// The signed-in user's own profile.
#[derive(Clone)]
pub struct ProfileService {
    profiles: Repository<Profile>,
    session: Arc<SessionManager>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn DataStore>, session: Arc<SessionManager>) -> Self {
        Self {
            profiles: Repository::new(store),
            session,
        }
    }

    /// Rename yourself; the session republishes the updated profile.
    pub async fn update_name(&self, full_name: &str) -> AppResult<Profile> {
        let me = self.session.require(Action::OwnProfile)?;
        let full_name = blank_to_none(full_name.trim()).ok_or_else(|| DomainError::validation("full name is required"))?;
        let patch = ProfileNamePatch {
            full_name,
            updated_at: Utc::now(),
        };
        let profile = self.profiles.update(me, &patch).await?;
        self.session.reload_profile().await;
        Ok(profile)
    }
}
