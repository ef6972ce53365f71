use std::sync::Arc;

use auditdesk_auth::{Action, Profile, ProfileRolePatch, Role, SignUpRequest};
use auditdesk_core::{DomainError, UserId};
use auditdesk_infra::{DataStore, Repository};
use chrono::Utc;
use tracing::instrument;

use crate::confirm::DeletePrompt;
use crate::error::AppResult;
use crate::session::SessionManager;

/// User management (administrators only).
#[derive(Clone)]
pub struct UserService {
    profiles: Repository<Profile>,
    session: Arc<SessionManager>,
}

impl UserService {
    pub fn new(store: Arc<dyn DataStore>, session: Arc<SessionManager>) -> Self {
        Self {
            profiles: Repository::new(store),
            session,
        }
    }

    pub async fn list(&self) -> AppResult<Vec<Profile>> {
        self.session.require(Action::ManageUsers)?;
        Ok(self.profiles.list(self.profiles.query().newest_first()).await?)
    }

    /// Create an identity through the privileged API plus its profile. A
    /// failed profile insert removes the identity again.
    #[instrument(skip(self, request), fields(email = %request.email()), err)]
    pub async fn create(&self, request: SignUpRequest) -> AppResult<Profile> {
        self.session.require(Action::ManageUsers)?;
        let profile = self.session.provision_user(&request).await?;
        tracing::info!(user = %profile.id, role = %profile.role, "user created");
        Ok(profile)
    }

    #[instrument(skip(self), err)]
    pub async fn set_role(&self, id: UserId, role: Role) -> AppResult<Profile> {
        let me = self.session.require(Action::ManageUsers)?;
        if id == me && role != Role::Admin {
            return Err(DomainError::validation("you cannot remove your own admin role").into());
        }
        let patch = ProfileRolePatch {
            role,
            updated_at: Utc::now(),
        };
        Ok(self.profiles.update(id, &patch).await?)
    }

    /// Removes the profile row only; the identity stays with the provider.
    pub fn delete(&self, profile: &Profile) -> AppResult<DeletePrompt> {
        let me = self.session.require(Action::ManageUsers)?;
        if profile.id == me {
            return Err(DomainError::validation("you cannot delete your own account").into());
        }
        let repo = self.profiles.clone();
        let id = profile.id;
        Ok(DeletePrompt::new("Are you sure you want to delete this user?", async move {
            repo.delete(id).await?;
            tracing::info!(user = %id, "user profile deleted");
            Ok(())
        }))
    }
}
