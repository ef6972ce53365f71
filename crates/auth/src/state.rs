//! Authentication state machine.
//!
//! ```text
//! Uninitialized -> Loading -> { Authenticated(session, profile?) | Anonymous }
//! Authenticated -> Anonymous      (sign-out, expiry)
//! Authenticated -> Authenticated  (refresh, profile re-derivation)
//! Authenticated -> Loading        (re-authentication)
//! Anonymous     -> Loading        (sign-in, sign-up)
//! ```

use serde::Serialize;

use crate::{Action, Profile, Role, Session};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Uninitialized,
    Loading,
    Authenticated {
        session: Session,
        /// `None` when the profile row is missing or could not be read.
        profile: Option<Profile>,
    },
    Anonymous,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthPhase {
    Uninitialized,
    Loading,
    Authenticated,
    Anonymous,
}

/// What the application root renders for a given state.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RootView {
    /// Neither the sign-in surface nor the app.
    Loading,
    Login,
    App,
}

impl AuthPhase {
    pub fn can_transition_to(self, next: AuthPhase) -> bool {
        use AuthPhase::*;
        matches!(
            (self, next),
            (Uninitialized, Loading)
                | (Loading, Authenticated)
                | (Loading, Anonymous)
                | (Authenticated, Anonymous)
                | (Authenticated, Authenticated)
                | (Authenticated, Loading)
                | (Anonymous, Loading)
        )
    }
}

impl AuthState {
    pub fn phase(&self) -> AuthPhase {
        match self {
            AuthState::Uninitialized => AuthPhase::Uninitialized,
            AuthState::Loading => AuthPhase::Loading,
            AuthState::Authenticated { .. } => AuthPhase::Authenticated,
            AuthState::Anonymous => AuthPhase::Anonymous,
        }
    }

    pub fn can_transition_to(&self, next: &AuthState) -> bool {
        self.phase().can_transition_to(next.phase())
    }

    pub fn root_view(&self) -> RootView {
        match self {
            AuthState::Uninitialized | AuthState::Loading => RootView::Loading,
            AuthState::Anonymous => RootView::Login,
            AuthState::Authenticated { .. } => RootView::App,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthState::Authenticated { session, .. } => Some(session),
            _ => None,
        }
    }

    pub fn profile(&self) -> Option<&Profile> {
        match self {
            AuthState::Authenticated { profile, .. } => profile.as_ref(),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.profile().map(|p| p.role)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated { .. })
    }

    /// Gate check against the currently loaded profile.
    pub fn can(&self, action: Action) -> bool {
        self.is_authenticated() && crate::visible_for(self.role(), action)
    }
}

/// A session transition that happened outside the manager's own calls:
/// token refreshed by the provider, sign-in in another context, expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    SignedIn(Session),
    TokenRefreshed(Session),
    SignedOut,
    Expired,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Identity;
    use auditdesk_core::UserId;
    use chrono::Utc;

    fn authenticated(role: Option<Role>) -> AuthState {
        let id = UserId::new();
        AuthState::Authenticated {
            session: Session {
                access_token: "t".into(),
                refresh_token: "r".into(),
                expires_at: Utc::now(),
                identity: Identity {
                    id,
                    email: "a@b.co".into(),
                },
            },
            profile: role.map(|role| Profile {
                id,
                email: "a@b.co".into(),
                full_name: Some("A".into()),
                role,
                created_at: None,
                updated_at: None,
            }),
        }
    }

    #[test]
    fn loading_renders_neither_login_nor_app() {
        assert_eq!(AuthState::Uninitialized.root_view(), RootView::Loading);
        assert_eq!(AuthState::Loading.root_view(), RootView::Loading);
        assert_eq!(AuthState::Anonymous.root_view(), RootView::Login);
        assert_eq!(authenticated(None).root_view(), RootView::App);
    }

    #[test]
    fn illegal_transitions_are_refused() {
        use AuthPhase::*;
        assert!(!Uninitialized.can_transition_to(Authenticated));
        assert!(!Anonymous.can_transition_to(Authenticated));
        assert!(!Anonymous.can_transition_to(Anonymous));
        assert!(Anonymous.can_transition_to(Loading));
        assert!(Authenticated.can_transition_to(Authenticated));
    }

    #[test]
    fn degraded_state_is_treated_as_non_admin() {
        let s = authenticated(None);
        assert!(s.is_authenticated());
        assert!(!s.can(Action::ManageUsers));
        assert!(s.can(Action::Tasks));
        assert!(authenticated(Some(Role::Admin)).can(Action::ManageUsers));
        assert!(!AuthState::Anonymous.can(Action::Tasks));
    }
}
