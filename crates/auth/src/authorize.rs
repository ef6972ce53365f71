use serde::Serialize;
use thiserror::Error;

use crate::{Action, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("no profile loaded")]
    NoProfile,

    #[error("forbidden: '{action}' requires the admin role (current role: {role})")]
    Forbidden { action: Action, role: Role },
}

/// Gate decision for a loaded role.
///
/// - No IO
/// - No panics
/// - Advisory: hides controls the role cannot use; the store still enforces
///   its own row-level policies.
pub fn visible_actions(role: Role, action: Action) -> bool {
    !action.is_admin_only() || role.is_admin()
}

/// Gate decision when the profile may be absent. An absent profile is treated
/// as non-admin.
pub fn visible_for(role: Option<Role>, action: Action) -> bool {
    visible_actions(role.unwrap_or(Role::Team), action)
}

/// Service-level check issued before a privileged store call.
pub fn authorize(role: Option<Role>, action: Action) -> Result<(), AuthzError> {
    match role {
        Some(role) if visible_actions(role, action) => Ok(()),
        Some(role) => Err(AuthzError::Forbidden { action, role }),
        None if !action.is_admin_only() => Ok(()),
        None => Err(AuthzError::NoProfile),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation
// ─────────────────────────────────────────────────────────────────────────────

/// Why a gate decision came out the way it did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationExplanation {
    pub action: Action,
    pub role: Option<Role>,
    pub granted: bool,
    pub reason: String,
}

pub fn explain(role: Option<Role>, action: Action) -> AuthorizationExplanation {
    let granted = visible_for(role, action);
    let reason = match (role, action.is_admin_only()) {
        (_, false) => format!("'{action}' is available to every signed-in role"),
        (Some(Role::Admin), true) => format!("'{action}' is granted by the admin role"),
        (Some(r), true) => format!("'{action}' is reserved to administrators; role is '{r}'"),
        (None, true) => format!("'{action}' is reserved to administrators; no profile is loaded"),
    };
    AuthorizationExplanation {
        action,
        role,
        granted,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn any_action() -> impl Strategy<Value = Action> {
        proptest::sample::select(Action::ALL.to_vec())
    }

    #[test]
    fn manage_users_is_admin_only() {
        assert!(visible_actions(Role::Admin, Action::ManageUsers));
        assert!(!visible_actions(Role::Team, Action::ManageUsers));
        assert!(!visible_for(None, Action::ManageUsers));
    }

    #[test]
    fn team_sees_work_surfaces() {
        for action in [
            Action::ViewDashboard,
            Action::ViewClients,
            Action::ViewFormTemplates,
            Action::Tasks,
            Action::Audits,
            Action::Checklists,
            Action::Documents,
            Action::OwnProfile,
        ] {
            assert!(visible_actions(Role::Team, action), "{action}");
        }
    }

    #[test]
    fn authorize_reports_missing_profile_separately() {
        assert_eq!(authorize(None, Action::ManageClients), Err(AuthzError::NoProfile));
        assert!(authorize(None, Action::Tasks).is_ok());
        assert_eq!(
            authorize(Some(Role::Team), Action::ManageFormTemplates),
            Err(AuthzError::Forbidden {
                action: Action::ManageFormTemplates,
                role: Role::Team
            })
        );
    }

    #[test]
    fn explanation_mentions_the_role() {
        let e = explain(Some(Role::Team), Action::ManageUsers);
        assert!(!e.granted);
        assert!(e.reason.contains("team"));
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 256, .. ProptestConfig::default() })]

        #[test]
        fn admin_sees_everything(action in any_action()) {
            prop_assert!(visible_actions(Role::Admin, action));
        }

        #[test]
        fn gate_and_authorize_agree(action in any_action(), admin in any::<bool>()) {
            let role = if admin { Role::Admin } else { Role::Team };
            prop_assert_eq!(visible_actions(role, action), authorize(Some(role), action).is_ok());
            prop_assert_eq!(explain(Some(role), action).granted, visible_actions(role, action));
        }

        #[test]
        fn absent_profile_is_never_more_privileged_than_team(action in any_action()) {
            prop_assert!(!visible_for(None, action) || visible_actions(Role::Team, action));
        }
    }
}
