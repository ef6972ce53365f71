use serde::{Deserialize, Serialize};

/// A user-facing capability checked by the authorization gate.
///
/// Each menu item and each privileged button maps to one action.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ViewDashboard,
    ManageUsers,
    ViewClients,
    ManageClients,
    ViewFormTemplates,
    ManageFormTemplates,
    Tasks,
    Audits,
    Checklists,
    Documents,
    OwnProfile,
}

impl Action {
    pub const ALL: [Action; 11] = [
        Action::ViewDashboard,
        Action::ManageUsers,
        Action::ViewClients,
        Action::ManageClients,
        Action::ViewFormTemplates,
        Action::ManageFormTemplates,
        Action::Tasks,
        Action::Audits,
        Action::Checklists,
        Action::Documents,
        Action::OwnProfile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::ViewDashboard => "view_dashboard",
            Action::ManageUsers => "manage_users",
            Action::ViewClients => "view_clients",
            Action::ManageClients => "manage_clients",
            Action::ViewFormTemplates => "view_form_templates",
            Action::ManageFormTemplates => "manage_form_templates",
            Action::Tasks => "tasks",
            Action::Audits => "audits",
            Action::Checklists => "checklists",
            Action::Documents => "documents",
            Action::OwnProfile => "own_profile",
        }
    }

    pub fn is_admin_only(&self) -> bool {
        ADMIN_ONLY.contains(self)
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Actions reserved to administrators. Everything else is open to every
/// authenticated role.
pub const ADMIN_ONLY: &[Action] = &[
    Action::ManageUsers,
    Action::ManageClients,
    Action::ManageFormTemplates,
];
