//! Side menu and role badge, filtered by the authorization gate.

use auditdesk_auth::{Action, AuthState, Profile, Role, visible_for};
use serde::Serialize;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Dashboard,
    Clients,
    Users,
    Tasks,
    Audits,
    Checklists,
    Templates,
    Documents,
    Profile,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub page: Page,
    pub label: &'static str,
    pub action: Action,
}

const fn item(page: Page, label: &'static str, action: Action) -> MenuItem {
    MenuItem { page, label, action }
}

/// Full menu in display order.
pub const MENU: [MenuItem; 9] = [
    item(Page::Dashboard, "Dashboard", Action::ViewDashboard),
    item(Page::Clients, "Clients", Action::ViewClients),
    item(Page::Users, "User Management", Action::ManageUsers),
    item(Page::Tasks, "Tasks", Action::Tasks),
    item(Page::Audits, "Audits", Action::Audits),
    item(Page::Checklists, "Checklists", Action::Checklists),
    item(Page::Templates, "Form Templates", Action::ViewFormTemplates),
    item(Page::Documents, "Documents", Action::Documents),
    item(Page::Profile, "Profile", Action::OwnProfile),
];

pub fn menu_for_role(role: Option<Role>) -> Vec<MenuItem> {
    MENU.iter().copied().filter(|m| visible_for(role, m.action)).collect()
}

/// Menu for the current state; empty unless signed in.
pub fn menu(state: &AuthState) -> Vec<MenuItem> {
    if !state.is_authenticated() {
        return Vec::new();
    }
    menu_for_role(state.role())
}

/// Badge under the user's name. A missing profile reads as team member.
pub fn role_badge(profile: Option<&Profile>) -> &'static str {
    profile.map(|p| p.role).unwrap_or_default().label()
}
