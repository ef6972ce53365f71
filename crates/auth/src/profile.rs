use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use auditdesk_core::{Entity, Table, UserId};

use crate::Role;

/// Application-level user record, keyed by the identity id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub email: String,
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Role,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// Name to greet the user with; falls back to the email address.
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.email)
    }
}

impl Entity for Profile {
    type Id = UserId;
    const TABLE: Table = Table::Profiles;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Profile row written right after the identity is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProfile {
    pub id: UserId,
    pub email: String,
    pub full_name: String,
    pub role: Role,
}

/// Owner edit: only the display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileNamePatch {
    pub full_name: String,
    pub updated_at: DateTime<Utc>,
}

/// Admin edit: role change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRolePatch {
    pub role: Role,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_role_decodes_as_team() {
        let row = serde_json::json!({
            "id": "00000000-0000-0000-0000-000000000001",
            "email": "a@b.co",
            "full_name": null,
            "created_at": null,
            "updated_at": null
        });
        let p: Profile = serde_json::from_value(row).unwrap();
        assert_eq!(p.role, Role::Team);
        assert_eq!(p.display_name(), "a@b.co");
    }
}
