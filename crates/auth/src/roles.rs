use core::str::FromStr;

use serde::{Deserialize, Serialize};

use auditdesk_core::DomainError;

/// Application role stored on a profile.
///
/// The set is closed: the profile row only ever carries `admin` or `team`, and
/// anything else is rejected at decode time.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Team,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Admin, Role::Team];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Team => "team",
        }
    }

    /// Badge label shown next to the signed-in user.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Team => "Team Member",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "team" => Ok(Role::Team),
            other => Err(DomainError::validation(format!("unknown role '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_role_is_team() {
        assert_eq!(Role::default(), Role::Team);
    }

    #[test]
    fn unknown_role_is_rejected_on_decode() {
        assert!(serde_json::from_str::<Role>("\"owner\"").is_err());
        assert_eq!(serde_json::from_str::<Role>("\"admin\"").unwrap(), Role::Admin);
        assert!("Admin".parse::<Role>().is_err());
    }
}
