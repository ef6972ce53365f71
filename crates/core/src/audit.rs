use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};
use crate::id::{AuditId, ClientId, FormTemplateId, TaskId, UserId};
use crate::schema::Table;
use crate::task::Task;
use crate::template::FormTemplate;

/// Audit lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Draft,
    InProgress,
    Completed,
}

impl AuditStatus {
    pub const ALL: [AuditStatus; 3] = [
        AuditStatus::Draft,
        AuditStatus::InProgress,
        AuditStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Draft => "draft",
            AuditStatus::InProgress => "in_progress",
            AuditStatus::Completed => "completed",
        }
    }

    /// An audit must pass through `in_progress`: draft cannot jump to
    /// completed, and a completed audit only reopens to in progress.
    pub fn can_transition_to(self, next: AuditStatus) -> bool {
        use AuditStatus::*;
        self == next
            || matches!(
                (self, next),
                (Draft, InProgress)
                    | (InProgress, Completed)
                    | (InProgress, Draft)
                    | (Completed, InProgress)
            )
    }

    pub fn transition(self, next: AuditStatus) -> DomainResult<AuditStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::transition(self, next))
        }
    }
}

impl core::fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for AuditStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AuditStatus::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown audit status '{s}'")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Audit {
    pub id: AuditId,
    pub client_id: Option<ClientId>,
    pub task_id: Option<TaskId>,
    pub form_template_id: Option<FormTemplateId>,
    pub status: AuditStatus,
    #[serde(default)]
    pub form_data: serde_json::Value,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Audit {
    type Id = AuditId;
    const TABLE: Table = Table::Audits;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// `select=*,clients(*),tasks(*),form_templates(*)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditWithDetails {
    #[serde(flatten)]
    pub audit: Audit,
    #[serde(default)]
    pub clients: Option<Client>,
    #[serde(default)]
    pub tasks: Option<Task>,
    #[serde(default)]
    pub form_templates: Option<FormTemplate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAudit {
    pub client_id: Option<ClientId>,
    pub task_id: Option<TaskId>,
    pub form_template_id: Option<FormTemplateId>,
    pub status: AuditStatus,
    pub form_data: serde_json::Value,
    pub created_by: Option<UserId>,
}

impl NewAudit {
    /// New audits start as `draft` with empty `form_data`.
    pub fn draft(
        client_id: Option<ClientId>,
        task_id: Option<TaskId>,
        form_template_id: Option<FormTemplateId>,
        created_by: Option<UserId>,
    ) -> Self {
        Self {
            client_id,
            task_id,
            form_template_id,
            status: AuditStatus::Draft,
            form_data: serde_json::Value::Object(Default::default()),
            created_by,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStatusPatch {
    pub status: AuditStatus,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_cannot_skip_to_completed() {
        assert!(AuditStatus::Draft.transition(AuditStatus::Completed).is_err());
        assert!(AuditStatus::Completed.transition(AuditStatus::Draft).is_err());
        assert!(AuditStatus::Draft.transition(AuditStatus::InProgress).is_ok());
        assert!(AuditStatus::Completed.transition(AuditStatus::InProgress).is_ok());
    }

    #[test]
    fn new_audit_is_a_draft_with_empty_form_data() {
        let a = NewAudit::draft(None, None, None, None);
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["status"], "draft");
        assert_eq!(json["form_data"], serde_json::json!({}));
    }

    #[test]
    fn audit_embeds_decode_independently() {
        let row = serde_json::json!({
            "id": "40000000-0000-0000-0000-000000000001",
            "client_id": null,
            "task_id": null,
            "form_template_id": null,
            "status": "in_progress",
            "form_data": {},
            "created_by": null,
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": null,
            "clients": null,
            "tasks": null,
            "form_templates": null
        });
        let a: AuditWithDetails = serde_json::from_value(row).unwrap();
        assert_eq!(a.audit.status, AuditStatus::InProgress);
        assert!(a.clients.is_none() && a.tasks.is_none() && a.form_templates.is_none());
    }
}
