use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};
use crate::id::{ClientId, TaskId, UserId};
use crate::schema::Table;
use crate::value_object::blank_to_none;

/// Task lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }

    /// Whether a task may move from `self` to `next`.
    ///
    /// Re-applying the current status is always allowed. A completed task can
    /// be reopened (back to in progress) but not reset to pending.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Pending, Pending)
                | (InProgress, InProgress)
                | (Completed, Completed)
                | (Pending, InProgress)
                | (Pending, Completed)
                | (InProgress, Completed)
                | (InProgress, Pending)
                | (Completed, InProgress)
        )
    }

    pub fn transition(self, next: TaskStatus) -> DomainResult<TaskStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::transition(self, next))
        }
    }
}

impl core::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for TaskStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown task status '{s}'")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub client_id: Option<ClientId>,
    pub status: TaskStatus,
    pub assigned_to: Option<Vec<UserId>>,
    pub created_by: Option<UserId>,
    #[serde(default, deserialize_with = "due_date::deserialize")]
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Task {
    type Id = TaskId;
    const TABLE: Table = Table::Tasks;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A task row with its client embedded (`select=*,clients(*)`).
///
/// The client is `None` when the task has no client or the client was deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskWithClient {
    #[serde(flatten)]
    pub task: Task,
    #[serde(default)]
    pub clients: Option<Client>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub client_id: Option<ClientId>,
    pub status: TaskStatus,
    pub assigned_to: Option<Vec<UserId>>,
    pub created_by: Option<UserId>,
    #[serde(default, deserialize_with = "due_date::deserialize")]
    pub due_date: Option<DateTime<Utc>>,
}

/// Status-only update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatusPatch {
    pub status: TaskStatus,
    pub updated_at: DateTime<Utc>,
}

/// `due_date` is a DATE column: rows carry `YYYY-MM-DD`, though full
/// timestamps are accepted too.
mod due_date {
    use chrono::{DateTime, NaiveDate, Utc};
    use serde::{Deserialize, Deserializer, de::Error};

    pub(super) fn start_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
        date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc())
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(Some(ts.with_timezone(&Utc)));
        }
        let date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(D::Error::custom)?;
        Ok(start_of_day(date))
    }
}

/// Raw task form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub client_id: Option<ClientId>,
    /// `YYYY-MM-DD`, or blank.
    pub due_date: String,
    pub assigned_to: Vec<UserId>,
}

impl TaskForm {
    /// New tasks start `pending`; an empty assignee list is stored as null.
    pub fn into_new(self, created_by: Option<UserId>) -> DomainResult<NewTask> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(DomainError::validation("task title is required"));
        }
        let due_date = match blank_to_none(self.due_date) {
            Some(raw) => {
                let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                    .map_err(|e| DomainError::validation(format!("due date '{raw}': {e}")))?;
                due_date::start_of_day(date)
            }
            None => None,
        };
        let assigned_to = if self.assigned_to.is_empty() {
            None
        } else {
            Some(self.assigned_to)
        };
        Ok(NewTask {
            title,
            description: blank_to_none(self.description),
            client_id: self.client_id,
            status: TaskStatus::Pending,
            assigned_to,
            created_by,
            due_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_uses_snake_case_on_the_wire() {
        let json = serde_json::to_value(TaskStatus::InProgress).unwrap();
        assert_eq!(json, "in_progress");
        assert_eq!("completed".parse::<TaskStatus>().unwrap(), TaskStatus::Completed);
        assert!("done".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn completed_task_cannot_be_reset_to_pending() {
        assert!(TaskStatus::Completed.transition(TaskStatus::Pending).is_err());
        assert_eq!(
            TaskStatus::Completed.transition(TaskStatus::InProgress).unwrap(),
            TaskStatus::InProgress
        );
        for s in TaskStatus::ALL {
            assert!(s.can_transition_to(s));
        }
    }

    #[test]
    fn pending_can_move_directly_to_either_later_status() {
        assert!(TaskStatus::Pending.can_transition_to(TaskStatus::InProgress));
        assert!(TaskStatus::Pending.can_transition_to(TaskStatus::Completed));
    }

    #[test]
    fn new_task_defaults() {
        let form = TaskForm {
            title: "Yıllık denetim".into(),
            due_date: "2026-03-31".into(),
            ..Default::default()
        };
        let new = form.into_new(None).unwrap();
        assert_eq!(new.status, TaskStatus::Pending);
        assert_eq!(new.assigned_to, None);
        assert_eq!(new.description, None);
        assert_eq!(
            new.due_date.unwrap().to_rfc3339(),
            "2026-03-31T00:00:00+00:00"
        );
    }

    #[test]
    fn bad_due_date_is_a_validation_error() {
        let form = TaskForm {
            title: "t".into(),
            due_date: "31/03/2026".into(),
            ..Default::default()
        };
        assert!(matches!(form.into_new(None), Err(DomainError::Validation(_))));
    }

    #[test]
    fn task_with_missing_client_decodes_with_none() {
        let row = serde_json::json!({
            "id": "30000000-0000-0000-0000-000000000001",
            "title": "Orphan",
            "description": null,
            "client_id": "10000000-0000-0000-0000-000000000009",
            "status": "pending",
            "assigned_to": null,
            "created_by": null,
            "due_date": null,
            "created_at": "2026-01-01T00:00:00+00:00",
            "updated_at": null,
            "clients": null
        });
        let joined: TaskWithClient = serde_json::from_value(row).unwrap();
        assert!(joined.clients.is_none());
        assert_eq!(joined.task.title, "Orphan");
    }

    fn row_due(due: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "id": "30000000-0000-0000-0000-000000000002",
            "title": "Year end",
            "description": null,
            "client_id": null,
            "status": "pending",
            "assigned_to": null,
            "created_by": null,
            "due_date": due,
            "created_at": "2026-01-01T00:00:00+00:00",
            "updated_at": null
        })
    }

    #[test]
    fn date_only_due_dates_decode_as_midnight_utc() {
        let task: Task = serde_json::from_value(row_due("2025-03-01".into())).unwrap();
        let expected = NaiveDate::from_ymd_opt(2025, 3, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc());
        assert_eq!(task.due_date, expected);

        let task: Task = serde_json::from_value(row_due("2025-03-01T09:30:00+02:00".into())).unwrap();
        assert_eq!(task.due_date.map(|d| d.to_rfc3339()).as_deref(), Some("2025-03-01T07:30:00+00:00"));

        let task: Task = serde_json::from_value(row_due(serde_json::Value::Null)).unwrap();
        assert!(task.due_date.is_none());

        assert!(serde_json::from_value::<Task>(row_due("01/03/2025".into())).is_err());
    }

    #[test]
    fn joined_row_with_date_only_due_date_decodes() {
        let mut row = row_due("2025-12-31".into());
        row["clients"] = serde_json::Value::Null;
        let joined: TaskWithClient = serde_json::from_value(row).unwrap();
        assert!(joined.task.due_date.is_some());
    }
}
