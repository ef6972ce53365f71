use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::id::{ActivityLogId, UserId};
use crate::schema::Table;

/// Append-only record of a user action, shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: ActivityLogId,
    pub user_id: Option<UserId>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<uuid::Uuid>,
    #[serde(default)]
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Entity for ActivityLog {
    type Id = ActivityLogId;
    const TABLE: Table = Table::ActivityLog;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
