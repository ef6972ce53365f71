use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};
use crate::id::{ChecklistId, ChecklistItemId, ClientId, UserId};
use crate::schema::Table;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checklist {
    pub id: ChecklistId,
    pub client_id: Option<ClientId>,
    pub title: String,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Checklist {
    type Id = ChecklistId;
    const TABLE: Table = Table::Checklists;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: ChecklistItemId,
    pub checklist_id: ChecklistId,
    pub description: String,
    #[serde(default)]
    pub is_checked: bool,
    pub checked_by: Option<UserId>,
    pub checked_at: Option<DateTime<Utc>>,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
}

impl Entity for ChecklistItem {
    type Id = ChecklistItemId;
    const TABLE: Table = Table::ChecklistItems;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// `select=*,checklist_items(*),clients(*)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistWithItems {
    #[serde(flatten)]
    pub checklist: Checklist,
    #[serde(default)]
    pub checklist_items: Vec<ChecklistItem>,
    #[serde(default)]
    pub clients: Option<Client>,
}

impl ChecklistWithItems {
    /// Items in display order (`order_index` ascending).
    pub fn sorted_items(&self) -> Vec<&ChecklistItem> {
        let mut items: Vec<&ChecklistItem> = self.checklist_items.iter().collect();
        items.sort_by_key(|i| i.order_index);
        items
    }

    pub fn progress(&self) -> ChecklistProgress {
        ChecklistProgress::of(&self.checklist_items)
    }

    /// `order_index` for an item appended to this checklist.
    pub fn next_order_index(&self) -> i32 {
        next_order_index(&self.checklist_items)
    }
}

/// Completion of a checklist, derived from its current items. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecklistProgress {
    pub checked: usize,
    pub total: usize,
}

impl ChecklistProgress {
    pub fn of(items: &[ChecklistItem]) -> Self {
        Self {
            checked: items.iter().filter(|i| i.is_checked).count(),
            total: items.len(),
        }
    }

    /// Whole-number percentage, rounded half up; 0 for an empty checklist.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let checked = self.checked.min(self.total) as u128;
        let total = self.total as u128;
        ((checked * 200 + total) / (2 * total)) as u8
    }
}

/// `max(order_index) + 1`, starting at 1.
pub fn next_order_index(items: &[ChecklistItem]) -> i32 {
    items.iter().map(|i| i.order_index).max().unwrap_or(0).max(0) + 1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChecklist {
    pub client_id: Option<ClientId>,
    pub title: String,
    pub created_by: Option<UserId>,
}

impl NewChecklist {
    pub fn new(
        client_id: Option<ClientId>,
        title: impl Into<String>,
        created_by: Option<UserId>,
    ) -> DomainResult<Self> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(DomainError::validation("checklist title is required"));
        }
        Ok(Self {
            client_id,
            title,
            created_by,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChecklistItem {
    pub checklist_id: ChecklistId,
    pub description: String,
    pub is_checked: bool,
    pub order_index: i32,
}

impl NewChecklistItem {
    pub fn append(
        checklist_id: ChecklistId,
        description: impl Into<String>,
        existing: &[ChecklistItem],
    ) -> DomainResult<Self> {
        let description = description.into().trim().to_string();
        if description.is_empty() {
            return Err(DomainError::validation("item description is required"));
        }
        Ok(Self {
            checklist_id,
            description,
            is_checked: false,
            order_index: next_order_index(existing),
        })
    }
}

/// Check-state update. Unchecking clears who/when; both are written as null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItemPatch {
    pub is_checked: bool,
    pub checked_by: Option<UserId>,
    pub checked_at: Option<DateTime<Utc>>,
}

impl ChecklistItemPatch {
    pub fn toggle(item: &ChecklistItem, by: UserId, now: DateTime<Utc>) -> Self {
        if item.is_checked {
            Self {
                is_checked: false,
                checked_by: None,
                checked_at: None,
            }
        } else {
            Self {
                is_checked: true,
                checked_by: Some(by),
                checked_at: Some(now),
            }
        }
    }
}
