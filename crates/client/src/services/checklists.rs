use std::sync::Arc;

use auditdesk_auth::Action;
use auditdesk_core::{
    Checklist, ChecklistItem, ChecklistItemPatch, ChecklistProgress, ChecklistWithItems, ClientId,
    NewChecklist, NewChecklistItem, Table,
};
use auditdesk_infra::{DataStore, Repository};
use chrono::Utc;
use tracing::instrument;

use crate::confirm::DeletePrompt;
use crate::error::AppResult;
use crate::session::SessionManager;

#[derive(Clone)]
pub struct ChecklistService {
    checklists: Repository<Checklist>,
    items: Repository<ChecklistItem>,
    session: Arc<SessionManager>,
}

impl ChecklistService {
    pub fn new(store: Arc<dyn DataStore>, session: Arc<SessionManager>) -> Self {
        Self {
            checklists: Repository::new(store.clone()),
            items: Repository::new(store),
            session,
        }
    }

    /// Newest first, with items (by `order_index`) and client.
    pub async fn list(&self) -> AppResult<Vec<ChecklistWithItems>> {
        self.session.require(Action::Checklists)?;
        let query = self
            .checklists
            .query()
            .embed(Table::ChecklistItems)
            .embed(Table::Clients)
            .newest_first();
        let mut lists: Vec<ChecklistWithItems> = self.checklists.list_as(query).await?;
        for list in &mut lists {
            list.checklist_items.sort_by_key(|i| i.order_index);
        }
        Ok(lists)
    }

    pub fn progress(list: &ChecklistWithItems) -> ChecklistProgress {
        list.progress()
    }

    #[instrument(skip(self), err)]
    pub async fn create(&self, client_id: Option<ClientId>, title: &str) -> AppResult<Checklist> {
        let me = self.session.require(Action::Checklists)?;
        let new = NewChecklist::new(client_id, title, Some(me))?;
        Ok(self.checklists.insert(&new).await?)
    }

    /// Appended after the current last item.
    #[instrument(skip(self, list), fields(checklist = %list.checklist.id), err)]
    pub async fn add_item(&self, list: &ChecklistWithItems, description: &str) -> AppResult<ChecklistItem> {
        self.session.require(Action::Checklists)?;
        let new = NewChecklistItem::append(list.checklist.id, description, &list.checklist_items)?;
        Ok(self.items.insert(&new).await?)
    }

    /// Checking records who and when; unchecking clears both.
    pub async fn toggle_item(&self, item: &ChecklistItem) -> AppResult<ChecklistItem> {
        let me = self.session.require(Action::Checklists)?;
        let patch = ChecklistItemPatch::toggle(item, me, Utc::now());
        Ok(self.items.update(item.id, &patch).await?)
    }

    pub fn delete_item(&self, item: &ChecklistItem) -> AppResult<DeletePrompt> {
        self.session.require(Action::Checklists)?;
        let repo = self.items.clone();
        let id = item.id;
        Ok(DeletePrompt::new("Are you sure you want to delete this item?", async move {
            repo.delete(id).await?;
            Ok(())
        }))
    }
}
