use std::sync::Arc;

use auditdesk_auth::{Action, Profile};
use auditdesk_core::{Client, Table, Task, TaskForm, TaskStatus, TaskStatusPatch, TaskWithClient};
use auditdesk_infra::{DataStore, Direction, Repository};
use chrono::Utc;
use tracing::instrument;

use crate::error::AppResult;
use crate::session::SessionManager;

#[derive(Clone)]
pub struct TaskService {
    tasks: Repository<Task>,
    clients: Repository<Client>,
    profiles: Repository<Profile>,
    session: Arc<SessionManager>,
}

impl TaskService {
    pub fn new(store: Arc<dyn DataStore>, session: Arc<SessionManager>) -> Self {
        Self {
            tasks: Repository::new(store.clone()),
            clients: Repository::new(store.clone()),
            profiles: Repository::new(store),
            session,
        }
    }

    /// Newest first, each joined with its client (null when missing).
    pub async fn list(&self, status: Option<TaskStatus>) -> AppResult<Vec<TaskWithClient>> {
        self.session.require(Action::Tasks)?;
        let mut query = self.tasks.query().embed(Table::Clients).newest_first();
        if let Some(status) = status {
            query = query.eq("status", status.as_str());
        }
        Ok(self.tasks.list_as(query).await?)
    }

    /// Clients offered by the task form, by name.
    pub async fn client_options(&self) -> AppResult<Vec<Client>> {
        self.session.require(Action::Tasks)?;
        Ok(self.clients.list(self.clients.query().order_by("name", Direction::Asc)).await?)
    }

    /// Users offered for assignment, by name.
    pub async fn assignee_options(&self) -> AppResult<Vec<Profile>> {
        self.session.require(Action::Tasks)?;
        Ok(self.profiles.list(self.profiles.query().order_by("full_name", Direction::Asc)).await?)
    }

    #[instrument(skip(self, form), err)]
    pub async fn create(&self, form: TaskForm) -> AppResult<Task> {
        let me = self.session.require(Action::Tasks)?;
        let new = form.into_new(Some(me))?;
        let task = self.tasks.insert(&new).await?;
        tracing::info!(task = %task.id, "task created");
        Ok(task)
    }

    /// Validate against the transition table, then write status and
    /// `updated_at`. No concurrency token: the last write wins.
    #[instrument(skip(self, task), fields(task = %task.id, from = %task.status), err)]
    pub async fn change_status(&self, task: &Task, next: TaskStatus) -> AppResult<Task> {
        self.session.require(Action::Tasks)?;
        let status = task.status.transition(next)?;
        let patch = TaskStatusPatch {
            status,
            updated_at: Utc::now(),
        };
        Ok(self.tasks.update(task.id, &patch).await?)
    }
}
