use std::sync::Arc;

use auditdesk_auth::Action;
use auditdesk_core::{
    Audit, AuditStatus, AuditStatusPatch, AuditWithDetails, Client, ClientId, FormTemplate, FormTemplateId,
    NewAudit, Table, Task, TaskId,
};
use auditdesk_infra::{DataStore, Direction, Repository};
use chrono::Utc;
use tracing::instrument;

use crate::error::AppResult;
use crate::session::SessionManager;

/// Choices offered by the new-audit form.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditFormOptions {
    pub clients: Vec<Client>,
    pub tasks: Vec<Task>,
    pub templates: Vec<FormTemplate>,
}

#[derive(Clone)]
pub struct AuditService {
    audits: Repository<Audit>,
    clients: Repository<Client>,
    tasks: Repository<Task>,
    templates: Repository<FormTemplate>,
    session: Arc<SessionManager>,
}

impl AuditService {
    pub fn new(store: Arc<dyn DataStore>, session: Arc<SessionManager>) -> Self {
        Self {
            audits: Repository::new(store.clone()),
            clients: Repository::new(store.clone()),
            tasks: Repository::new(store.clone()),
            templates: Repository::new(store),
            session,
        }
    }

    /// Newest first, joined with client, task and form template.
    pub async fn list(&self, status: Option<AuditStatus>) -> AppResult<Vec<AuditWithDetails>> {
        self.session.require(Action::Audits)?;
        let mut query = self
            .audits
            .query()
            .embed(Table::Clients)
            .embed(Table::Tasks)
            .embed(Table::FormTemplates)
            .newest_first();
        if let Some(status) = status {
            query = query.eq("status", status.as_str());
        }
        Ok(self.audits.list_as(query).await?)
    }

    pub async fn form_options(&self) -> AppResult<AuditFormOptions> {
        self.session.require(Action::Audits)?;
        let (clients, tasks, templates) = tokio::try_join!(
            self.clients.list(self.clients.query().order_by("name", Direction::Asc)),
            self.tasks.list(self.tasks.query()),
            self.templates.list(self.templates.query()),
        )?;
        Ok(AuditFormOptions {
            clients,
            tasks,
            templates,
        })
    }

    /// New audits start as drafts with empty form data.
    #[instrument(skip(self), err)]
    pub async fn create(
        &self,
        client_id: Option<ClientId>,
        task_id: Option<TaskId>,
        form_template_id: Option<FormTemplateId>,
    ) -> AppResult<Audit> {
        let me = self.session.require(Action::Audits)?;
        let new = NewAudit::draft(client_id, task_id, form_template_id, Some(me));
        let audit = self.audits.insert(&new).await?;
        tracing::info!(audit = %audit.id, "audit created");
        Ok(audit)
    }

    #[instrument(skip(self, audit), fields(audit = %audit.id, from = %audit.status), err)]
    pub async fn change_status(&self, audit: &Audit, next: AuditStatus) -> AppResult<Audit> {
        self.session.require(Action::Audits)?;
        let status = audit.status.transition(next)?;
        let patch = AuditStatusPatch {
            status,
            updated_at: Utc::now(),
        };
        Ok(self.audits.update(audit.id, &patch).await?)
    }
}
