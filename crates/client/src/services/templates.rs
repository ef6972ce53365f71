use std::sync::Arc;

use auditdesk_auth::Action;
use auditdesk_core::{FormTemplate, FormTemplateId, NewFormTemplate, TemplatePatch};
use auditdesk_infra::{DataStore, Repository};
use chrono::Utc;
use tracing::instrument;

use crate::confirm::DeletePrompt;
use crate::error::AppResult;
use crate::session::SessionManager;

#[derive(Clone)]
pub struct TemplateService {
    templates: Repository<FormTemplate>,
    session: Arc<SessionManager>,
}

impl TemplateService {
    pub fn new(store: Arc<dyn DataStore>, session: Arc<SessionManager>) -> Self {
        Self {
            templates: Repository::new(store),
            session,
        }
    }

    pub async fn list(&self) -> AppResult<Vec<FormTemplate>> {
        self.session.require(Action::ViewFormTemplates)?;
        Ok(self.templates.list(self.templates.query().newest_first()).await?)
    }

    /// New templates start with empty content.
    #[instrument(skip(self), err)]
    pub async fn create(&self, name: &str, template_type: &str) -> AppResult<FormTemplate> {
        let me = self.session.require(Action::ManageFormTemplates)?;
        let new = NewFormTemplate::new(name, template_type, Some(me))?;
        Ok(self.templates.insert(&new).await?)
    }

    #[instrument(skip(self), err)]
    pub async fn update(&self, id: FormTemplateId, name: &str, template_type: &str) -> AppResult<FormTemplate> {
        self.session.require(Action::ManageFormTemplates)?;
        let patch = TemplatePatch::new(name, template_type, Utc::now())?;
        Ok(self.templates.update(id, &patch).await?)
    }

    pub fn delete(&self, template: &FormTemplate) -> AppResult<DeletePrompt> {
        self.session.require(Action::ManageFormTemplates)?;
        let repo = self.templates.clone();
        let id = template.id;
        Ok(DeletePrompt::new("Are you sure you want to delete this template?", async move {
            repo.delete(id).await?;
            Ok(())
        }))
    }
}
