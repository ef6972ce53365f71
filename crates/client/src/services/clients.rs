use std::sync::Arc;

use auditdesk_auth::Action;
use auditdesk_core::{Client, ClientForm, ClientId};
use auditdesk_infra::{DataStore, Repository};
use chrono::Utc;
use tracing::instrument;

use crate::confirm::DeletePrompt;
use crate::error::AppResult;
use crate::session::SessionManager;

#[derive(Clone)]
pub struct ClientService {
    clients: Repository<Client>,
    session: Arc<SessionManager>,
}

impl ClientService {
    pub fn new(store: Arc<dyn DataStore>, session: Arc<SessionManager>) -> Self {
        Self {
            clients: Repository::new(store),
            session,
        }
    }

    /// Newest first.
    pub async fn list(&self) -> AppResult<Vec<Client>> {
        self.session.require(Action::ViewClients)?;
        Ok(self.clients.list(self.clients.query().newest_first()).await?)
    }

    #[instrument(skip(self, form), err)]
    pub async fn create(&self, form: ClientForm) -> AppResult<Client> {
        let me = self.session.require(Action::ManageClients)?;
        let new = form.into_new(Some(me))?;
        let client = self.clients.insert(&new).await?;
        tracing::info!(client = %client.id, "client created");
        Ok(client)
    }

    #[instrument(skip(self, form), err)]
    pub async fn update(&self, id: ClientId, form: ClientForm) -> AppResult<Client> {
        self.session.require(Action::ManageClients)?;
        let patch = form.into_patch(Utc::now())?;
        Ok(self.clients.update(id, &patch).await?)
    }

    /// Tasks, audits and folders of the client are left in place.
    pub fn delete(&self, client: &Client) -> AppResult<DeletePrompt> {
        self.session.require(Action::ManageClients)?;
        let repo = self.clients.clone();
        let id = client.id;
        Ok(DeletePrompt::new("Are you sure you want to delete this client?", async move {
            repo.delete(id).await?;
            tracing::info!(client = %id, "client deleted");
            Ok(())
        }))
    }
}
